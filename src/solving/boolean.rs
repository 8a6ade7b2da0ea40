//! Boolean slices: goal expression operators and the quodlibet/reciprocal
//! combinations of whole stipulations.

use crate::solving::length::{is_sentinel, is_solved, Length};
use crate::solving::{Mode, SolveTable, Solver};
use crate::stipulation::builder::entry_length;
use crate::stipulation::slice::{SliceIndex, SliceType};

pub fn register(table: &mut SolveTable) {
    table.register(SliceType::And, and);
    table.register(SliceType::Or, or);
    table.register(SliceType::Not, not);
    table.register(SliceType::Quodlibet, quodlibet);
    table.register(SliceType::Reciprocal, reciprocal);
}

fn and(s: &mut Solver, si: SliceIndex, n: Length) -> Length {
    let (op1, op2) = (s.slices[si].op1(), s.slices[si].op2());
    let r1 = s.solve(op1, n);
    if !is_solved(r1, n) {
        return r1;
    }
    let r2 = s.solve(op2, n);
    r1.max(r2)
}

fn or(s: &mut Solver, si: SliceIndex, n: Length) -> Length {
    let (op1, op2) = (s.slices[si].op1(), s.slices[si].op2());
    let r1 = s.solve(op1, n);
    if is_solved(r1, n) {
        return r1;
    }
    let r2 = s.solve(op2, n);
    r1.min(r2)
}

fn not(s: &mut Solver, si: SliceIndex, n: Length) -> Length {
    let r = s.solve_next(si, n);
    if is_sentinel(r) {
        r
    } else if is_solved(r, n) {
        n + 2
    } else {
        n
    }
}

/// Either stipulation; each operand is solved at its own length.
fn quodlibet(s: &mut Solver, si: SliceIndex, n: Length) -> Length {
    let (op1, op2) = (s.slices[si].op1(), s.slices[si].op2());
    let mut result = n + 2;
    for op in [op1, op2] {
        let m = entry_length(&s.slices, op);
        let r = s.solve(op, m);
        if is_solved(r, m) {
            result = result.min(r);
            if s.mode == Mode::Test {
                break;
            }
        }
        if s.is_interrupted() {
            break;
        }
    }
    result
}

/// Both stipulations. The second is tested first so that nothing of the
/// first gets written for a position that fails the second.
fn reciprocal(s: &mut Solver, si: SliceIndex, n: Length) -> Length {
    let (op1, op2) = (s.slices[si].op1(), s.slices[si].op2());
    let (m1, m2) = (entry_length(&s.slices, op1), entry_length(&s.slices, op2));
    let second = s.with_mode(Mode::Test, |s| s.solve(op2, m2));
    if !is_solved(second, m2) {
        return n + 2;
    }
    let r1 = s.solve(op1, m1);
    if !is_solved(r1, m1) {
        return n + 2;
    }
    let r2 = s.solve(op2, m2);
    if !is_solved(r2, m2) {
        return n + 2;
    }
    r1.max(r2)
}
