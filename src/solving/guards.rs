//! Option guards: solution count, wall-clock time, restart position.

use tracing::debug;

use crate::solving::length::Length;
use crate::solving::{Interruption, SolveTable, Solver, ROOT_PLY};
use crate::stipulation::slice::{SliceIndex, SliceType};

pub fn register(table: &mut SolveTable) {
    table.register(SliceType::MaxSolutionsGuard, max_solutions_guard);
    table.register(SliceType::MaxTimeGuard, max_time_guard);
    table.register(SliceType::RestartGuard, restart_guard);
}

fn max_solutions_reached(s: &Solver) -> bool {
    s.options
        .max_solutions
        .is_some_and(|max| s.solutions.len() >= max)
}

fn max_solutions_guard(s: &mut Solver, si: SliceIndex, n: Length) -> Length {
    if max_solutions_reached(s) {
        s.interrupt(Interruption::MaxSolutions);
        return n + 2;
    }
    let r = s.solve_next(si, n);
    if max_solutions_reached(s) {
        s.interrupt(Interruption::MaxSolutions);
    }
    r
}

fn max_time_guard(s: &mut Solver, si: SliceIndex, n: Length) -> Length {
    if s.poll_time() {
        n + 2
    } else {
        s.solve_next(si, n)
    }
}

/// Skip the first moves of the root ply (1-based restart number).
fn restart_guard(s: &mut Solver, si: SliceIndex, n: Length) -> Length {
    if s.current_ply() == ROOT_PLY {
        if let Some(restart) = s.options.restart {
            let index = s.moves.current_index(ROOT_PLY);
            if index + 1 < restart {
                debug!(move_number = index + 1, "skipped before restart");
                return n + 2;
            }
        }
    }
    s.solve_next(si, n)
}
