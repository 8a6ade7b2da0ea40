//! Reflex constraints: a side that can reach the goal in one move must do so.
//!
//! Each filter forks into a one-move branch for the side to move. For the
//! attacker an available goal move ends the line as a failure; for the
//! defender it ends the line as a success, and on the defender's last move
//! it is the only way to succeed.

use tracing::trace;

use crate::solving::length::{is_solved, Length, SLACK_LENGTH};
use crate::solving::{Mode, SolveTable, Solver};
use crate::stipulation::slice::{SliceIndex, SliceType};

pub fn register(table: &mut SolveTable) {
    table.register(SliceType::ReflexAttackerFilter, reflex_attacker_filter);
    table.register(SliceType::ReflexDefenderFilter, reflex_defender_filter);
}

/// Can the side to move at `si` reach the goal with its next move?
fn goal_in_one(s: &mut Solver, si: SliceIndex) -> bool {
    let n = SLACK_LENGTH + 1;
    let r = s.with_mode(Mode::Test, |s| s.solve_fork(si, n));
    is_solved(r, n)
}

fn reflex_attacker_filter(s: &mut Solver, si: SliceIndex, n: Length) -> Length {
    if n > SLACK_LENGTH && goal_in_one(s, si) {
        trace!(si, "attacker must reach the goal");
        return n + 2;
    }
    s.solve_next(si, n)
}

fn reflex_defender_filter(s: &mut Solver, si: SliceIndex, n: Length) -> Length {
    if n <= SLACK_LENGTH {
        return s.solve_next(si, n);
    }
    if goal_in_one(s, si) {
        trace!(si, "defender must reach the goal");
        SLACK_LENGTH + 1
    } else if n == SLACK_LENGTH + 1 {
        n + 2
    } else {
        s.solve_next(si, n)
    }
}
