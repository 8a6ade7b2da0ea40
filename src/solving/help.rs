//! Help play: cooperative moves, shortest-length search, the goal fork at
//! the end of a help branch and set play.

use tracing::debug;

use crate::solving::length::{is_sentinel, is_solved, Length, SLACK_LENGTH};
use crate::solving::moves::play_alternatives;
use crate::solving::{Mode, SolveTable, Solver};
use crate::stipulation::slice::{SliceIndex, SliceType};

pub fn register(table: &mut SolveTable) {
    table.register(SliceType::HelpMove, help_move);
    table.register(SliceType::HelpFindShortest, help_find_shortest);
    table.register(SliceType::ForkOnRemaining, fork_on_remaining);
    table.register(SliceType::SetplayFork, setplay_fork);
}

/// Shortest result over the mover's moves. Solve mode visits every move;
/// test mode stops at the first solution.
fn help_move(s: &mut Solver, si: SliceIndex, n: Length) -> Length {
    let ply = s.current_ply();
    let exhaustive = s.mode == Mode::Solve;
    let mut result = n + 2;
    for index in 0..s.moves.len(ply) {
        let go_on = play_alternatives(s, si, index, n, |r| {
            if !is_sentinel(r) && is_solved(r, n) {
                result = result.min(r);
                return exhaustive;
            }
            true
        });
        if !go_on {
            break;
        }
    }
    result
}

fn help_find_shortest(s: &mut Solver, si: SliceIndex, n: Length) -> Length {
    let min_length = s.slices[si].min_length.max(SLACK_LENGTH);
    let mut n_try = min_length + (n.saturating_sub(min_length)) % 2;
    while n_try <= n {
        let r = s.solve_next(si, n_try);
        if is_solved(r, n_try) {
            debug!(half_moves = n_try - SLACK_LENGTH, "shortest help solution");
            return r;
        }
        if s.is_interrupted() {
            break;
        }
        n_try += 2;
    }
    n + 2
}

/// Enter the goal branch once at most `threshold` half-moves remain.
fn fork_on_remaining(s: &mut Solver, si: SliceIndex, n: Length) -> Length {
    if n.saturating_sub(SLACK_LENGTH) <= s.slices[si].threshold() {
        s.solve_fork(si, n)
    } else {
        s.solve_next(si, n)
    }
}

/// Solve the set play (the other side moving first, one half-move shorter)
/// before the actual play. The set play's outcome does not count.
fn setplay_fork(s: &mut Solver, si: SliceIndex, n: Length) -> Length {
    if n > SLACK_LENGTH + 1 {
        s.in_set_play = true;
        s.solve_fork(si, n - 1);
        s.in_set_play = false;
    }
    s.solve_next(si, n)
}
