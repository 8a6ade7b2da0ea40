//! Battle play: attack and defense moves, shortest-solution search, dead ends
//! and the end-of-branch goal fork.

use crate::solving::length::{
    is_sentinel, is_solved, Length, IMMOBILITY_ON_NEXT_MOVE, SLACK_LENGTH, THIS_MOVE_IS_ILLEGAL,
};
use crate::solving::moves::play_alternatives;
use crate::solving::{Mode, SolveTable, Solver, ROOT_PLY};
use crate::stipulation::slice::{SliceIndex, SliceType};

pub fn register(table: &mut SolveTable) {
    table.register(SliceType::AttackMove, attack_move);
    table.register(SliceType::DefenseMove, defense_move);
    table.register(SliceType::AttackFindShortest, attack_find_shortest);
    table.register(SliceType::MinLengthOptimiser, min_length_optimiser);
    table.register(SliceType::DeadEnd, dead_end);
    table.register(SliceType::EndOfBranchGoal, end_of_branch_goal);
    table.register(SliceType::EndOfBranchForced, end_of_branch_goal);
}

/// Best (shortest) result over the attacker's moves.
///
/// Only the key level in solve mode, and threat collection, look at every
/// move; elsewhere the first success is enough.
fn attack_move(s: &mut Solver, si: SliceIndex, n: Length) -> Length {
    let ply = s.current_ply();
    let exhaustive =
        (s.mode == Mode::Solve && ply == ROOT_PLY) || s.threats.is_collecting(ply - 1);
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

/// Worst (longest) result over the defender's legal moves; stops at the
/// first refutation.
fn defense_move(s: &mut Solver, si: SliceIndex, n: Length) -> Length {
    let ply = s.current_ply();
    let mut result = IMMOBILITY_ON_NEXT_MOVE;
    for index in 0..s.moves.len(ply) {
        let go_on = play_alternatives(s, si, index, n, |r| {
            if r <= THIS_MOVE_IS_ILLEGAL {
                return true;
            }
            result = result.max(r);
            r <= n
        });
        if !go_on {
            break;
        }
    }
    result
}

/// Try `n_min, n_min + 2, ..., n` and return the first success.
fn attack_find_shortest(s: &mut Solver, si: SliceIndex, n: Length) -> Length {
    let floor = s.max_unsolvable.max(SLACK_LENGTH) + 1;
    if floor > n {
        return n + 2;
    }
    let saved = std::mem::replace(&mut s.max_unsolvable, SLACK_LENGTH);
    let mut result = n + 2;
    let mut n_try = floor + (n - floor) % 2;
    while n_try <= n {
        let r = s.solve_next(si, n_try);
        if is_solved(r, n_try) {
            result = r;
            break;
        }
        if s.is_interrupted() {
            break;
        }
        n_try += 2;
    }
    s.max_unsolvable = saved;
    result
}

/// Forbid the attacker to reach the goal before the branch's minimum length.
fn min_length_optimiser(s: &mut Solver, si: SliceIndex, n: Length) -> Length {
    let (length, min_length) = (s.slices[si].length, s.slices[si].min_length);
    let floor = (min_length + n).saturating_sub(length);
    let saved = s.max_unsolvable;
    if floor > SLACK_LENGTH + 1 {
        s.max_unsolvable = s.max_unsolvable.max(floor - 1);
    }
    let r = s.solve_next(si, n);
    s.max_unsolvable = saved;
    r
}

fn dead_end(s: &mut Solver, si: SliceIndex, n: Length) -> Length {
    if n <= SLACK_LENGTH {
        n + 2
    } else {
        s.solve_next(si, n)
    }
}

/// After an attacker's move (self play: after a defender's move): done if
/// the goal is reached, otherwise play on.
fn end_of_branch_goal(s: &mut Solver, si: SliceIndex, n: Length) -> Length {
    let r = s.solve_fork(si, SLACK_LENGTH);
    if is_solved(r, SLACK_LENGTH) {
        SLACK_LENGTH
    } else {
        s.solve_next(si, n)
    }
}
