//! Move generators, the shared move loop and the self-check guard.

use crate::chess::attacks::is_in_check;
use crate::chess::execution::en_passant_square;
use crate::chess::movegen::generate_moves;
use crate::solving::guard::PlyGuard;
use crate::solving::length::{after_move, Length, PREVIOUS_MOVE_IS_ILLEGAL};
use crate::solving::{SolveTable, Solver};
use crate::stipulation::slice::{SliceIndex, SliceType};

pub fn register(table: &mut SolveTable) {
    table.register(SliceType::AttackMoveGenerator, move_generator);
    table.register(SliceType::DefenseMoveGenerator, move_generator);
    table.register(SliceType::HelpMoveGenerator, move_generator);
    table.register(SliceType::SelfCheckGuard, self_check_guard);
}

/// Open a ply for the slice's starter and fill it with that side's moves.
fn move_generator(s: &mut Solver, si: SliceIndex, n: Length) -> Length {
    let side = s.starter(si);
    let ply = s.nextply(side);
    let ep = en_passant_square(&s.journal, ply - 1);
    let moves = generate_moves(&s.position, side, ep);
    s.moves.set(ply, moves);
    let r = s.solve_next(si, n);
    s.finply();
    r
}

/// Reject a move that leaves the mover's king in check.
fn self_check_guard(s: &mut Solver, si: SliceIndex, n: Length) -> Length {
    let mover = s.side_at(s.current_ply());
    if is_in_check(&s.position, mover) {
        PREVIOUS_MOVE_IS_ILLEGAL
    } else {
        s.solve_next(si, n)
    }
}

/// Play move `index` of the current ply and solve `si`'s successor with
/// `n - 1`, once per post-move alternative.
///
/// `visit` receives each result (already counted as one half-move more) and
/// returns whether to go on. Returns `false` if iteration was cut short.
pub fn play_alternatives(
    s: &mut Solver,
    si: SliceIndex,
    index: usize,
    n: Length,
    mut visit: impl FnMut(Length) -> bool,
) -> bool {
    let ply = s.current_ply();
    s.moves.set_current(ply, index);
    let mv = s.moves.get(ply, index);
    let next = s.slices[si].next;
    s.post_move.begin(ply);
    loop {
        let r = {
            let Some(mut guard) = PlyGuard::play(s, mv) else {
                return false;
            };
            after_move(guard.solve(next, n.saturating_sub(1)))
        };
        if !visit(r) || s.is_interrupted() {
            return false;
        }
        if !s.post_move.advance(ply) {
            return true;
        }
    }
}
