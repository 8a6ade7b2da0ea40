//! Orthodox legality helpers outside the slice machinery.
//!
//! The solver proper tests legality through its self-check guard slices so
//! that conditions take part. These helpers serve callers that need plain
//! orthodox answers on a scratch position (problem validation, intelligent
//! mode construction).

use crate::chess::attacks::is_in_check;
use crate::chess::execution::play_move;
use crate::chess::movegen::generate_moves;
use crate::chess::moves::Move;
use crate::core::piece::Side;
use crate::core::position::Position;
use crate::core::square::Square;
use crate::journal::Journal;

/// Legal orthodox moves of `side`, in generation order.
pub fn legal_moves(pos: &Position, side: Side, en_passant: Square) -> Vec<Move> {
    let mut scratch = pos.clone();
    let mut journal = Journal::new();
    generate_moves(pos, side, en_passant)
        .into_iter()
        .filter(|&mv| {
            journal.open_ply();
            play_move(&mut journal, &mut scratch, mv);
            let legal = !is_in_check(&scratch, side);
            journal.undo_ply(&mut scratch);
            journal.close_ply();
            legal
        })
        .collect()
}

/// The first legal move of `side`, if any.
pub fn first_legal_move(pos: &Position, side: Side) -> Option<Move> {
    let mut scratch = pos.clone();
    let mut journal = Journal::new();
    generate_moves(pos, side, Square::NONE).into_iter().find(|&mv| {
        journal.open_ply();
        play_move(&mut journal, &mut scratch, mv);
        let legal = !is_in_check(&scratch, side);
        journal.undo_ply(&mut scratch);
        journal.close_ply();
        legal
    })
}

#[inline]
pub fn is_mate(pos: &Position, side: Side) -> bool {
    is_in_check(pos, side) && first_legal_move(pos, side).is_none()
}

#[inline]
pub fn is_stalemate(pos: &Position, side: Side) -> bool {
    !is_in_check(pos, side) && first_legal_move(pos, side).is_none()
}
