//! Circe family: rebirth of captured (or capturing) pieces.

use crate::core::piece::{Flags, Side, Walk};
use crate::core::position::Position;
use crate::core::square::Square;
use crate::journal::Reason;
use crate::solving::length::{Length, THIS_MOVE_IS_ILLEGAL};
use crate::solving::{SolveTable, Solver};
use crate::stipulation::slice::{SliceIndex, SliceType};

pub fn register(table: &mut SolveTable) {
    table.register(SliceType::CirceRebirth, circe_rebirth);
    table.register(SliceType::AnticirceRebirth, anticirce_rebirth);
    table.register(SliceType::SupercirceRebirth, supercirce_rebirth);
}

/// Orthodox Circe rebirth square of a `side` piece of `walk` captured on
/// `captured_on`.
///
/// Pawns return to their start square on the same file; rooks, bishops and
/// knights to the start square of the capture square's colour; queen and
/// king to d1/e1 (d8/e8).
pub fn rebirth_square(walk: Walk, side: Side, captured_on: Square) -> Square {
    let files: &[i32] = match walk {
        Walk::Pawn => {
            return Square::new(captured_on.file(), side.relative_rank(1)).unwrap_or(Square::NONE)
        }
        Walk::Rook => &[0, 7],
        Walk::Knight => &[1, 6],
        Walk::Bishop => &[2, 5],
        Walk::Queen => &[3],
        Walk::King => &[4],
        Walk::Empty | Walk::Invalid => return Square::NONE,
    };
    let rank = side.relative_rank(0);
    let dark = captured_on.is_dark();
    let candidates = files.iter().filter_map(|&file| Square::new(file, rank));
    let mut fallback = Square::NONE;
    for sq in candidates {
        if sq.is_dark() == dark {
            return sq;
        }
        fallback = sq;
    }
    fallback
}

fn side_of(flags: Flags) -> Side {
    if flags.belongs_to(Side::White) {
        Side::White
    } else {
        Side::Black
    }
}

/// The captured piece goes back to its rebirth square if that is empty.
fn circe_rebirth(s: &mut Solver, si: SliceIndex, n: Length) -> Length {
    let ply = s.current_ply();
    if let Some((on, walk, flags, id)) = s.journal.captured_piece(ply) {
        if flags.contains(Flags::ROYAL) {
            return s.solve_next(si, n);
        }
        let target = rebirth_square(walk, side_of(flags), on);
        if !target.is_none() && s.position.is_empty(target) {
            s.journal
                .do_piece_readdition(&mut s.position, Reason::CirceRebirth, target, walk, flags, id);
        }
    }
    s.solve_next(si, n)
}

/// The capturer goes to its own rebirth square; the capture is illegal if
/// that square is occupied by another piece.
fn anticirce_rebirth(s: &mut Solver, si: SliceIndex, n: Length) -> Length {
    let ply = s.current_ply();
    if let Some((captured_on, _, _, _)) = s.journal.captured_piece(ply) {
        let now_on = s.journal.moving_piece_square(ply);
        if !now_on.is_none() {
            let walk = s.position.walk(now_on);
            let side = side_of(s.position.flags(now_on));
            let target = rebirth_square(walk, side, captured_on);
            if target != now_on {
                if target.is_none() || !s.position.is_empty(target) {
                    return THIS_MOVE_IS_ILLEGAL;
                }
                s.journal
                    .do_piece_movement(&mut s.position, Reason::AnticirceRebirth, now_on, target);
            }
        }
    }
    s.solve_next(si, n)
}

/// Squares a Supercirce rebirth may choose for a `walk` piece.
fn supercirce_squares(pos: &Position, walk: Walk) -> Vec<Square> {
    Square::all()
        .filter(|&sq| pos.is_empty(sq))
        .filter(|&sq| walk != Walk::Pawn || (1..=6).contains(&sq.rank()))
        .collect()
}

/// The captured piece is reborn on any empty square, or not at all. Each
/// choice is a separate alternative of the move.
fn supercirce_rebirth(s: &mut Solver, si: SliceIndex, n: Length) -> Length {
    let ply = s.current_ply();
    if let Some((_, walk, flags, id)) = s.journal.captured_piece(ply) {
        let squares = supercirce_squares(&s.position, walk);
        let choice = s.post_move.participate(ply, si, squares.len() + 1);
        if let Some(&target) = choice.checked_sub(1).and_then(|i| squares.get(i)) {
            s.journal.do_piece_readdition(
                &mut s.position,
                Reason::SupercirceRebirth,
                target,
                walk,
                flags,
                id,
            );
        }
    }
    s.solve_next(si, n)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        Square::parse(s).unwrap()
    }

    #[test]
    fn rebirth_squares_follow_the_capture_square_colour() {
        assert_eq!(rebirth_square(Walk::Pawn, Side::White, sq("e5")), sq("e2"));
        assert_eq!(rebirth_square(Walk::Pawn, Side::Black, sq("c3")), sq("c7"));
        // d4 is dark, a1 is dark
        assert_eq!(rebirth_square(Walk::Rook, Side::White, sq("d4")), sq("a1"));
        assert_eq!(rebirth_square(Walk::Rook, Side::White, sq("d5")), sq("h1"));
        assert_eq!(rebirth_square(Walk::Knight, Side::Black, sq("a1")), sq("b8"));
        assert_eq!(rebirth_square(Walk::Bishop, Side::Black, sq("a1")), sq("f8"));
        assert_eq!(rebirth_square(Walk::Queen, Side::Black, sq("h1")), sq("d8"));
        assert_eq!(rebirth_square(Walk::King, Side::White, sq("h8")), sq("e1"));
    }
}
