//! Attack detection on the mailbox board.
//!
//! All queries tolerate a missing king: `is_in_check` for a side without a
//! royal piece is simply `false`.

use crate::core::piece::{Side, Walk};
use crate::core::position::Position;
use crate::core::square::{Direction, Square, BISHOP_DIRS, KNIGHT_OFFSETS, QUEEN_DIRS, ROOK_DIRS};

/// Does any piece of `by` attack `target`?
pub fn is_square_attacked(pos: &Position, target: Square, by: Side) -> bool {
    for &dir in &QUEEN_DIRS {
        let sq = target.offset(dir);
        if pos.belongs_to(sq, by) && pos.walk(sq) == Walk::King {
            return true;
        }
    }
    for &dir in &KNIGHT_OFFSETS {
        let sq = target.offset(dir);
        if pos.belongs_to(sq, by) && pos.walk(sq) == Walk::Knight {
            return true;
        }
    }
    for &side_step in &[1, -1] {
        let sq = target.offset(side_step - by.forward());
        if pos.belongs_to(sq, by) && pos.walk(sq) == Walk::Pawn {
            return true;
        }
    }
    rider_hits(pos, target, by, &ROOK_DIRS, Walk::Rook)
        || rider_hits(pos, target, by, &BISHOP_DIRS, Walk::Bishop)
}

fn rider_hits(pos: &Position, target: Square, by: Side, dirs: &[Direction], walk: Walk) -> bool {
    dirs.iter().any(|&dir| {
        let sq = pos.find_end_of_line(target, dir);
        pos.belongs_to(sq, by) && (pos.walk(sq) == walk || pos.walk(sq) == Walk::Queen)
    })
}

/// Is `side`'s royal piece attacked?
#[inline]
pub fn is_in_check(pos: &Position, side: Side) -> bool {
    let king = pos.king_square(side);
    !king.is_none() && is_square_attacked(pos, king, side.opponent())
}

/// Would the piece standing on `from` attack `target` (given the current blockers)?
pub fn piece_attacks(pos: &Position, from: Square, target: Square) -> bool {
    let side = if pos.belongs_to(from, Side::White) {
        Side::White
    } else {
        Side::Black
    };
    walk_attacks(pos, pos.walk(from), side, from, target)
}

/// Would a `side` piece of `walk` on `from` attack `target`? The square
/// `from` itself need not be occupied.
pub fn walk_attacks(pos: &Position, walk: Walk, side: Side, from: Square, target: Square) -> bool {
    if from == target {
        return false;
    }
    match walk {
        Walk::King => from.king_distance(target) == 1,
        Walk::Knight => KNIGHT_OFFSETS.iter().any(|&d| from.offset(d) == target),
        Walk::Pawn => [1, -1]
            .iter()
            .any(|&s| from.offset(side.forward() + s) == target),
        Walk::Rook | Walk::Bishop | Walk::Queen => {
            let Some(dir) = from.line_direction(target) else {
                return false;
            };
            let orthogonal = ROOK_DIRS.contains(&dir);
            let fits = match walk {
                Walk::Rook => orthogonal,
                Walk::Bishop => !orthogonal,
                _ => true,
            };
            fits && is_clear_between(pos, from, target, dir)
        }
        Walk::Empty | Walk::Invalid => false,
    }
}

/// Are all squares strictly between `from` and `to` (along `dir`) empty?
pub fn is_clear_between(pos: &Position, from: Square, to: Square, dir: Direction) -> bool {
    let mut sq = from.offset(dir);
    while sq != to {
        if !pos.is_empty(sq) {
            return false;
        }
        sq = sq.offset(dir);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::piece::Flags;

    fn sq(s: &str) -> Square {
        Square::parse(s).unwrap()
    }

    #[test]
    fn pawn_attacks_point_forward() {
        let mut pos = Position::empty();
        pos.add_piece(sq("e4"), Walk::Pawn, Side::White, Flags::NONE);
        pos.add_piece(sq("e5"), Walk::Pawn, Side::Black, Flags::NONE);
        assert!(is_square_attacked(&pos, sq("d5"), Side::White));
        assert!(is_square_attacked(&pos, sq("f5"), Side::White));
        assert!(!is_square_attacked(&pos, sq("d3"), Side::White));
        assert!(is_square_attacked(&pos, sq("d4"), Side::Black));
        assert!(!is_square_attacked(&pos, sq("d6"), Side::Black));
    }

    #[test]
    fn riders_are_blocked() {
        let mut pos = Position::empty();
        pos.add_piece(sq("a1"), Walk::Rook, Side::White, Flags::NONE);
        pos.add_piece(sq("a4"), Walk::Knight, Side::Black, Flags::NONE);
        assert!(is_square_attacked(&pos, sq("a4"), Side::White));
        assert!(!is_square_attacked(&pos, sq("a5"), Side::White));
        assert!(piece_attacks(&pos, sq("a1"), sq("h1")));
        assert!(!piece_attacks(&pos, sq("a1"), sq("a8")));
        assert!(!piece_attacks(&pos, sq("a1"), sq("b2")));
    }

    #[test]
    fn check_without_king_is_false() {
        let mut pos = Position::empty();
        pos.add_piece(sq("d1"), Walk::Queen, Side::White, Flags::NONE);
        assert!(!is_in_check(&pos, Side::Black));
        pos.add_piece(sq("d8"), Walk::King, Side::Black, Flags::NONE);
        assert!(is_in_check(&pos, Side::Black));
    }
}
