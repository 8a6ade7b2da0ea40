//! Lower bounds on the number of moves a piece needs between two squares.
//!
//! Every bound assumes an empty board, so it never exceeds the true
//! distance in any real position.

use std::sync::OnceLock;

use crate::core::piece::{CastlingRights, Side, Walk};
use crate::core::square::{Square, KNIGHT_OFFSETS};

/// "Cannot get there at all" (wrong square colour, pawn moving backwards).
pub const UNREACHABLE: u32 = 1_000;

fn cell(sq: Square) -> usize {
    (sq.rank() * 8 + sq.file()) as usize
}

/// Knight distances between every pair of board squares.
fn knight_table() -> &'static [[u8; 64]; 64] {
    static TABLE: OnceLock<Box<[[u8; 64]; 64]>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = Box::new([[u8::MAX; 64]; 64]);
        for start in Square::all() {
            let row = &mut table[cell(start)];
            row[cell(start)] = 0;
            let mut frontier = vec![start];
            let mut distance = 0;
            while !frontier.is_empty() {
                distance += 1;
                let mut next = Vec::new();
                for sq in frontier {
                    for &d in &KNIGHT_OFFSETS {
                        let to = sq.offset(d);
                        if to.is_on_board() && row[cell(to)] == u8::MAX {
                            row[cell(to)] = distance;
                            next.push(to);
                        }
                    }
                }
                frontier = next;
            }
        }
        table
    })
}

pub fn knight_distance(from: Square, to: Square) -> u32 {
    u32::from(knight_table()[cell(from)][cell(to)])
}

fn on_line(from: Square, to: Square, diagonal: bool) -> bool {
    let df = (from.file() - to.file()).abs();
    let dr = (from.rank() - to.rank()).abs();
    if diagonal {
        df == dr
    } else {
        df == 0 || dr == 0
    }
}

fn king_moves(side: Side, from: Square, to: Square, castling: CastlingRights) -> u32 {
    let mut best = from.king_distance(to);
    for king_side in [true, false] {
        if !castling.has(side, king_side) {
            continue;
        }
        if let Some([home, landing, ..]) = castling_squares(side, king_side) {
            if home == from {
                best = best.min(1 + landing.king_distance(to));
            }
        }
    }
    best
}

/// King start, king destination, rook start and rook destination of
/// `side`'s castling on the given wing.
pub fn castling_squares(side: Side, king_side: bool) -> Option<[Square; 4]> {
    let rank = side.relative_rank(0);
    let files = if king_side { [4, 6, 7, 5] } else { [4, 2, 0, 3] };
    Some([
        Square::new(files[0], rank)?,
        Square::new(files[1], rank)?,
        Square::new(files[2], rank)?,
        Square::new(files[3], rank)?,
    ])
}

/// Moves of a `side` pawn from `from` to `to` without promoting. Every file
/// change needs a capture, and a pawn never moves backwards.
pub fn pawn_moves(side: Side, from: Square, to: Square) -> u32 {
    let file_change = (from.file() - to.file()).abs();
    let forward = side.relative_rank(to.rank()) - side.relative_rank(from.rank());
    if forward < file_change || side.relative_rank(to.rank()) == 0 {
        return UNREACHABLE;
    }
    let mut moves = forward;
    if side.relative_rank(from.rank()) == 1 && forward > 1 && forward - 2 >= file_change {
        moves -= 1;
    }
    moves as u32
}

/// Captures a pawn needs to get from `from` to `to`.
pub fn pawn_captures(from: Square, to: Square) -> u32 {
    (from.file() - to.file()).unsigned_abs()
}

/// Lower bound for a `side` piece of walk `from_walk` on `from` to become
/// a `to_walk` on `to`. A pawn may get there by promoting.
///
/// `checks` is the square of the king the piece is meant to check in the
/// final position: a piece that is already in place must then still move,
/// unless its check can be discovered.
pub fn fro_to(
    side: Side,
    from_walk: Walk,
    from: Square,
    to_walk: Walk,
    to: Square,
    castling: CastlingRights,
    checks: Option<Square>,
) -> u32 {
    if from == to && from_walk == to_walk {
        return match (checks, from_walk) {
            (Some(_), Walk::Pawn) => UNREACHABLE,
            (Some(_), Walk::Knight) => 2,
            (Some(king), _) if king.king_distance(to) == 1 => 2,
            _ => 0,
        };
    }
    if from_walk == Walk::Pawn && to_walk != Walk::Pawn {
        return promotion_moves(side, from, to_walk, to);
    }
    if from_walk != to_walk {
        return UNREACHABLE;
    }
    match from_walk {
        Walk::Knight => knight_distance(from, to),
        Walk::Rook => {
            if on_line(from, to, false) {
                1
            } else {
                2
            }
        }
        Walk::Bishop => {
            if from.is_dark() != to.is_dark() {
                UNREACHABLE
            } else if on_line(from, to, true) {
                1
            } else {
                2
            }
        }
        Walk::Queen => {
            if on_line(from, to, false) || on_line(from, to, true) {
                1
            } else {
                2
            }
        }
        Walk::King => king_moves(side, from, to, castling),
        Walk::Pawn => pawn_moves(side, from, to),
        Walk::Empty | Walk::Invalid => UNREACHABLE,
    }
}

fn promotion_moves(side: Side, from: Square, to_walk: Walk, to: Square) -> u32 {
    if !Walk::PROMOTEES.contains(&to_walk) {
        return UNREACHABLE;
    }
    let last_rank = side.relative_rank(7);
    (0..8)
        .filter_map(|file| Square::new(file, last_rank))
        .map(|promotion| {
            let march = pawn_moves(side, from, promotion);
            let rest = fro_to(side, to_walk, promotion, to_walk, to, CastlingRights::NONE, None);
            march.saturating_add(rest)
        })
        .min()
        .unwrap_or(UNREACHABLE)
        .min(UNREACHABLE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    fn sq(s: &str) -> Square {
        Square::parse(s).unwrap()
    }

    fn none() -> CastlingRights {
        CastlingRights::NONE
    }

    /// Exact distance by breadth-first search over an empty board.
    fn bfs(walk: Walk, side: Side, from: Square, to: Square) -> u32 {
        use crate::chess::movegen::generate_piece_moves;
        use crate::core::piece::Flags;
        use crate::core::position::Position;

        let mut seen = std::collections::HashSet::new();
        let mut queue = VecDeque::from([(from, 0u32)]);
        seen.insert(from);
        while let Some((at, d)) = queue.pop_front() {
            if at == to {
                return d;
            }
            let mut pos = Position::empty();
            pos.add_piece(at, walk, side, Flags::NONE);
            for mv in generate_piece_moves(&pos, at) {
                if seen.insert(mv.to) {
                    queue.push_back((mv.to, d + 1));
                }
            }
        }
        UNREACHABLE
    }

    #[test]
    fn never_exceeds_the_breadth_first_distance() {
        let starts = ["a1", "d4", "g7", "b2", "h8"];
        for walk in [Walk::King, Walk::Queen, Walk::Rook, Walk::Bishop, Walk::Knight] {
            for from in starts {
                for to in Square::all() {
                    let exact = bfs(walk, Side::White, sq(from), to);
                    let bound = fro_to(Side::White, walk, sq(from), walk, to, none(), None);
                    assert!(bound <= exact, "{walk:?} {from}-{to}: {bound} > {exact}");
                }
            }
        }
        for from in ["e2", "c3", "h2"] {
            for to in Square::all() {
                let exact = bfs(Walk::Pawn, Side::White, sq(from), to);
                let bound = fro_to(Side::White, Walk::Pawn, sq(from), Walk::Pawn, to, none(), None);
                // pushes only; captures would shorten nothing
                if exact != UNREACHABLE {
                    assert!(bound <= exact, "P {from}-{to}: {bound} > {exact}");
                }
            }
        }
    }

    #[test]
    fn knight_corners() {
        assert_eq!(knight_distance(sq("a1"), sq("b3")), 1);
        assert_eq!(knight_distance(sq("a1"), sq("b2")), 4);
        assert_eq!(knight_distance(sq("a1"), sq("h8")), 6);
    }

    #[test]
    fn pawns_double_step_and_capture() {
        assert_eq!(pawn_moves(Side::White, sq("e2"), sq("e4")), 1);
        assert_eq!(pawn_moves(Side::White, sq("e2"), sq("e5")), 2);
        assert_eq!(pawn_moves(Side::White, sq("e2"), sq("f4")), 2);
        assert_eq!(pawn_moves(Side::White, sq("e3"), sq("e2")), UNREACHABLE);
        assert_eq!(pawn_moves(Side::Black, sq("b7"), sq("b5")), 1);
        assert_eq!(pawn_moves(Side::Black, sq("b7"), sq("d6")), UNREACHABLE);
    }

    #[test]
    fn promotions_and_castling() {
        // e7-e8=Q, then one queen move
        assert_eq!(
            fro_to(Side::White, Walk::Pawn, sq("e7"), Walk::Queen, sq("a4"), none(), None),
            2
        );
        assert_eq!(
            fro_to(Side::White, Walk::Pawn, sq("e7"), Walk::King, sq("e8"), none(), None),
            UNREACHABLE
        );
        let rights = none().granted(Side::White, true);
        assert_eq!(fro_to(Side::White, Walk::King, sq("e1"), Walk::King, sq("g1"), rights, None), 1);
        assert_eq!(fro_to(Side::White, Walk::King, sq("e1"), Walk::King, sq("g1"), none(), None), 2);
    }

    #[test]
    fn castling_squares_per_wing() {
        assert_eq!(
            castling_squares(Side::White, true),
            Some([sq("e1"), sq("g1"), sq("h1"), sq("f1")])
        );
        assert_eq!(
            castling_squares(Side::Black, false),
            Some([sq("e8"), sq("c8"), sq("a8"), sq("d8")])
        );
    }

    #[test]
    fn a_checker_in_place_still_has_to_move() {
        let king = Some(sq("e8"));
        assert_eq!(fro_to(Side::White, Walk::Rook, sq("e1"), Walk::Rook, sq("e1"), none(), king), 0);
        assert_eq!(fro_to(Side::White, Walk::Rook, sq("e7"), Walk::Rook, sq("e7"), none(), king), 2);
        assert_eq!(fro_to(Side::White, Walk::Knight, sq("f6"), Walk::Knight, sq("f6"), none(), king), 2);
        assert_eq!(
            fro_to(Side::White, Walk::Pawn, sq("d7"), Walk::Pawn, sq("d7"), none(), king),
            UNREACHABLE
        );
    }
}
