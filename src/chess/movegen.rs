//! Pseudo-legal move generation.
//!
//! Moves are produced square by square (a1..h8), direction by direction, so
//! enumeration order is a total order over a given position. Self-check is
//! not filtered here; the self-check guard slice rejects such moves after they
//! are played.

use crate::chess::attacks::{is_in_check, is_square_attacked};
use crate::chess::moves::{Move, MoveKind};
use crate::core::piece::{Flags, Side, Walk};
use crate::core::position::Position;
use crate::core::square::{Direction, Square, BISHOP_DIRS, KNIGHT_OFFSETS, QUEEN_DIRS, ROOK_DIRS};

/// Generate every pseudo-legal orthodox move of `side`.
///
/// `en_passant` is the square a pawn of the opponent just passed over, or
/// `Square::NONE`.
pub fn generate_moves(pos: &Position, side: Side, en_passant: Square) -> Vec<Move> {
    let mut out = Vec::with_capacity(48);
    for (from, walk, _, _) in pos.pieces_of(side) {
        match walk {
            Walk::King => {
                leaper_moves(pos, side, from, &QUEEN_DIRS, &mut out);
            }
            Walk::Knight => leaper_moves(pos, side, from, &KNIGHT_OFFSETS, &mut out),
            Walk::Rook => rider_moves(pos, side, from, &ROOK_DIRS, &mut out),
            Walk::Bishop => rider_moves(pos, side, from, &BISHOP_DIRS, &mut out),
            Walk::Queen => rider_moves(pos, side, from, &QUEEN_DIRS, &mut out),
            Walk::Pawn => pawn_moves(pos, side, from, en_passant, &mut out),
            Walk::Empty | Walk::Invalid => {}
        }
    }
    castling_moves(pos, side, &mut out);
    out
}

/// Moves of the single piece standing on `from` (used by intelligent mode).
pub fn generate_piece_moves(pos: &Position, from: Square) -> Vec<Move> {
    let side = if pos.belongs_to(from, Side::White) {
        Side::White
    } else {
        Side::Black
    };
    let mut out = Vec::new();
    match pos.walk(from) {
        Walk::King => leaper_moves(pos, side, from, &QUEEN_DIRS, &mut out),
        Walk::Knight => leaper_moves(pos, side, from, &KNIGHT_OFFSETS, &mut out),
        Walk::Rook => rider_moves(pos, side, from, &ROOK_DIRS, &mut out),
        Walk::Bishop => rider_moves(pos, side, from, &BISHOP_DIRS, &mut out),
        Walk::Queen => rider_moves(pos, side, from, &QUEEN_DIRS, &mut out),
        Walk::Pawn => pawn_moves(pos, side, from, Square::NONE, &mut out),
        Walk::Empty | Walk::Invalid => {}
    }
    out
}

/// Messigny exchanges: swap with an opponent piece of the same walk. Kings
/// never exchange.
pub fn generate_exchanges(pos: &Position, side: Side) -> Vec<Move> {
    let mut out = Vec::new();
    for (from, walk, _, _) in pos.pieces_of(side) {
        if walk == Walk::King {
            continue;
        }
        for (to, other, _, _) in pos.pieces_of(side.opponent()) {
            if other == walk {
                out.push(Move {
                    from,
                    to,
                    capture: Square::NONE,
                    kind: MoveKind::Exchange,
                });
            }
        }
    }
    out
}

#[inline]
fn can_capture(pos: &Position, side: Side, to: Square) -> bool {
    pos.belongs_to(to, side.opponent()) && !pos.flags(to).contains(Flags::ROYAL)
}

fn leaper_moves(pos: &Position, side: Side, from: Square, offsets: &[Direction], out: &mut Vec<Move>) {
    for &d in offsets {
        let to = from.offset(d);
        if pos.is_empty(to) {
            out.push(Move::quiet(from, to));
        } else if can_capture(pos, side, to) {
            out.push(Move::capturing(from, to));
        }
    }
}

fn rider_moves(pos: &Position, side: Side, from: Square, dirs: &[Direction], out: &mut Vec<Move>) {
    for &d in dirs {
        let mut to = from.offset(d);
        while pos.is_empty(to) {
            out.push(Move::quiet(from, to));
            to = to.offset(d);
        }
        if can_capture(pos, side, to) {
            out.push(Move::capturing(from, to));
        }
    }
}

fn push_pawn_move(side: Side, from: Square, to: Square, capture: Square, out: &mut Vec<Move>) {
    if side.relative_rank(to.rank()) == 7 {
        for walk in Walk::PROMOTEES {
            out.push(Move {
                from,
                to,
                capture,
                kind: MoveKind::Promotion(walk),
            });
        }
    } else {
        out.push(Move {
            from,
            to,
            capture,
            kind: MoveKind::Normal,
        });
    }
}

fn pawn_moves(pos: &Position, side: Side, from: Square, en_passant: Square, out: &mut Vec<Move>) {
    let fwd = side.forward();
    let one = from.offset(fwd);
    if pos.is_empty(one) {
        push_pawn_move(side, from, one, Square::NONE, out);
        let two = one.offset(fwd);
        if side.relative_rank(from.rank()) == 1 && pos.is_empty(two) {
            out.push(Move {
                from,
                to: two,
                capture: Square::NONE,
                kind: MoveKind::DoubleStep,
            });
        }
    }
    for s in [-1, 1] {
        let to = from.offset(fwd + s);
        if can_capture(pos, side, to) {
            push_pawn_move(side, from, to, to, out);
        } else if to == en_passant && !en_passant.is_none() && pos.is_empty(to) {
            let victim = to.offset(-fwd);
            if pos.belongs_to(victim, side.opponent()) && pos.walk(victim) == Walk::Pawn {
                out.push(Move {
                    from,
                    to,
                    capture: victim,
                    kind: MoveKind::EnPassant,
                });
            }
        }
    }
}

/// The four squares involved in castling towards one wing.
#[derive(Debug, Clone, Copy)]
pub struct CastlingSquares {
    pub king_from: Square,
    pub king_to: Square,
    pub rook_from: Square,
    pub rook_to: Square,
}

pub fn castling_squares(side: Side, king_side: bool) -> CastlingSquares {
    let rank = side.relative_rank(0);
    let sq = |file| Square::new(file, rank).unwrap_or(Square::NONE);
    if king_side {
        CastlingSquares {
            king_from: sq(4),
            king_to: sq(6),
            rook_from: sq(7),
            rook_to: sq(5),
        }
    } else {
        CastlingSquares {
            king_from: sq(4),
            king_to: sq(2),
            rook_from: sq(0),
            rook_to: sq(3),
        }
    }
}

fn castling_moves(pos: &Position, side: Side, out: &mut Vec<Move>) {
    for king_side in [true, false] {
        if !pos.castling().has(side, king_side) {
            continue;
        }
        let cs = castling_squares(side, king_side);
        if pos.walk(cs.king_from) != Walk::King
            || !pos.belongs_to(cs.king_from, side)
            || pos.walk(cs.rook_from) != Walk::Rook
            || !pos.belongs_to(cs.rook_from, side)
        {
            continue;
        }
        let dir: Direction = if king_side { 1 } else { -1 };
        let mut sq = cs.king_from.offset(dir);
        let mut clear = true;
        while sq != cs.rook_from {
            if !pos.is_empty(sq) {
                clear = false;
                break;
            }
            sq = sq.offset(dir);
        }
        if !clear
            || is_in_check(pos, side)
            || is_square_attacked(pos, cs.rook_to, side.opponent())
        {
            continue;
        }
        out.push(Move {
            from: cs.king_from,
            to: cs.king_to,
            capture: Square::NONE,
            kind: if king_side {
                MoveKind::CastleShort
            } else {
                MoveKind::CastleLong
            },
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        Square::parse(s).unwrap()
    }

    #[test]
    fn initial_array_has_twenty_moves() {
        let pos = Position::initial_game_array();
        assert_eq!(generate_moves(&pos, Side::White, Square::NONE).len(), 20);
        assert_eq!(generate_moves(&pos, Side::Black, Square::NONE).len(), 20);
    }

    #[test]
    fn promotion_yields_one_move_per_promotee() {
        let mut pos = Position::empty();
        pos.add_piece(sq("b7"), Walk::Pawn, Side::White, Flags::NONE);
        let moves = generate_moves(&pos, Side::White, Square::NONE);
        assert_eq!(moves.len(), 4);
        assert!(moves.iter().all(|m| matches!(m.kind, MoveKind::Promotion(_))));
    }

    #[test]
    fn en_passant_needs_the_passed_square() {
        let mut pos = Position::empty();
        pos.add_piece(sq("e5"), Walk::Pawn, Side::White, Flags::NONE);
        pos.add_piece(sq("d5"), Walk::Pawn, Side::Black, Flags::NONE);
        let without = generate_moves(&pos, Side::White, Square::NONE);
        assert!(without.iter().all(|m| m.kind != MoveKind::EnPassant));
        let with = generate_moves(&pos, Side::White, sq("d6"));
        let ep: Vec<_> = with.iter().filter(|m| m.kind == MoveKind::EnPassant).collect();
        assert_eq!(ep.len(), 1);
        assert_eq!(ep[0].capture, sq("d5"));
    }

    #[test]
    fn castling_respects_attacked_transit_square() {
        let mut pos = Position::empty();
        pos.add_piece(sq("e1"), Walk::King, Side::White, Flags::NONE);
        pos.add_piece(sq("h1"), Walk::Rook, Side::White, Flags::NONE);
        pos.add_piece(sq("a1"), Walk::Rook, Side::White, Flags::NONE);
        pos.grant_castling_from_placement();
        let moves = generate_moves(&pos, Side::White, Square::NONE);
        assert!(moves.iter().any(|m| m.kind == MoveKind::CastleShort));
        assert!(moves.iter().any(|m| m.kind == MoveKind::CastleLong));

        pos.add_piece(sq("f8"), Walk::Rook, Side::Black, Flags::NONE);
        let moves = generate_moves(&pos, Side::White, Square::NONE);
        assert!(!moves.iter().any(|m| m.kind == MoveKind::CastleShort));
        assert!(moves.iter().any(|m| m.kind == MoveKind::CastleLong));
    }

    #[test]
    fn kings_are_never_captured() {
        let mut pos = Position::empty();
        pos.add_piece(sq("a1"), Walk::Rook, Side::White, Flags::NONE);
        pos.add_piece(sq("a8"), Walk::King, Side::Black, Flags::NONE);
        let moves = generate_moves(&pos, Side::White, Square::NONE);
        assert!(moves.iter().all(|m| !m.is_capture()));
    }
}
