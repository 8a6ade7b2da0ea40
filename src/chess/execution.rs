//! Materialising generated moves as journal effects.

use crate::chess::movegen::castling_squares;
use crate::chess::moves::{Move, MoveKind};
use crate::core::piece::{CastlingRights, Side, Walk};
use crate::core::position::Position;
use crate::core::square::Square;
use crate::journal::{Effect, Journal, Ply, Reason};

/// Play `mv` into the current ply of `journal`.
///
/// The capture slot and the movement slot are always filled, in that order;
/// promotion, the castling rook and castling-rights changes follow.
pub fn play_move(journal: &mut Journal, pos: &mut Position, mv: Move) {
    match mv.kind {
        MoveKind::EnPassant => {
            journal.do_piece_removal(pos, Reason::EnPassant, mv.capture);
        }
        _ if mv.is_capture() => {
            journal.do_piece_removal(pos, Reason::Capture, mv.capture);
        }
        _ => {
            journal.do_no_piece_removal();
        }
    }

    match mv.kind {
        MoveKind::Exchange => {
            journal.do_piece_exchange(pos, Reason::Messigny, mv.from, mv.to);
        }
        MoveKind::CastleShort | MoveKind::CastleLong => {
            let side = side_of(pos, mv.from);
            let cs = castling_squares(side, mv.kind == MoveKind::CastleShort);
            journal.do_piece_movement(pos, Reason::Castling, cs.king_from, cs.king_to);
            journal.do_piece_movement(pos, Reason::Castling, cs.rook_from, cs.rook_to);
        }
        _ => {
            journal.do_piece_movement(pos, Reason::Moving, mv.from, mv.to);
        }
    }

    if let MoveKind::Promotion(walk) = mv.kind {
        journal.do_walk_change(pos, Reason::Promotion, mv.to, walk);
    }

    let rights = pos.castling();
    if rights != CastlingRights::NONE {
        let updated = revoke_touched(rights, &[mv.from, mv.to, mv.capture]);
        if updated != rights {
            journal.do_castling_rights_change(pos, Reason::CastlingRights, updated);
        }
    }
}

fn side_of(pos: &Position, sq: Square) -> Side {
    if pos.belongs_to(sq, Side::White) {
        Side::White
    } else {
        Side::Black
    }
}

/// Revoke every right whose king or rook home square was touched.
fn revoke_touched(mut rights: CastlingRights, touched: &[Square]) -> CastlingRights {
    for side in Side::BOTH {
        for king_side in [true, false] {
            let cs = castling_squares(side, king_side);
            if touched
                .iter()
                .any(|&sq| !sq.is_none() && (sq == cs.king_from || sq == cs.rook_from))
            {
                rights = rights.revoked(side, king_side);
            }
        }
    }
    rights
}

/// Square passed over by a pawn double step played in `ply`, or `Square::NONE`.
pub fn en_passant_square(journal: &Journal, ply: Ply) -> Square {
    if ply == 0 || ply > journal.current_ply() {
        return Square::NONE;
    }
    match journal.movement(ply).map(|e| e.effect) {
        Some(Effect::Movement {
            walk: Walk::Pawn,
            from,
            to,
            ..
        }) if (to.index() as i32 - from.index() as i32).abs() == 20 => {
            Square::from_index(((from.index() + to.index()) / 2) as u8)
        }
        _ => Square::NONE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chess::movegen::generate_moves;

    fn sq(s: &str) -> Square {
        Square::parse(s).unwrap()
    }

    #[test]
    fn every_initial_move_is_reversible() {
        let start = Position::initial_game_array();
        let mut pos = start.clone();
        let mut j = Journal::new();
        for mv in generate_moves(&start, Side::White, Square::NONE) {
            j.open_ply();
            play_move(&mut j, &mut pos, mv);
            j.undo_ply(&mut pos);
            j.close_ply();
            assert_eq!(pos, start, "{mv}");
        }
    }

    #[test]
    fn castling_moves_both_pieces_and_revokes_rights() {
        let mut pos = Position::empty();
        pos.add_piece(sq("e1"), Walk::King, Side::White, Default::default());
        pos.add_piece(sq("h1"), Walk::Rook, Side::White, Default::default());
        pos.grant_castling_from_placement();
        let start = pos.clone();
        let mv = generate_moves(&pos, Side::White, Square::NONE)
            .into_iter()
            .find(|m| m.kind == MoveKind::CastleShort)
            .unwrap();
        let mut j = Journal::new();
        j.open_ply();
        play_move(&mut j, &mut pos, mv);
        assert_eq!(pos.walk(sq("g1")), Walk::King);
        assert_eq!(pos.walk(sq("f1")), Walk::Rook);
        assert_eq!(pos.king_square(Side::White), sq("g1"));
        assert!(!pos.castling().has(Side::White, true));
        j.undo_ply(&mut pos);
        j.close_ply();
        assert_eq!(pos, start);
    }

    #[test]
    fn double_step_exposes_en_passant_square() {
        let mut pos = Position::initial_game_array();
        let mut j = Journal::new();
        j.open_ply();
        play_move(
            &mut j,
            &mut pos,
            Move {
                from: sq("e2"),
                to: sq("e4"),
                capture: Square::NONE,
                kind: MoveKind::DoubleStep,
            },
        );
        assert_eq!(en_passant_square(&j, 1), sq("e3"));
        j.undo_ply(&mut pos);
        j.close_ply();
    }
}
