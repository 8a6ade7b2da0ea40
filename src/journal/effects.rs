//! Journal entry payloads and their undo/redo doers.
//!
//! Each doer is a pure function of the entry and the *current* position. The
//! asserts are consistency checks: a mismatch means the LIFO discipline was
//! broken somewhere upstream.

use serde::{Deserialize, Serialize};

use crate::core::piece::{CastlingRights, Flags, PieceId, Walk};
use crate::core::position::Position;
use crate::core::square::Square;

/// The rule that caused an effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    NoCapture,
    Moving,
    Capture,
    EnPassant,
    Promotion,
    Castling,
    CastlingRights,
    CirceRebirth,
    AnticirceRebirth,
    SupercirceRebirth,
    Chameleon,
    ChameleonPromotion,
    Andernach,
    HaanHole,
    Messigny,
}

/// One atomic position change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Placeholder filling the capture slot of a non-capturing move.
    Nothing,
    Movement {
        walk: Walk,
        flags: Flags,
        id: PieceId,
        from: Square,
        to: Square,
    },
    Removal {
        on: Square,
        walk: Walk,
        flags: Flags,
        id: PieceId,
    },
    Addition {
        on: Square,
        walk: Walk,
        flags: Flags,
        id: PieceId,
    },
    Exchange {
        from: Square,
        to: Square,
    },
    WalkChange {
        on: Square,
        from: Walk,
        to: Walk,
    },
    FlagsChange {
        on: Square,
        from: Flags,
        to: Flags,
    },
    SideChange {
        on: Square,
        from: Flags,
        to: Flags,
    },
    SquareBlock {
        on: Square,
    },
    CastlingRightsChange {
        from: CastlingRights,
        to: CastlingRights,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    pub effect: Effect,
    pub reason: Reason,
}

impl Effect {
    /// Apply the effect to a position in its "before" state.
    pub(crate) fn redo(&self, pos: &mut Position) {
        match *self {
            Effect::Nothing => {}
            Effect::Movement {
                walk,
                flags,
                id,
                from,
                to,
            } => {
                if from == to {
                    return;
                }
                assert_eq!(pos.walk(from), walk, "movement redo: walk on {from}");
                assert_eq!(pos.flags(from), flags, "movement redo: flags on {from}");
                assert!(pos.is_empty(to), "movement redo: {to} not empty");
                pos.empty_square(from);
                pos.occupy_square(to, walk, flags, id);
            }
            Effect::Removal {
                on,
                walk,
                flags,
                id,
            } => {
                assert_eq!(pos.walk(on), walk, "removal redo: walk on {on}");
                assert_eq!(pos.piece_id(on), id, "removal redo: id on {on}");
                debug_assert_eq!(pos.flags(on), flags);
                pos.empty_square(on);
            }
            Effect::Addition {
                on,
                walk,
                flags,
                id,
            } => {
                assert!(pos.is_empty(on), "addition redo: {on} not empty");
                pos.occupy_square(on, walk, flags, id);
            }
            Effect::Exchange { from, to } => swap_pieces(pos, from, to),
            Effect::WalkChange { on, from, to } => {
                assert_eq!(pos.walk(on), from, "walk change redo on {on}");
                pos.replace_walk(on, to);
            }
            Effect::FlagsChange { on, from, to } | Effect::SideChange { on, from, to } => {
                assert_eq!(pos.flags(on), from, "flags change redo on {on}");
                pos.replace_flags(on, to);
            }
            Effect::SquareBlock { on } => {
                assert!(pos.is_empty(on), "square block redo: {on} not empty");
                pos.block_square(on);
            }
            Effect::CastlingRightsChange { from, to } => {
                assert_eq!(pos.castling(), from, "castling rights redo");
                pos.set_castling(to);
            }
        }
    }

    /// Revert the effect on a position in its "after" state.
    pub(crate) fn undo(&self, pos: &mut Position) {
        match *self {
            Effect::Nothing => {}
            Effect::Movement {
                walk,
                flags,
                id,
                from,
                to,
            } => {
                if from == to {
                    return;
                }
                assert_eq!(pos.walk(to), walk, "movement undo: walk on {to}");
                assert_eq!(pos.flags(to), flags, "movement undo: flags on {to}");
                assert!(pos.is_empty(from), "movement undo: {from} not empty");
                pos.empty_square(to);
                pos.occupy_square(from, walk, flags, id);
            }
            Effect::Removal {
                on,
                walk,
                flags,
                id,
            } => {
                assert!(pos.is_empty(on), "removal undo: {on} not empty");
                pos.occupy_square(on, walk, flags, id);
            }
            Effect::Addition { on, walk, id, .. } => {
                assert_eq!(pos.walk(on), walk, "addition undo: walk on {on}");
                assert_eq!(pos.piece_id(on), id, "addition undo: id on {on}");
                pos.empty_square(on);
            }
            Effect::Exchange { from, to } => swap_pieces(pos, from, to),
            Effect::WalkChange { on, from, to } => {
                assert_eq!(pos.walk(on), to, "walk change undo on {on}");
                pos.replace_walk(on, from);
            }
            Effect::FlagsChange { on, from, to } | Effect::SideChange { on, from, to } => {
                assert_eq!(pos.flags(on), to, "flags change undo on {on}");
                pos.replace_flags(on, from);
            }
            Effect::SquareBlock { on } => {
                assert!(pos.is_hole(on), "square block undo: {on} is no hole");
                pos.empty_square(on);
            }
            Effect::CastlingRightsChange { from, to } => {
                assert_eq!(pos.castling(), to, "castling rights undo");
                pos.set_castling(from);
            }
        }
    }
}

fn swap_pieces(pos: &mut Position, a: Square, b: Square) {
    let (wa, fa, ia) = (pos.walk(a), pos.flags(a), pos.piece_id(a));
    let (wb, fb, ib) = (pos.walk(b), pos.flags(b), pos.piece_id(b));
    assert!(wa.is_piece() && wb.is_piece(), "exchange needs two pieces");
    pos.empty_square(a);
    pos.empty_square(b);
    pos.occupy_square(a, wb, fb, ib);
    pos.occupy_square(b, wa, fa, ia);
}
