//! The move-effect journal: a per-ply, LIFO log of every atomic board change.
//!
//! Layout of one ply's range `[base[ply], top)`:
//! - `base + CAPTURE_OFFSET`: the capture (or `Effect::Nothing`)
//! - `base + MOVEMENT_OFFSET`: the primary movement ("the move")
//! - anything after: promotion, castling partner, rebirths, condition effects
//!
//! Every `do_*` helper records its entry and applies it to the live position in
//! one step, so the journal and the board never disagree.

pub mod effects;

use crate::core::piece::{CastlingRights, Flags, PieceId, Side, Walk};
use crate::core::position::Position;
use crate::core::square::Square;

pub use effects::{Effect, Entry, Reason};

pub type Ply = usize;

pub const CAPTURE_OFFSET: usize = 0;
pub const MOVEMENT_OFFSET: usize = 1;
pub const OTHER_EFFECTS_OFFSET: usize = 2;

#[derive(Debug, Clone)]
pub struct Journal {
    entries: Vec<Entry>,
    top: usize,
    /// `base[p]` is the first entry of ply `p`; `base.len() - 1` is the current ply.
    base: Vec<usize>,
    /// End of the most recently undone range, for `redo_ply`.
    redo_top: usize,
}

impl Default for Journal {
    fn default() -> Self {
        Self::new()
    }
}

impl Journal {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            top: 0,
            base: vec![0],
            redo_top: 0,
        }
    }

    /// Forget everything (twin boundary).
    pub fn reset(&mut self) {
        self.entries.clear();
        self.top = 0;
        self.base.clear();
        self.base.push(0);
        self.redo_top = 0;
    }

    #[inline]
    pub fn current_ply(&self) -> Ply {
        self.base.len() - 1
    }

    #[inline]
    pub fn top(&self) -> usize {
        self.top
    }

    #[inline]
    pub fn ply_base(&self, ply: Ply) -> usize {
        self.base[ply]
    }

    /// End (exclusive) of a ply's range.
    #[inline]
    pub fn ply_end(&self, ply: Ply) -> usize {
        if ply < self.current_ply() {
            self.base[ply + 1]
        } else {
            self.top
        }
    }

    pub fn ply_entries(&self, ply: Ply) -> &[Entry] {
        &self.entries[self.ply_base(ply)..self.ply_end(ply)]
    }

    #[inline]
    pub fn entry(&self, index: usize) -> &Entry {
        debug_assert!(index < self.top);
        &self.entries[index]
    }

    /// Open a new ply on top of the current one.
    pub fn open_ply(&mut self) -> Ply {
        self.base.push(self.top);
        self.current_ply()
    }

    /// Close the current ply; all of its entries must have been undone.
    pub fn close_ply(&mut self) {
        let ply = self.current_ply();
        assert!(ply > 0, "close_ply without open ply");
        assert_eq!(self.top, self.base[ply], "close_ply with pending effects");
        self.base.pop();
    }

    /// Reserve the next slot of the current ply.
    fn allocate_entry(&mut self, effect: Effect, reason: Reason) -> usize {
        self.entries.truncate(self.top);
        self.entries.push(Entry { effect, reason });
        self.top += 1;
        self.redo_top = self.top;
        self.top - 1
    }

    fn record(&mut self, pos: &mut Position, effect: Effect, reason: Reason) -> usize {
        effect.redo(pos);
        self.allocate_entry(effect, reason)
    }

    /// Undo the current ply's effects in reverse order.
    pub fn undo_ply(&mut self, pos: &mut Position) {
        let start = self.base[self.current_ply()];
        let end = self.top;
        for i in (start..end).rev() {
            self.entries[i].effect.undo(pos);
        }
        self.top = start;
        self.redo_top = end;
    }

    /// Re-apply what the last `undo_ply` reverted.
    pub fn redo_ply(&mut self, pos: &mut Position) {
        assert_eq!(self.top, self.base[self.current_ply()], "redo_ply on a dirty ply");
        for i in self.top..self.redo_top {
            self.entries[i].effect.redo(pos);
        }
        self.top = self.redo_top;
    }

    pub fn do_no_piece_removal(&mut self) -> usize {
        self.allocate_entry(Effect::Nothing, Reason::NoCapture)
    }

    /// Move a piece; `from == to` records a no-op movement.
    pub fn do_piece_movement(
        &mut self,
        pos: &mut Position,
        reason: Reason,
        from: Square,
        to: Square,
    ) -> usize {
        let effect = Effect::Movement {
            walk: pos.walk(from),
            flags: pos.flags(from),
            id: pos.piece_id(from),
            from,
            to,
        };
        self.record(pos, effect, reason)
    }

    pub fn do_piece_removal(&mut self, pos: &mut Position, reason: Reason, on: Square) -> usize {
        let effect = Effect::Removal {
            on,
            walk: pos.walk(on),
            flags: pos.flags(on),
            id: pos.piece_id(on),
        };
        self.record(pos, effect, reason)
    }

    /// Put a (previously removed) piece back on the board, keeping its identity.
    pub fn do_piece_readdition(
        &mut self,
        pos: &mut Position,
        reason: Reason,
        on: Square,
        walk: Walk,
        flags: Flags,
        id: PieceId,
    ) -> usize {
        self.record(
            pos,
            Effect::Addition {
                on,
                walk,
                flags,
                id,
            },
            reason,
        )
    }

    pub fn do_piece_exchange(
        &mut self,
        pos: &mut Position,
        reason: Reason,
        from: Square,
        to: Square,
    ) -> usize {
        self.record(pos, Effect::Exchange { from, to }, reason)
    }

    pub fn do_walk_change(
        &mut self,
        pos: &mut Position,
        reason: Reason,
        on: Square,
        to: Walk,
    ) -> usize {
        let effect = Effect::WalkChange {
            on,
            from: pos.walk(on),
            to,
        };
        self.record(pos, effect, reason)
    }

    pub fn do_flags_change(
        &mut self,
        pos: &mut Position,
        reason: Reason,
        on: Square,
        to: Flags,
    ) -> usize {
        let effect = Effect::FlagsChange {
            on,
            from: pos.flags(on),
            to,
        };
        self.record(pos, effect, reason)
    }

    pub fn do_side_change(
        &mut self,
        pos: &mut Position,
        reason: Reason,
        on: Square,
        to: Side,
    ) -> usize {
        let from = pos.flags(on);
        let effect = Effect::SideChange {
            on,
            from,
            to: from.with_side(to),
        };
        self.record(pos, effect, reason)
    }

    pub fn do_square_block(&mut self, pos: &mut Position, reason: Reason, on: Square) -> usize {
        self.record(pos, Effect::SquareBlock { on }, reason)
    }

    pub fn do_castling_rights_change(
        &mut self,
        pos: &mut Position,
        reason: Reason,
        to: CastlingRights,
    ) -> usize {
        let effect = Effect::CastlingRightsChange {
            from: pos.castling(),
            to,
        };
        self.record(pos, effect, reason)
    }

    /// The capture slot of a ply, if the ply has played a move.
    pub fn capture(&self, ply: Ply) -> Option<&Entry> {
        let idx = self.ply_base(ply) + CAPTURE_OFFSET;
        (idx < self.ply_end(ply)).then(|| &self.entries[idx])
    }

    /// The primary movement of a ply ("the move").
    pub fn movement(&self, ply: Ply) -> Option<&Entry> {
        let idx = self.ply_base(ply) + MOVEMENT_OFFSET;
        (idx < self.ply_end(ply)).then(|| &self.entries[idx])
    }

    /// What the ply's move captured: `(square, walk, flags, id)`.
    pub fn captured_piece(&self, ply: Ply) -> Option<(Square, Walk, Flags, PieceId)> {
        match self.capture(ply)?.effect {
            Effect::Removal {
                on,
                walk,
                flags,
                id,
            } => Some((on, walk, flags, id)),
            _ => None,
        }
    }

    /// Identity of the piece that made the ply's primary movement.
    pub fn moving_piece_id(&self, ply: Ply) -> Option<PieceId> {
        match self.movement(ply)?.effect {
            Effect::Movement { id, .. } => Some(id),
            _ => None,
        }
    }

    /// Where the moving piece started this ply.
    pub fn departure_square(&self, ply: Ply) -> Square {
        match self.movement(ply).map(|e| e.effect) {
            Some(Effect::Movement { from, .. }) | Some(Effect::Exchange { from, .. }) => from,
            _ => Square::NONE,
        }
    }

    /// Track a piece forward from the entry at `index` (exclusive) to the
    /// journal top, starting on `sq`. Returns `Square::NONE` if it left the board.
    pub fn follow_piece_through_other_effects(
        &self,
        index: usize,
        id: PieceId,
        sq: Square,
    ) -> Square {
        let mut pos = sq;
        for entry in &self.entries[index + 1..self.top] {
            match entry.effect {
                Effect::Movement {
                    id: moved, from, to, ..
                } if from == pos => {
                    debug_assert_eq!(moved, id, "follow_piece: id mismatch on {from}");
                    pos = to;
                }
                Effect::Exchange { from, to } => {
                    if from == pos {
                        pos = to;
                    } else if to == pos {
                        pos = from;
                    }
                }
                Effect::Removal { on, id: removed, .. } if on == pos && removed == id => {
                    pos = Square::NONE;
                }
                Effect::Addition { on, id: added, .. } if added == id => {
                    pos = on;
                }
                _ => {}
            }
        }
        pos
    }

    /// Current square of the piece that made the ply's primary movement.
    pub fn moving_piece_square(&self, ply: Ply) -> Square {
        let idx = self.ply_base(ply) + MOVEMENT_OFFSET;
        match self.movement(ply).map(|e| e.effect) {
            Some(Effect::Movement { id, to, .. }) => {
                self.follow_piece_through_other_effects(idx, id, to)
            }
            _ => Square::NONE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        Square::parse(s).unwrap()
    }

    #[test]
    fn undo_restores_every_effect_kind() {
        let mut pos = Position::initial_game_array();
        let before = pos.clone();
        let mut j = Journal::new();
        j.open_ply();

        j.do_piece_removal(&mut pos, Reason::Capture, sq("d7"));
        j.do_piece_movement(&mut pos, Reason::Moving, sq("e2"), sq("e4"));
        j.do_walk_change(&mut pos, Reason::Promotion, sq("e4"), Walk::Queen);
        j.do_flags_change(
            &mut pos,
            Reason::ChameleonPromotion,
            sq("e4"),
            Flags::WHITE.with(Flags::CHAMELEON),
        );
        j.do_side_change(&mut pos, Reason::Andernach, sq("e4"), Side::Black);
        j.do_piece_readdition(
            &mut pos,
            Reason::CirceRebirth,
            sq("d5"),
            Walk::Pawn,
            Flags::BLACK,
            PieceId(20),
        );
        j.do_piece_exchange(&mut pos, Reason::Messigny, sq("d1"), sq("d8"));
        j.do_square_block(&mut pos, Reason::HaanHole, sq("e2"));
        j.do_castling_rights_change(&mut pos, Reason::CastlingRights, CastlingRights::NONE);
        j.do_piece_movement(&mut pos, Reason::Moving, sq("a2"), sq("a2"));

        assert_ne!(pos, before);
        j.undo_ply(&mut pos);
        assert_eq!(pos, before);
        j.close_ply();
    }

    #[test]
    fn redo_replays_the_undone_ply() {
        let mut pos = Position::initial_game_array();
        let mut j = Journal::new();
        j.open_ply();
        j.do_no_piece_removal();
        j.do_piece_movement(&mut pos, Reason::Moving, sq("g1"), sq("f3"));
        let after = pos.clone();
        j.undo_ply(&mut pos);
        j.redo_ply(&mut pos);
        assert_eq!(pos, after);
        j.undo_ply(&mut pos);
        j.close_ply();
    }

    #[test]
    fn follow_piece_tracks_later_movements() {
        let mut pos = Position::initial_game_array();
        let mut j = Journal::new();
        j.open_ply();
        j.do_no_piece_removal();
        j.do_piece_movement(&mut pos, Reason::Moving, sq("b1"), sq("c3"));
        j.do_piece_movement(&mut pos, Reason::AnticirceRebirth, sq("c3"), sq("a3"));
        assert_eq!(j.moving_piece_square(1), sq("a3"));
        j.do_piece_removal(&mut pos, Reason::Capture, sq("a3"));
        assert_eq!(j.moving_piece_square(1), Square::NONE);
        j.undo_ply(&mut pos);
        j.close_ply();
    }

    #[test]
    fn departure_square_and_capture_slot() {
        let mut pos = Position::initial_game_array();
        let mut j = Journal::new();
        let id = pos.piece_id(sq("d2"));
        j.open_ply();
        j.do_piece_removal(&mut pos, Reason::Capture, sq("d7"));
        j.do_piece_movement(&mut pos, Reason::Moving, sq("d2"), sq("d7"));
        assert_eq!(j.departure_square(1), sq("d2"));
        assert_eq!(j.moving_piece_id(1), Some(id));
        let (on, walk, _, _) = j.captured_piece(1).unwrap();
        assert_eq!((on, walk), (sq("d7"), Walk::Pawn));
        j.undo_ply(&mut pos);
        j.close_ply();
    }
}
