use std::fmt;

use crate::core::piece::Walk;
use crate::core::square::Square;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// What kind of move a generated move is; drives execution.
pub enum MoveKind {
    Normal,
    DoubleStep,
    EnPassant,
    Promotion(Walk),
    CastleShort,
    CastleLong,
    /// Messigny: the two pieces on `from` and `to` swap places.
    Exchange,
}

/// A generated move.
///
/// `capture` is the square of the captured piece (differs from `to` only for
/// en passant), or `Square::NONE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub capture: Square,
    pub kind: MoveKind,
}

impl Move {
    #[inline]
    pub fn quiet(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            capture: Square::NONE,
            kind: MoveKind::Normal,
        }
    }

    #[inline]
    pub fn capturing(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            capture: to,
            kind: MoveKind::Normal,
        }
    }

    #[inline]
    pub fn is_capture(&self) -> bool {
        !self.capture.is_none()
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            MoveKind::CastleShort => write!(f, "0-0"),
            MoveKind::CastleLong => write!(f, "0-0-0"),
            MoveKind::Exchange => write!(f, "{}<->{}", self.from, self.to),
            _ => {
                let sep = if self.is_capture() { 'x' } else { '-' };
                write!(f, "{}{}{}", self.from, sep, self.to)?;
                if let MoveKind::Promotion(walk) = self.kind {
                    write!(f, "={walk}")?;
                }
                Ok(())
            }
        }
    }
}

/// Per-ply lists of generated moves plus the index of the move being played.
///
/// Generators fill `moves[ply]`; the move slice of the same ply iterates it.
#[derive(Debug, Clone, Default)]
pub struct MoveStack {
    lists: Vec<Vec<Move>>,
    current: Vec<usize>,
}

impl MoveStack {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure(&mut self, ply: usize) {
        if self.lists.len() <= ply {
            self.lists.resize_with(ply + 1, Vec::new);
            self.current.resize(ply + 1, 0);
        }
    }

    /// Replace the move list of `ply`.
    pub fn set(&mut self, ply: usize, moves: Vec<Move>) {
        self.ensure(ply);
        self.lists[ply] = moves;
        self.current[ply] = 0;
    }

    /// Append moves to the list of `ply`.
    pub fn extend(&mut self, ply: usize, moves: impl IntoIterator<Item = Move>) {
        self.ensure(ply);
        self.lists[ply].extend(moves);
    }

    pub fn clear(&mut self, ply: usize) {
        self.ensure(ply);
        self.lists[ply].clear();
        self.current[ply] = 0;
    }

    pub fn len(&self, ply: usize) -> usize {
        self.lists.get(ply).map_or(0, Vec::len)
    }

    pub fn is_empty(&self, ply: usize) -> bool {
        self.len(ply) == 0
    }

    #[inline]
    pub fn get(&self, ply: usize, index: usize) -> Move {
        self.lists[ply][index]
    }

    pub fn moves(&self, ply: usize) -> &[Move] {
        self.lists.get(ply).map_or(&[], Vec::as_slice)
    }

    /// Retain only the moves accepted by `keep`.
    pub fn retain(&mut self, ply: usize, keep: impl FnMut(&Move) -> bool) {
        self.ensure(ply);
        self.lists[ply].retain(keep);
    }

    #[inline]
    pub fn set_current(&mut self, ply: usize, index: usize) {
        self.ensure(ply);
        self.current[ply] = index;
    }

    #[inline]
    pub fn current_index(&self, ply: usize) -> usize {
        self.current.get(ply).copied().unwrap_or(0)
    }

    pub fn reset(&mut self) {
        self.lists.clear();
        self.current.clear();
    }
}
