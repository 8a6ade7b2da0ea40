use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Side owning a piece (or to move).
pub enum Side {
    White,
    Black,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::White, Side::Black];

    #[inline]
    pub fn opponent(self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Side::White => 0,
            Side::Black => 1,
        }
    }

    /// Rank direction of this side's pawns.
    #[inline]
    pub fn forward(self) -> i8 {
        match self {
            Side::White => 10,
            Side::Black => -10,
        }
    }

    /// 0-based rank index as seen from this side (own first rank = 0).
    #[inline]
    pub fn relative_rank(self, rank: i32) -> i32 {
        match self {
            Side::White => rank,
            Side::Black => 7 - rank,
        }
    }
}

/// The way a piece moves.
///
/// `Empty` marks a free square; `Invalid` marks border squares and holes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Walk {
    Empty,
    Invalid,
    King,
    Queen,
    Rook,
    Bishop,
    Knight,
    Pawn,
}

impl Walk {
    /// Walks a pawn may promote to.
    pub const PROMOTEES: [Walk; 4] = [Walk::Queen, Walk::Rook, Walk::Bishop, Walk::Knight];

    #[inline]
    pub fn is_piece(self) -> bool {
        !matches!(self, Walk::Empty | Walk::Invalid)
    }

    #[inline]
    pub fn is_rider(self) -> bool {
        matches!(self, Walk::Queen | Walk::Rook | Walk::Bishop)
    }

    pub fn letter(self) -> char {
        match self {
            Walk::King => 'K',
            Walk::Queen => 'Q',
            Walk::Rook => 'R',
            Walk::Bishop => 'B',
            Walk::Knight => 'S',
            Walk::Pawn => 'P',
            Walk::Empty => '.',
            Walk::Invalid => '#',
        }
    }

    /// Accepts both `N` and the problemist's `S` for knights.
    pub fn from_letter(c: char) -> Option<Walk> {
        match c.to_ascii_uppercase() {
            'K' => Some(Walk::King),
            'Q' | 'D' => Some(Walk::Queen),
            'R' | 'T' => Some(Walk::Rook),
            'B' | 'L' => Some(Walk::Bishop),
            'N' | 'S' => Some(Walk::Knight),
            'P' => Some(Walk::Pawn),
            _ => None,
        }
    }

    /// Next walk in the chameleon cycle N -> B -> R -> Q -> N.
    pub fn chameleon_successor(self) -> Walk {
        match self {
            Walk::Knight => Walk::Bishop,
            Walk::Bishop => Walk::Rook,
            Walk::Rook => Walk::Queen,
            Walk::Queen => Walk::Knight,
            other => other,
        }
    }
}

impl fmt::Display for Walk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Per-square piece attribute bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Flags(u16);

impl Flags {
    pub const NONE: Flags = Flags(0);
    pub const WHITE: Flags = Flags(1 << 0);
    pub const BLACK: Flags = Flags(1 << 1);
    pub const NEUTRAL: Flags = Flags(1 << 2);
    pub const ROYAL: Flags = Flags(1 << 3);
    pub const CHAMELEON: Flags = Flags(1 << 4);

    const SIDES: u16 = Self::WHITE.0 | Self::BLACK.0;

    #[inline]
    pub fn of_side(side: Side) -> Flags {
        match side {
            Side::White => Self::WHITE,
            Side::Black => Self::BLACK,
        }
    }

    #[inline]
    pub fn bits(self) -> u16 {
        self.0
    }

    #[inline]
    pub fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub fn with(self, other: Flags) -> Flags {
        Flags(self.0 | other.0)
    }

    #[inline]
    pub fn without(self, other: Flags) -> Flags {
        Flags(self.0 & !other.0)
    }

    #[inline]
    pub fn belongs_to(self, side: Side) -> bool {
        self.contains(Self::of_side(side))
    }

    /// Replace the ownership bits, keeping every other attribute.
    #[inline]
    pub fn with_side(self, side: Side) -> Flags {
        Flags((self.0 & !Self::SIDES) | Self::of_side(side).0)
    }
}

/// Stable identity of a piece across moves, captures and rebirths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct PieceId(pub u32);

impl PieceId {
    pub const NONE: PieceId = PieceId(0);

    #[inline]
    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

/// Castling rights, one bit per (side, wing).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CastlingRights(u8);

impl CastlingRights {
    pub const NONE: CastlingRights = CastlingRights(0);

    #[inline]
    fn bit(side: Side, king_side: bool) -> u8 {
        1 << (side.index() * 2 + usize::from(king_side))
    }

    #[inline]
    pub fn has(self, side: Side, king_side: bool) -> bool {
        self.0 & Self::bit(side, king_side) != 0
    }

    #[inline]
    pub fn granted(self, side: Side, king_side: bool) -> CastlingRights {
        CastlingRights(self.0 | Self::bit(side, king_side))
    }

    #[inline]
    pub fn revoked(self, side: Side, king_side: bool) -> CastlingRights {
        CastlingRights(self.0 & !Self::bit(side, king_side))
    }

    #[inline]
    pub fn bits(self) -> u8 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chameleon_cycle_visits_four_walks() {
        let mut w = Walk::Knight;
        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(w);
            w = w.chameleon_successor();
        }
        assert_eq!(w, Walk::Knight);
        assert_eq!(seen, vec![Walk::Knight, Walk::Bishop, Walk::Rook, Walk::Queen]);
        assert_eq!(Walk::King.chameleon_successor(), Walk::King);
    }

    #[test]
    fn side_change_keeps_other_attributes() {
        let f = Flags::WHITE.with(Flags::CHAMELEON);
        let g = f.with_side(Side::Black);
        assert!(g.belongs_to(Side::Black));
        assert!(!g.belongs_to(Side::White));
        assert!(g.contains(Flags::CHAMELEON));
    }
}
