use std::fmt;

/// A square of the 10x12 mailbox board.
///
/// The playing area is `a1 = 21` .. `h8 = 98`; every other index is a border
/// square that stays `Walk::Invalid` forever, so sliding pieces stop at the edge
/// without bounds checks.
///
/// `Square::NONE` (index 0) is a border square used as "no square".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square(u8);

/// Number of cells in the mailbox array.
pub const BOARD_CELLS: usize = 120;

/// A signed mailbox offset (`+10` is one rank up, `+1` one file right).
pub type Direction = i8;

pub const NORTH: Direction = 10;
pub const SOUTH: Direction = -10;
pub const EAST: Direction = 1;
pub const WEST: Direction = -1;

pub const ROOK_DIRS: [Direction; 4] = [NORTH, SOUTH, EAST, WEST];
pub const BISHOP_DIRS: [Direction; 4] = [NORTH + EAST, NORTH + WEST, SOUTH + EAST, SOUTH + WEST];
pub const QUEEN_DIRS: [Direction; 8] = [
    NORTH,
    SOUTH,
    EAST,
    WEST,
    NORTH + EAST,
    NORTH + WEST,
    SOUTH + EAST,
    SOUTH + WEST,
];
pub const KNIGHT_OFFSETS: [Direction; 8] = [21, 19, 12, 8, -8, -12, -19, -21];

impl Square {
    pub const NONE: Square = Square(0);
    pub const A1: Square = Square(21);
    pub const H8: Square = Square(98);

    #[inline]
    pub const fn from_index(index: u8) -> Square {
        Square(index)
    }

    /// Build from 0-based file and rank. Returns `None` off the board.
    #[inline]
    pub fn new(file: i32, rank: i32) -> Option<Square> {
        if (0..8).contains(&file) && (0..8).contains(&rank) {
            Some(Square((21 + file + 10 * rank) as u8))
        } else {
            None
        }
    }

    #[inline]
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// True for the 64 playing squares.
    #[inline]
    pub fn is_on_board(self) -> bool {
        let i = self.0 as i32;
        (21..=98).contains(&i) && (1..=8).contains(&(i % 10))
    }

    #[inline]
    pub fn file(self) -> i32 {
        debug_assert!(self.is_on_board());
        self.0 as i32 % 10 - 1
    }

    #[inline]
    pub fn rank(self) -> i32 {
        debug_assert!(self.is_on_board());
        self.0 as i32 / 10 - 2
    }

    /// Dark squares (a1, c1, ...) return `true`.
    #[inline]
    pub fn is_dark(self) -> bool {
        (self.file() + self.rank()) % 2 == 0
    }

    #[inline]
    pub fn offset(self, dir: Direction) -> Square {
        Square((self.0 as i16 + dir as i16) as u8)
    }

    /// Chebyshev (king) distance between two board squares.
    #[inline]
    pub fn king_distance(self, other: Square) -> u32 {
        let df = (self.file() - other.file()).unsigned_abs();
        let dr = (self.rank() - other.rank()).unsigned_abs();
        df.max(dr)
    }

    /// The unit direction leading from `self` to `other` if they share a line.
    pub fn line_direction(self, other: Square) -> Option<Direction> {
        if self == other {
            return None;
        }
        let df = other.file() - self.file();
        let dr = other.rank() - self.rank();
        if df != 0 && dr != 0 && df.abs() != dr.abs() {
            return None;
        }
        Some((df.signum() + 10 * dr.signum()) as Direction)
    }

    /// Iterate the 64 playing squares, a1, b1, ... h8.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..8).flat_map(|rank| (0..8).map(move |file| Square((21 + file + 10 * rank) as u8)))
    }

    /// Parse algebraic notation (`"e4"`).
    pub fn parse(s: &str) -> Option<Square> {
        let mut chars = s.chars();
        let f = chars.next()?;
        let r = chars.next()?;
        if chars.next().is_some() {
            return None;
        }
        let file = (f as i32) - ('a' as i32);
        let rank = (r as i32) - ('1' as i32);
        Square::new(file, rank)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_on_board() {
            return write!(f, "--");
        }
        let file = (b'a' + self.file() as u8) as char;
        let rank = (b'1' + self.rank() as u8) as char;
        write!(f, "{file}{rank}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn algebraic_round_trip_covers_corners() {
        assert_eq!(Square::parse("a1"), Some(Square::A1));
        assert_eq!(Square::parse("h8"), Some(Square::H8));
        assert_eq!(Square::parse("i1"), None);
        assert_eq!(Square::A1.to_string(), "a1");
        assert_eq!(Square::all().count(), 64);
        assert!(Square::all().all(|sq| sq.is_on_board()));
        assert!(!Square::NONE.is_on_board());
    }

    #[test]
    fn line_direction_detects_rook_and_bishop_lines() {
        let e4 = Square::parse("e4").unwrap();
        assert_eq!(e4.line_direction(Square::parse("e8").unwrap()), Some(NORTH));
        assert_eq!(e4.line_direction(Square::parse("b1").unwrap()), Some(SOUTH + WEST));
        assert_eq!(e4.line_direction(Square::parse("f6").unwrap()), None);
    }
}
