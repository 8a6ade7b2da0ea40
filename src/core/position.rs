use std::fmt;

use crate::core::piece::{CastlingRights, Flags, PieceId, Side, Walk};
use crate::core::square::{Direction, Square, BOARD_CELLS};

/// The live board: walks, flags and piece identities per mailbox cell.
///
/// Invariants:
/// - border cells are `Walk::Invalid` and never change
/// - an occupied cell has a piece walk and side ownership flags
/// - `king_square` mirrors the cells holding royal pieces
///
/// Search code mutates the board only through the move-effect journal; the
/// primitive mutators here are what the journal's doers call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Position {
    walk: [Walk; BOARD_CELLS],
    flags: [Flags; BOARD_CELLS],
    id: [PieceId; BOARD_CELLS],
    king_square: [Square; 2],
    castling: CastlingRights,
    next_id: u32,
}

/// A compact, exact board fingerprint used by the hash table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PositionKey {
    cells: [u8; 64],
    castling: u8,
    extra: u8,
    en_passant: Square,
    to_move: Side,
}

impl Default for Position {
    fn default() -> Self {
        Self::empty()
    }
}

impl Position {
    /// An empty board (playing squares empty, border invalid).
    pub fn empty() -> Self {
        let mut walk = [Walk::Invalid; BOARD_CELLS];
        for sq in Square::all() {
            walk[sq.index()] = Walk::Empty;
        }
        Self {
            walk,
            flags: [Flags::NONE; BOARD_CELLS],
            id: [PieceId::NONE; BOARD_CELLS],
            king_square: [Square::NONE; 2],
            castling: CastlingRights::NONE,
            next_id: 1,
        }
    }

    /// The orthodox game array; piece ids are assigned a1..h1, a2..h2, ..., a8..h8.
    pub fn initial_game_array() -> Self {
        const BACK_RANK: [Walk; 8] = [
            Walk::Rook,
            Walk::Knight,
            Walk::Bishop,
            Walk::Queen,
            Walk::King,
            Walk::Bishop,
            Walk::Knight,
            Walk::Rook,
        ];
        let mut pos = Self::empty();
        for rank in [0, 1, 6, 7] {
            for file in 0..8 {
                let sq = Square::new(file, rank).expect("board square");
                let (walk, side) = match rank {
                    0 => (BACK_RANK[file as usize], Side::White),
                    1 => (Walk::Pawn, Side::White),
                    6 => (Walk::Pawn, Side::Black),
                    _ => (BACK_RANK[file as usize], Side::Black),
                };
                pos.add_piece(sq, walk, side, Flags::NONE);
            }
        }
        pos.grant_castling_from_placement();
        pos
    }

    #[inline]
    pub fn walk(&self, sq: Square) -> Walk {
        self.walk[sq.index()]
    }

    #[inline]
    pub fn flags(&self, sq: Square) -> Flags {
        self.flags[sq.index()]
    }

    #[inline]
    pub fn piece_id(&self, sq: Square) -> PieceId {
        self.id[sq.index()]
    }

    #[inline]
    pub fn is_empty(&self, sq: Square) -> bool {
        self.walk(sq) == Walk::Empty
    }

    #[inline]
    pub fn is_occupied(&self, sq: Square) -> bool {
        self.walk(sq).is_piece()
    }

    #[inline]
    pub fn belongs_to(&self, sq: Square, side: Side) -> bool {
        self.is_occupied(sq) && self.flags(sq).belongs_to(side)
    }

    /// Square of `side`'s royal piece, or `Square::NONE` if it has none.
    #[inline]
    pub fn king_square(&self, side: Side) -> Square {
        self.king_square[side.index()]
    }

    #[inline]
    pub fn castling(&self) -> CastlingRights {
        self.castling
    }

    #[inline]
    pub fn set_castling(&mut self, rights: CastlingRights) {
        self.castling = rights;
    }

    /// Place a new piece with a fresh id. Kings are made royal.
    pub fn add_piece(&mut self, sq: Square, walk: Walk, side: Side, extra: Flags) -> PieceId {
        let id = PieceId(self.next_id);
        self.next_id += 1;
        let mut flags = Flags::of_side(side).with(extra);
        if walk == Walk::King {
            flags = flags.with(Flags::ROYAL);
        }
        self.occupy_square(sq, walk, flags, id);
        id
    }

    /// Put a piece with a known identity on an empty square.
    pub fn occupy_square(&mut self, sq: Square, walk: Walk, flags: Flags, id: PieceId) {
        assert!(sq.is_on_board(), "occupy_square off the board: {sq:?}");
        assert!(walk.is_piece(), "occupy_square with non-piece walk {walk:?}");
        debug_assert!(self.is_empty(sq), "occupy_square on occupied {sq}");
        self.walk[sq.index()] = walk;
        self.flags[sq.index()] = flags;
        self.id[sq.index()] = id;
        if flags.contains(Flags::ROYAL) {
            for side in Side::BOTH {
                if flags.belongs_to(side) {
                    self.king_square[side.index()] = sq;
                }
            }
        }
        self.next_id = self.next_id.max(id.0 + 1);
    }

    /// Remove whatever stands on `sq` (pieces and holes alike).
    pub fn empty_square(&mut self, sq: Square) {
        assert!(sq.is_on_board(), "empty_square off the board: {sq:?}");
        for side in Side::BOTH {
            if self.king_square[side.index()] == sq {
                self.king_square[side.index()] = Square::NONE;
            }
        }
        self.walk[sq.index()] = Walk::Empty;
        self.flags[sq.index()] = Flags::NONE;
        self.id[sq.index()] = PieceId::NONE;
    }

    pub fn replace_walk(&mut self, sq: Square, walk: Walk) {
        assert!(self.is_occupied(sq), "replace_walk on empty {sq}");
        assert!(walk.is_piece());
        self.walk[sq.index()] = walk;
    }

    pub fn replace_flags(&mut self, sq: Square, flags: Flags) {
        assert!(self.is_occupied(sq), "replace_flags on empty {sq}");
        self.empty_king_cache_at(sq);
        self.flags[sq.index()] = flags;
        if flags.contains(Flags::ROYAL) {
            for side in Side::BOTH {
                if flags.belongs_to(side) {
                    self.king_square[side.index()] = sq;
                }
            }
        }
    }

    fn empty_king_cache_at(&mut self, sq: Square) {
        for side in Side::BOTH {
            if self.king_square[side.index()] == sq {
                self.king_square[side.index()] = Square::NONE;
            }
        }
    }

    /// Turn an empty square into a hole.
    pub fn block_square(&mut self, sq: Square) {
        assert!(sq.is_on_board());
        assert!(
            matches!(self.walk(sq), Walk::Empty | Walk::Invalid),
            "block_square on occupied {sq}"
        );
        self.walk[sq.index()] = Walk::Invalid;
        self.flags[sq.index()] = Flags::NONE;
        self.id[sq.index()] = PieceId::NONE;
    }

    #[inline]
    pub fn is_hole(&self, sq: Square) -> bool {
        sq.is_on_board() && self.walk(sq) == Walk::Invalid
    }

    /// First square along `dir` from `from` that is not empty.
    pub fn find_end_of_line(&self, from: Square, dir: Direction) -> Square {
        let mut sq = from.offset(dir);
        while self.is_empty(sq) {
            sq = sq.offset(dir);
        }
        sq
    }

    /// Iterate occupied squares as `(square, walk, flags, id)`.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Walk, Flags, PieceId)> + '_ {
        Square::all()
            .filter(|&sq| self.is_occupied(sq))
            .map(|sq| (sq, self.walk(sq), self.flags(sq), self.piece_id(sq)))
    }

    pub fn pieces_of(&self, side: Side) -> impl Iterator<Item = (Square, Walk, Flags, PieceId)> + '_ {
        self.pieces().filter(move |(_, _, f, _)| f.belongs_to(side))
    }

    /// Does `side` own anything besides royal pieces?
    pub fn has_non_royal_piece(&self, side: Side) -> bool {
        self.pieces_of(side)
            .any(|(_, walk, flags, _)| walk != Walk::King && !flags.contains(Flags::ROYAL))
    }

    /// Exchange the ownership of every piece.
    pub fn swap_sides(&mut self) {
        for sq in Square::all() {
            if !self.is_occupied(sq) {
                continue;
            }
            let flags = self.flags(sq);
            let white = flags.belongs_to(Side::White);
            let black = flags.belongs_to(Side::Black);
            if white != black {
                let side = if white { Side::Black } else { Side::White };
                self.flags[sq.index()] = flags.with_side(side);
            }
        }
        self.king_square.swap(0, 1);
        let mut rights = CastlingRights::NONE;
        for side in Side::BOTH {
            for king_side in [false, true] {
                if self.castling.has(side, king_side) {
                    rights = rights.granted(side.opponent(), king_side);
                }
            }
        }
        self.castling = rights;
    }

    /// Mirror the board top-to-bottom (rank r <-> rank 7-r).
    pub fn reflect_position(&mut self) {
        let old = self.clone();
        for sq in Square::all() {
            self.walk[sq.index()] = Walk::Empty;
            self.flags[sq.index()] = Flags::NONE;
            self.id[sq.index()] = PieceId::NONE;
        }
        self.king_square = [Square::NONE; 2];
        for sq in Square::all() {
            let mirrored = Square::new(sq.file(), 7 - sq.rank()).expect("board square");
            match old.walk(sq) {
                Walk::Empty => {}
                Walk::Invalid => self.block_square(mirrored),
                walk => self.occupy_square(mirrored, walk, old.flags(sq), old.piece_id(sq)),
            }
        }
        self.castling = CastlingRights::NONE;
    }

    /// Grant castling rights wherever king and rook stand on their original squares.
    pub fn grant_castling_from_placement(&mut self) {
        let mut rights = CastlingRights::NONE;
        for side in Side::BOTH {
            let rank = side.relative_rank(0);
            let Some(king_home) = Square::new(4, rank) else {
                continue;
            };
            if !(self.walk(king_home) == Walk::King && self.belongs_to(king_home, side)) {
                continue;
            }
            for (file, king_side) in [(0, false), (7, true)] {
                if let Some(rook_home) = Square::new(file, rank) {
                    if self.walk(rook_home) == Walk::Rook && self.belongs_to(rook_home, side) {
                        rights = rights.granted(side, king_side);
                    }
                }
            }
        }
        self.castling = rights;
    }

    /// Exact fingerprint of the board plus the state that influences move generation.
    pub fn key(&self, to_move: Side, en_passant: Square, extra: u8) -> PositionKey {
        let mut cells = [0u8; 64];
        for (i, sq) in Square::all().enumerate() {
            let walk = self.walk(sq);
            let flags = self.flags(sq);
            let side_bits = (flags.bits() & 0b11) as u8;
            let chameleon = u8::from(flags.contains(Flags::CHAMELEON));
            cells[i] = (walk as u8) | (side_bits << 3) | (chameleon << 5);
        }
        PositionKey {
            cells,
            castling: self.castling.bits(),
            extra,
            en_passant,
            to_move,
        }
    }

    /// Same board content, ignoring identities (used by twin/regression comparisons).
    pub fn same_diagram(&self, other: &Position) -> bool {
        Square::all().all(|sq| self.walk(sq) == other.walk(sq) && self.flags(sq) == other.flags(sq))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0..8).rev() {
            for file in 0..8 {
                let sq = Square::new(file, rank).expect("board square");
                let c = match self.walk(sq) {
                    Walk::Empty => '.',
                    Walk::Invalid => '#',
                    walk if self.belongs_to(sq, Side::White) => walk.letter(),
                    walk => walk.letter().to_ascii_lowercase(),
                };
                write!(f, "{c}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_array_has_kings_and_rights() {
        let pos = Position::initial_game_array();
        assert_eq!(pos.king_square(Side::White), Square::parse("e1").unwrap());
        assert_eq!(pos.king_square(Side::Black), Square::parse("e8").unwrap());
        assert_eq!(pos.pieces().count(), 32);
        for side in Side::BOTH {
            assert!(pos.castling().has(side, true));
            assert!(pos.castling().has(side, false));
        }
        // ids are sequential in placement order
        assert_eq!(pos.piece_id(Square::A1), PieceId(1));
        assert_eq!(pos.piece_id(Square::H8), PieceId(32));
    }

    #[test]
    fn end_of_line_stops_at_border_and_pieces() {
        let pos = Position::initial_game_array();
        let e4 = Square::parse("e4").unwrap();
        assert_eq!(pos.find_end_of_line(e4, 10), Square::parse("e7").unwrap());
        assert!(!pos.find_end_of_line(e4, 1).is_on_board());
    }

    #[test]
    fn swap_and_reflect_twice_restore_the_diagram() {
        let start = Position::initial_game_array();
        let mut pos = start.clone();
        pos.swap_sides();
        pos.reflect_position();
        assert!(pos.same_diagram(&start));
        pos.swap_sides();
        pos.reflect_position();
        assert!(pos.same_diagram(&start));
    }
}
