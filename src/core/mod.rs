//! Board primitives shared by every layer of the solver.
//!
//! - [`square`]: 10x12 mailbox squares, directions and algebraic notation.
//! - [`piece`]: walks, sides, flag bitsets, piece identities, castling rights.
//! - [`position`]: the live board with its king-square cache and invariant-checking mutators.

pub mod piece;
pub mod position;
pub mod square;
