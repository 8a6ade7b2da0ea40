//! Orthodox chess on the mailbox board: moves, attacks, generation, execution.

pub mod attacks;
pub mod execution;
pub mod legality;
pub mod movegen;
pub mod moves;
