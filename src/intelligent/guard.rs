//! Whole-position swap for intelligent mode.

use std::ops::{Deref, DerefMut};

use crate::core::position::Position;
use crate::solving::Solver;

/// Replaces the live position for the guard's lifetime.
///
/// Construction builds candidate final positions directly on the board, and
/// each candidate is verified by solving forward from the start position.
/// Both switches go through this guard so the displaced board comes back on
/// every exit path.
pub struct PositionSwap<'a> {
    solver: &'a mut Solver,
    saved: Position,
}

impl<'a> PositionSwap<'a> {
    pub fn new(solver: &'a mut Solver, mut replacement: Position) -> Self {
        std::mem::swap(&mut solver.position, &mut replacement);
        Self {
            solver,
            saved: replacement,
        }
    }

    /// The position that was displaced.
    pub fn saved(&self) -> &Position {
        &self.saved
    }
}

impl Deref for PositionSwap<'_> {
    type Target = Solver;

    fn deref(&self) -> &Solver {
        self.solver
    }
}

impl DerefMut for PositionSwap<'_> {
    fn deref_mut(&mut self) -> &mut Solver {
        self.solver
    }
}

impl Drop for PositionSwap<'_> {
    fn drop(&mut self) {
        std::mem::swap(&mut self.solver.position, &mut self.saved);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_displaced_position_returns() {
        let mut solver = Solver::new();
        solver.position = Position::initial_game_array();
        let start = solver.position.clone();
        {
            let swap = PositionSwap::new(&mut solver, Position::empty());
            assert_eq!(swap.position, Position::empty());
            assert_eq!(swap.saved(), &start);
        }
        assert_eq!(solver.position, start);
    }
}
