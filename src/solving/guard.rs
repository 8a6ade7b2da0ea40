//! Scope guard for a played move.

use std::ops::{Deref, DerefMut};

use crate::chess::execution::play_move;
use crate::chess::moves::Move;
use crate::solving::Solver;

/// A move played into the current ply; dropping the guard takes it back.
///
/// Every path out of generate -> play -> recurse (including early returns
/// while iterating alternatives) undoes the ply's effects.
pub struct PlyGuard<'a> {
    solver: &'a mut Solver,
}

impl<'a> PlyGuard<'a> {
    /// Play `mv`; `None` when the move budget is exhausted (the solver is
    /// then interrupted).
    pub fn play(solver: &'a mut Solver, mv: Move) -> Option<Self> {
        if let Err(err) = solver.tracker.bump_moves_played("play_move") {
            solver.limit_reached(err);
            return None;
        }
        play_move(&mut solver.journal, &mut solver.position, mv);
        Some(Self { solver })
    }
}

impl Deref for PlyGuard<'_> {
    type Target = Solver;

    fn deref(&self) -> &Solver {
        self.solver
    }
}

impl DerefMut for PlyGuard<'_> {
    fn deref_mut(&mut self) -> &mut Solver {
        self.solver
    }
}

impl Drop for PlyGuard<'_> {
    fn drop(&mut self) {
        let solver = &mut *self.solver;
        solver.journal.undo_ply(&mut solver.position);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::piece::Side;
    use crate::core::position::Position;
    use crate::core::square::Square;

    #[test]
    fn dropping_the_guard_restores_the_position() {
        let mut solver = Solver::new();
        solver.position = Position::initial_game_array();
        let before = solver.position.clone();
        solver.nextply(Side::White);
        let e2 = Square::parse("e2").unwrap();
        let e4 = Square::parse("e4").unwrap();
        {
            let guard = PlyGuard::play(&mut solver, Move::quiet(e2, e4)).unwrap();
            assert!(guard.position.is_occupied(e4));
        }
        assert_eq!(solver.position, before);
        assert_eq!(solver.tracker.counts().moves_played, 1);
        solver.finply();
    }
}
