//! Goal testing at the end of a branch.

use crate::chess::attacks::is_in_check;
use crate::solving::length::{is_solved, Length, SLACK_LENGTH};
use crate::solving::{Mode, SolveTable, Solver};
use crate::stipulation::goal::Goal;
use crate::stipulation::slice::{SliceIndex, SliceType, NO_SLICE};

pub fn register(table: &mut SolveTable) {
    table.register(SliceType::GoalReachedTester, goal_reached_tester);
    table.register(SliceType::True, true_leaf);
}

/// Does the side to move at `si` (the one the goal is inflicted on) have no
/// legal move? Asks the tester's immobility branch.
fn is_immobile(s: &mut Solver, si: SliceIndex) -> bool {
    if s.slices[si].fork == NO_SLICE {
        return false;
    }
    let n = SLACK_LENGTH + 1;
    let r = s.with_mode(Mode::Test, |s| s.solve_fork(si, n));
    !is_solved(r, n)
}

/// Is `goal` reached by the move just played?
pub fn goal_reached(s: &mut Solver, si: SliceIndex, goal: Goal) -> bool {
    let victim = s.starter(si);
    match goal {
        Goal::Mate => is_in_check(&s.position, victim) && is_immobile(s, si),
        Goal::Stalemate => !is_in_check(&s.position, victim) && is_immobile(s, si),
        Goal::Check => is_in_check(&s.position, victim),
        Goal::Capture => {
            let ply = s.current_ply();
            ply > 0 && s.journal.captured_piece(ply).is_some()
        }
    }
}

fn goal_reached_tester(s: &mut Solver, si: SliceIndex, n: Length) -> Length {
    let Some(goal) = s.slices[si].goal() else {
        return n + 2;
    };
    if goal_reached(s, si, goal) {
        s.solve_next(si, n)
    } else {
        n + 2
    }
}

/// Leaf: the goal was reached with nothing left to play.
fn true_leaf(_s: &mut Solver, _si: SliceIndex, _n: Length) -> Length {
    SLACK_LENGTH
}

#[cfg(test)]
mod tests {
    use crate::core::piece::{Flags, Side, Walk};
    use crate::core::position::Position;
    use crate::core::square::Square;
    use crate::problem::Problem;
    use crate::solving::Solver;

    fn sq(s: &str) -> Square {
        Square::parse(s).unwrap()
    }

    #[test]
    fn immobility_is_decided_by_the_tester_branch() {
        // Black Ka8 is stalemated by Qc7 with the white king on b6.
        let mut pos = Position::empty();
        pos.add_piece(sq("b6"), Walk::King, Side::White, Flags::NONE);
        pos.add_piece(sq("c5"), Walk::Queen, Side::White, Flags::NONE);
        pos.add_piece(sq("a8"), Walk::King, Side::Black, Flags::NONE);
        let problem = Problem::new("stalemate", pos, "=1".parse().unwrap());
        let mut solver = Solver::new();
        solver.begin_twin(&problem).unwrap();
        solver.run();
        let keys: Vec<_> = solver.solutions.iter().map(|s| s.moves[0].text.clone()).collect();
        assert!(keys.contains(&"Qc5-c7".to_string()));
        assert!(!keys.contains(&"Qc5-c8".to_string()));
    }
}
