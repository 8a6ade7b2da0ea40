//! Built-in problems.
//!
//! Small enough to be used in tests and fast demos; each has a known set of
//! solutions.

use crate::conditions::{Condition, ConditionSet};
use crate::core::piece::Side;
use crate::core::position::Position;
use crate::problem::{place_piece, Problem, SolveError, Twin, TwinEdit};
use crate::stipulation::parse::parse_stipulation;

fn diagram(white: &[&str], black: &[&str]) -> Result<Position, SolveError> {
    let mut pos = Position::empty();
    for spec in white {
        place_piece(&mut pos, Side::White, spec)?;
    }
    for spec in black {
        place_piece(&mut pos, Side::Black, spec)?;
    }
    pos.grant_castling_from_placement();
    Ok(pos)
}

/// The game array, mate in 2. White has no such mate.
pub fn initial_array_mate2() -> Result<Problem, SolveError> {
    Ok(Problem::new(
        "initial_array_mate2",
        Position::initial_game_array(),
        parse_stipulation("#2")?,
    ))
}

/// Mate in 1 along the back rank; only Rc8 mates.
pub fn corner_mate() -> Result<Problem, SolveError> {
    let pos = diagram(&["Kb6", "Rc1"], &["Ka8"])?;
    Ok(Problem::new("corner_mate", pos, parse_stipulation("#1")?))
}

/// [`corner_mate`] with a twin moving the rook to d1.
pub fn corner_mate_twins() -> Result<Problem, SolveError> {
    let mut problem = corner_mate()?;
    problem.name = "corner_mate_twins".to_string();
    problem.twins.push(Twin {
        label: "b)".to_string(),
        edits: vec![TwinEdit::Move {
            from: "c1".to_string(),
            to: "d1".to_string(),
        }],
        ..Twin::default()
    });
    Ok(problem)
}

/// Stalemate in 1 with king and queen; Qc7, Qd6 and Qe5 stalemate.
pub fn queen_stalemate() -> Result<Problem, SolveError> {
    let pos = diagram(&["Kb6", "Qc5"], &["Ka8"])?;
    Ok(Problem::new("queen_stalemate", pos, parse_stipulation("=1")?))
}

/// Help mate in 1: 1.b7-b6 Rh1-h8# and 1.b7-b5 Rh1-h8#.
pub fn help_mate_rook() -> Result<Problem, SolveError> {
    let pos = diagram(&["Kc7", "Rh1"], &["Ka8", "Pa7", "Pb7"])?;
    Ok(Problem::new("help_mate_rook", pos, parse_stipulation("h#1")?))
}

/// [`help_mate_rook`] solved by construction.
pub fn help_mate_rook_intelligent() -> Result<Problem, SolveError> {
    let mut problem = help_mate_rook()?;
    problem.name = "help_mate_rook_intelligent".to_string();
    problem.options.intelligent = true;
    Ok(problem)
}

/// Circe capture in 1: the rook taken on d5 is reborn on a8.
pub fn circe_capture() -> Result<Problem, SolveError> {
    let pos = diagram(&["Kh1", "Qd1"], &["Kh8", "Rd5"])?;
    let mut problem = Problem::new("circe_capture", pos, parse_stipulation("x1")?);
    problem.conditions = ConditionSet::default().with(Condition::Circe);
    Ok(problem)
}

/// Anticirce capture in 1: Rxd5 would send the rook to the occupied h1, so
/// there is no solution.
pub fn anticirce_blocked() -> Result<Problem, SolveError> {
    let pos = diagram(&["Kh1", "Rd2"], &["Kh8", "Rd5"])?;
    let mut problem = Problem::new("anticirce_blocked", pos, parse_stipulation("x1")?);
    problem.conditions = ConditionSet::default().with(Condition::Anticirce);
    Ok(problem)
}

/// Look up a built-in problem by name.
pub fn by_name(name: &str) -> Result<Option<Problem>, SolveError> {
    let problem = match name {
        "initial_array_mate2" => initial_array_mate2()?,
        "corner_mate" => corner_mate()?,
        "corner_mate_twins" => corner_mate_twins()?,
        "queen_stalemate" => queen_stalemate()?,
        "help_mate_rook" => help_mate_rook()?,
        "help_mate_rook_intelligent" => help_mate_rook_intelligent()?,
        "circe_capture" => circe_capture()?,
        "anticirce_blocked" => anticirce_blocked()?,
        _ => return Ok(None),
    };
    Ok(Some(problem))
}

/// Names of all built-in problems.
pub fn names() -> &'static [&'static str] {
    &[
        "initial_array_mate2",
        "corner_mate",
        "corner_mate_twins",
        "queen_stalemate",
        "help_mate_rook",
        "help_mate_rook_intelligent",
        "circe_capture",
        "anticirce_blocked",
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_name_builds_a_valid_problem() {
        for name in names() {
            let problem = by_name(name).unwrap().unwrap();
            assert_eq!(&problem.name, name);
            problem.validate().unwrap();
        }
        assert!(by_name("nonexistent").unwrap().is_none());
    }
}
