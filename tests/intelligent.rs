use fairy_solver::chess::execution::play_move;
use fairy_solver::chess::legality::{is_mate, legal_moves};
use fairy_solver::core::piece::Side;
use fairy_solver::core::position::Position;
use fairy_solver::core::square::Square;
use fairy_solver::journal::Journal;
use fairy_solver::problem::{place_piece, Problem};
use fairy_solver::problems;
use fairy_solver::solution::Solution;
use fairy_solver::solving::solve_problem;
use fairy_solver::stipulation::parse::parse_stipulation;

/// Play the recorded moves from the start position.
fn replay(problem: &Problem, solution: &Solution) -> Position {
    let mut pos = problem.position.clone();
    let mut journal = Journal::new();
    for record in &solution.moves {
        let mv = legal_moves(&pos, record.side, Square::NONE)
            .into_iter()
            .find(|mv| mv.from.to_string() == record.from && mv.to.to_string() == record.to)
            .unwrap_or_else(|| panic!("{} is not legal", record.text));
        journal.open_ply();
        play_move(&mut journal, &mut pos, mv);
    }
    pos
}

#[test]
fn every_constructed_help_mate_replays_to_mate() {
    let problem = problems::help_mate_rook_intelligent().unwrap();
    let report = solve_problem(&problem).unwrap();
    assert!(!report.twins[0].solutions.is_empty());
    for solution in &report.twins[0].solutions {
        let last = solution.moves.last().unwrap();
        let end = replay(&problem, solution);
        assert!(is_mate(&end, last.side.opponent()), "{solution}");
    }
}

fn diagram(white: &[&str], black: &[&str]) -> Position {
    let mut pos = Position::empty();
    for spec in white {
        place_piece(&mut pos, Side::White, spec).unwrap();
    }
    for spec in black {
        place_piece(&mut pos, Side::Black, spec).unwrap();
    }
    pos
}

fn sorted_lines(problem: &Problem) -> Vec<String> {
    let report = solve_problem(problem).unwrap();
    let mut lines: Vec<String> = report.twins[0]
        .solutions
        .iter()
        .map(ToString::to_string)
        .collect();
    lines.sort();
    lines
}

/// Solve `pos` both ways and require the same solutions; returns them.
fn agree(pos: Position, stipulation: &str) -> Vec<String> {
    let plain = Problem::new(stipulation, pos, parse_stipulation(stipulation).unwrap());
    let mut intelligent = plain.clone();
    intelligent.options.intelligent = true;
    let expected = sorted_lines(&plain);
    assert!(!expected.is_empty(), "{stipulation} has no solution");
    assert_eq!(sorted_lines(&intelligent), expected, "{stipulation}");
    expected
}

#[test]
fn two_move_help_mate_agrees_with_plain_search() {
    agree(diagram(&["Kc6", "Rh1"], &["Ka8", "Pa7"]), "h#2");
}

#[test]
fn castling_mates_are_constructed() {
    let mut pos = diagram(&["Ke1", "Rh1"], &["Kf8", "Re8", "Rg8", "Pe7", "Pg7", "Pa7"]);
    pos.grant_castling_from_placement();
    let lines = agree(pos, "h#1");
    assert!(lines.contains(&"1.a7-a5 0-0".to_string()), "{lines:?}");
    assert!(lines.contains(&"1.a7-a6 Rh1-f1".to_string()), "{lines:?}");
}

#[test]
fn the_stalemating_king_blocks_a_pawn() {
    // 1.Ka7-a8 Kd1-c2 2.Bc4-d3 Kc2xd3: the king ends up in front of Pd4
    let lines = agree(diagram(&["Kd1", "Qc7", "Ph4"], &["Ka7", "Pd4", "Bc4"]), "h=2");
    assert!(lines.iter().any(|l| l.ends_with("Kc2xd3")), "{lines:?}");
}

#[test]
fn help_stalemates_with_the_king_taking_part_agree() {
    agree(diagram(&["Kd3", "Qc8"], &["Ka1", "Pc3", "Rb1"]), "h=2");
}

#[test]
fn promotion_mates_are_constructed() {
    let lines = agree(diagram(&["Kb6", "Pf7"], &["Ka8", "Pe5"]), "h#2");
    assert!(lines.iter().any(|l| l.ends_with("f7-f8=Q")), "{lines:?}");
    assert!(lines.iter().any(|l| l.ends_with("f7-f8=R")), "{lines:?}");
}

#[test]
fn unsupported_stipulations_fall_back_to_plain_search() {
    let mut problem = problems::corner_mate().unwrap();
    problem.options.intelligent = true;
    let report = solve_problem(&problem).unwrap();
    assert_eq!(report.twins[0].solutions.len(), 1);
    assert_eq!(report.twins[0].counts.constructions, 0);
}
