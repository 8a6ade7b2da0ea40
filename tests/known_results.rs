use fairy_solver::problems;
use fairy_solver::solution::SolveReport;
use fairy_solver::solving::solve_problem;

fn solve(name: &str) -> SolveReport {
    let problem = problems::by_name(name).unwrap().unwrap();
    solve_problem(&problem).unwrap()
}

/// Solution lines of the first twin as sorted move texts.
fn lines(report: &SolveReport) -> Vec<String> {
    let mut lines: Vec<String> = report.twins[0]
        .solutions
        .iter()
        .map(|s| s.texts().join(" "))
        .collect();
    lines.sort();
    lines
}

#[test]
fn initial_array_has_no_mate_in_two() {
    let report = solve("initial_array_mate2");
    assert_eq!(report.twins.len(), 1);
    assert!(report.twins[0].solutions.is_empty());
    assert!(report.twins[0].interrupted.is_none());
    assert!(report.twins[0].counts.moves_played > 0);
}

#[test]
fn corner_mate_has_a_single_key() {
    let report = solve("corner_mate");
    assert_eq!(lines(&report), vec!["Rc1-c8"]);
    let solution = &report.twins[0].solutions[0];
    assert_eq!(solution.final_position.white, vec!["Kb6", "Rc8"]);
}

#[test]
fn twins_are_solved_in_turn() {
    let report = solve("corner_mate_twins");
    assert_eq!(report.twins.len(), 2);
    assert_eq!(report.twins[1].label, "b)");
    let keys: Vec<Vec<&str>> = report
        .twins
        .iter()
        .map(|t| t.solutions.iter().flat_map(|s| s.texts()).collect())
        .collect();
    assert_eq!(keys, vec![vec!["Rc1-c8"], vec!["Rd1-d8"]]);
}

#[test]
fn king_and_queen_stalemate_in_one() {
    let report = solve("queen_stalemate");
    assert_eq!(lines(&report), vec!["Qc5-c7", "Qc5-d6", "Qc5-e5"]);
}

#[test]
fn help_mate_in_one_with_rook() {
    let report = solve("help_mate_rook");
    assert_eq!(lines(&report), vec!["b7-b5 Rh1-h8", "b7-b6 Rh1-h8"]);
}

#[test]
fn intelligent_mode_finds_the_same_help_mates() {
    let plain = solve("help_mate_rook");
    let intelligent = solve("help_mate_rook_intelligent");
    assert_eq!(lines(&plain), lines(&intelligent));
    assert!(intelligent.twins[0].counts.constructions > 0);
    assert_eq!(plain.twins[0].counts.constructions, 0);
}

#[test]
fn max_solutions_stops_early() {
    let mut problem = problems::queen_stalemate().unwrap();
    problem.options.max_solutions = Some(1);
    let report = solve_problem(&problem).unwrap();
    assert_eq!(report.twins[0].solutions.len(), 1);
    assert!(report.twins[0].interrupted.is_some());
}
