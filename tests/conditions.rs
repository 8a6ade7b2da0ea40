use fairy_solver::conditions::{Condition, ConditionSet};
use fairy_solver::journal::Reason;
use fairy_solver::problem::{place_piece, Problem};
use fairy_solver::problems;
use fairy_solver::solution::{Solution, SolveReport};
use fairy_solver::solving::solve_problem;
use fairy_solver::stipulation::parse::parse_stipulation;
use fairy_solver::core::piece::Side;
use fairy_solver::core::position::Position;

fn problem(white: &[&str], black: &[&str], stipulation: &str, conditions: &[Condition]) -> Problem {
    let mut pos = Position::empty();
    for spec in white {
        place_piece(&mut pos, Side::White, spec).unwrap();
    }
    for spec in black {
        place_piece(&mut pos, Side::Black, spec).unwrap();
    }
    let mut problem = Problem::new("test", pos, parse_stipulation(stipulation).unwrap());
    let mut set = ConditionSet::default();
    for &c in conditions {
        set.insert(c);
    }
    problem.conditions = set;
    problem
}

fn solutions(report: &SolveReport) -> &[Solution] {
    &report.twins[0].solutions
}

#[test]
fn circe_rebirth_lands_on_the_capture_square_colour() {
    let problem = problems::circe_capture().unwrap();
    let report = solve_problem(&problem).unwrap();
    let solutions = solutions(&report);
    assert_eq!(solutions.len(), 1);
    let key = &solutions[0].moves[0];
    assert_eq!(key.text, "Qd1xd5[+bRa8]");
    assert_eq!(key.captured.as_deref(), Some("bRd5"));
    assert!(key.effects.contains(&Reason::CirceRebirth));
    assert!(solutions[0].final_position.black.contains(&"Ra8".to_string()));
}

#[test]
fn circe_rebirth_is_suppressed_on_an_occupied_square() {
    let problem = problem(&["Kh1", "Qd1"], &["Kh8", "Rd5", "Sa8"], "x1", &[Condition::Circe]);
    let report = solve_problem(&problem).unwrap();
    let solutions = solutions(&report);
    assert_eq!(solutions.len(), 1);
    let key = &solutions[0].moves[0];
    assert_eq!(key.text, "Qd1xd5");
    assert!(!key.effects.contains(&Reason::CirceRebirth));
    assert_eq!(solutions[0].final_position.black, vec!["Sa8", "Kh8"]);
}

#[test]
fn anticirce_capture_is_illegal_when_the_rebirth_square_is_occupied() {
    let blocked = problems::anticirce_blocked().unwrap();
    let report = solve_problem(&blocked).unwrap();
    assert!(solutions(&report).is_empty());

    let mut orthodox = blocked.clone();
    orthodox.conditions = ConditionSet::default();
    let report = solve_problem(&orthodox).unwrap();
    assert_eq!(solutions(&report).len(), 1);
    assert_eq!(solutions(&report)[0].moves[0].text, "Rd2xd5");
}

#[test]
fn anticirce_capturer_goes_home() {
    let problem = problem(&["Kh1", "Qd3"], &["Kh8", "Rd5"], "x1", &[Condition::Anticirce]);
    let report = solve_problem(&problem).unwrap();
    let solutions = solutions(&report);
    assert_eq!(solutions.len(), 1);
    let key = &solutions[0].moves[0];
    assert_eq!(key.text, "Qd3xd5[d5->d1]");
    assert!(key.effects.contains(&Reason::AnticirceRebirth));
    assert_eq!(solutions[0].final_position.white, vec!["Qd1", "Kh1"]);
}

#[test]
fn supercirce_offers_every_rebirth_and_none() {
    let problem = problem(&["Kh1", "Qd1"], &["Kh8", "Rd5"], "x1", &[Condition::Supercirce]);
    let report = solve_problem(&problem).unwrap();
    let texts: Vec<&str> = solutions(&report)
        .iter()
        .map(|s| s.moves[0].text.as_str())
        .collect();
    assert!(texts.contains(&"Qd1xd5"));
    assert!(texts.contains(&"Qd1xd5[+bRa8]"));
    assert!(texts.contains(&"Qd1xd5[+bRe4]"));
    // a rook reborn on the first rank would check the white king
    assert!(!texts.contains(&"Qd1xd5[+bRa1]"));
    let mut unique = texts.clone();
    unique.sort_unstable();
    unique.dedup();
    assert_eq!(unique.len(), texts.len());
}

#[test]
fn andernach_capturer_changes_side() {
    let problem = problem(&["Kg1", "Qd1"], &["Kh8", "Rd5"], "x1", &[Condition::Andernach]);
    let report = solve_problem(&problem).unwrap();
    let solutions = solutions(&report);
    assert_eq!(solutions.len(), 1);
    assert_eq!(solutions[0].moves[0].text, "Qd1xd5[d5=b]");
    assert_eq!(solutions[0].final_position.black, vec!["Qd5", "Kh8"]);
    assert_eq!(solutions[0].final_position.white, vec!["Kg1"]);
}

#[test]
fn andernach_side_change_may_not_expose_the_own_king() {
    // the new black queen on d5 would check the king on h1
    let problem = problem(&["Kh1", "Qd1"], &["Kh8", "Rd5"], "x1", &[Condition::Andernach]);
    let report = solve_problem(&problem).unwrap();
    assert!(solutions(&report).is_empty());
}

#[test]
fn haan_leaves_a_hole_behind() {
    let problem = problem(&["Kg1", "Qd1"], &["Kh8", "Rd5"], "x1", &[Condition::Haan]);
    let report = solve_problem(&problem).unwrap();
    let solutions = solutions(&report);
    assert_eq!(solutions.len(), 1);
    assert_eq!(solutions[0].moves[0].text, "Qd1xd5[d1 hole]");
    assert!(solutions[0].moves[0].effects.contains(&Reason::HaanHole));
}

#[test]
fn chameleon_changes_walk_after_moving() {
    let problem = problem(&["Kg1", "cQd1"], &["Kh8", "Rd5"], "x1", &[Condition::Chameleon]);
    let report = solve_problem(&problem).unwrap();
    let solutions = solutions(&report);
    assert_eq!(solutions.len(), 1);
    assert_eq!(solutions[0].moves[0].text, "Qd1xd5[d5=S]");
    assert_eq!(solutions[0].final_position.white, vec!["Kg1", "cSd5"]);
}

#[test]
fn messigny_exchange_gives_an_extra_check() {
    let orthodox = problem(&["Kg2", "Rd1"], &["Kh8", "Ra8"], "+1", &[]);
    let report = solve_problem(&orthodox).unwrap();
    let mut keys: Vec<&str> = solutions(&report).iter().map(|s| s.moves[0].text.as_str()).collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["Rd1-d8", "Rd1-h1"]);

    let messigny = problem(&["Kg2", "Rd1"], &["Kh8", "Ra8"], "+1", &[Condition::Messigny]);
    let report = solve_problem(&messigny).unwrap();
    let mut keys: Vec<&str> = solutions(&report).iter().map(|s| s.moves[0].text.as_str()).collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["Rd1-d8", "Rd1-h1", "d1<->a8"]);
    let exchange = solutions(&report)
        .iter()
        .find(|s| s.moves[0].text == "d1<->a8")
        .unwrap();
    assert!(exchange.moves[0].effects.contains(&Reason::Messigny));
}
