use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use fairy_solver::problem::Problem;
use fairy_solver::problems;
use fairy_solver::solution::SolveReport;
use fairy_solver::solving::solve_problem;

fn unique_temp_dir(name: &str) -> PathBuf {
    let base = std::env::temp_dir().join("fairy_solver_tests").join(name);
    let _ = fs::create_dir_all(&base);

    let pid = std::process::id();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();

    for i in 0..1000u32 {
        let p = base.join(format!("{pid}-{nanos}-{i}"));
        if fs::create_dir(&p).is_ok() {
            return p;
        }
    }

    panic!("failed to create a unique temp dir under {}", base.display());
}

#[test]
fn report_roundtrips_through_json() {
    let dir = unique_temp_dir("report_roundtrip");
    let problem = problems::circe_capture().unwrap();
    let report = solve_problem(&problem).unwrap();

    let path = dir.join("report.json");
    report.write_json(&path).unwrap();
    let loaded = SolveReport::read_json(&path).unwrap();

    assert_eq!(loaded.problem, "circe_capture");
    assert_eq!(loaded.twins.len(), 1);
    assert_eq!(loaded.twins[0].conditions, vec!["circe"]);
    assert_eq!(loaded.twins[0].solutions, report.twins[0].solutions);
    assert_eq!(loaded.twins[0].counts, report.twins[0].counts);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn problem_files_load_with_options_and_twins() {
    let dir = unique_temp_dir("problem_file");
    let path = dir.join("problem.json");
    fs::write(
        &path,
        r#"{
            "name": "from file",
            "white": ["Kc7", "Rh1"],
            "black": ["Ka8", "Pa7", "Pb7"],
            "stipulation": "h#1",
            "options": {"intelligent": true, "max_solutions": 5},
            "twins": [{"label": "b)", "edits": [{"remove": "a7"}]}]
        }"#,
    )
    .unwrap();

    let problem = Problem::from_file(&path).unwrap();
    assert!(problem.options.intelligent);
    let report = solve_problem(&problem).unwrap();
    assert_eq!(report.twins.len(), 2);
    assert_eq!(report.twins[0].solutions.len(), 2);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn missing_problem_file_is_an_io_error() {
    let dir = unique_temp_dir("missing");
    let err = Problem::from_file(dir.join("nope.json")).unwrap_err();
    assert!(err.to_string().contains("io error"));
}
