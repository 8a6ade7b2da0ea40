use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use fairy_solver::conditions::ConditionSet;
use fairy_solver::problem::{Problem, SolveError};
use fairy_solver::problems;
use fairy_solver::solving::solve_problem;
use fairy_solver::stipulation::parse::parse_stipulation;

/// Solve a chess problem, orthodox or fairy.
#[derive(Debug, Parser)]
#[command(name = "solve", version)]
struct Args {
    /// Built-in problem name or path to a JSON problem file.
    problem: Option<String>,

    /// List the built-in problems and exit.
    #[arg(long)]
    list: bool,

    /// Replace the stipulation, e.g. "h#2" or "#3".
    #[arg(long)]
    stipulation: Option<String>,

    /// Replace the conditions (repeatable), e.g. --condition circe.
    #[arg(long = "condition")]
    conditions: Vec<String>,

    /// Solve help mates and stalemates by construction.
    #[arg(long)]
    intelligent: bool,

    #[arg(long)]
    max_solutions: Option<usize>,

    /// Wall-clock budget in seconds.
    #[arg(long)]
    max_time: Option<u64>,

    #[arg(long)]
    set_play: bool,

    #[arg(long)]
    no_threat: bool,

    #[arg(long)]
    keep_mating: bool,

    /// Skip root moves before this move number.
    #[arg(long)]
    restart: Option<usize>,

    /// Hash table capacity; 0 disables hashing.
    #[arg(long)]
    hash_entries: Option<usize>,

    /// Print the report as JSON.
    #[arg(long)]
    json: bool,

    /// Also write the JSON report to this file.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn load(name: &str) -> Result<Problem, SolveError> {
    if let Some(problem) = problems::by_name(name)? {
        return Ok(problem);
    }
    let path = Path::new(name);
    if path.exists() {
        return Problem::from_file(path);
    }
    Err(SolveError::InvalidProblem {
        reason: format!(
            "unknown problem {name:?}; built-in problems:\n  - {}",
            problems::names().join("\n  - ")
        ),
    })
}

fn apply_overrides(problem: &mut Problem, args: &Args) -> Result<(), SolveError> {
    if let Some(stipulation) = &args.stipulation {
        problem.stipulation = parse_stipulation(stipulation)?;
    }
    if !args.conditions.is_empty() {
        problem.conditions = ConditionSet::from_names(&args.conditions)?;
    }
    let options = &mut problem.options;
    options.intelligent |= args.intelligent;
    options.set_play |= args.set_play;
    options.no_threat |= args.no_threat;
    options.keep_mating |= args.keep_mating;
    if args.max_solutions.is_some() {
        options.max_solutions = args.max_solutions;
    }
    if args.max_time.is_some() {
        options.max_time = args.max_time;
    }
    if args.restart.is_some() {
        options.restart = args.restart;
    }
    if let Some(entries) = args.hash_entries {
        options.hash_entries = entries;
    }
    Ok(())
}

fn run(args: &Args, name: &str) -> Result<(), SolveError> {
    let mut problem = load(name)?;
    apply_overrides(&mut problem, args)?;
    let report = solve_problem(&problem)?;

    if let Some(path) = &args.output {
        report.write_json(path)?;
    }
    if args.json {
        println!("{}", report.to_json()?);
        return Ok(());
    }

    println!("Problem: {}", report.problem);
    for twin in &report.twins {
        let conditions = if twin.conditions.is_empty() {
            String::new()
        } else {
            format!(" [{}]", twin.conditions.join(", "))
        };
        println!("{}{}{conditions}", twin.label, twin.stipulation);
        for solution in &twin.solutions {
            println!("  {solution}");
            if !solution.threat.is_empty() {
                let threat: Vec<&str> = solution.threat.iter().map(|m| m.text.as_str()).collect();
                println!("    threat: {}", threat.join(", "));
            }
            for variation in &solution.variations {
                println!("    1...{}", variation.text());
            }
        }
        if twin.solutions.is_empty() {
            println!("  no solution");
        }
        if let Some(why) = twin.interrupted {
            println!("  interrupted: {why:?}");
        }
        println!(
            "  moves played: {}, constructions: {}",
            twin.counts.moves_played, twin.counts.constructions
        );
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if args.list {
        for name in problems::names() {
            println!("{name}");
        }
        return ExitCode::SUCCESS;
    }
    let Some(name) = args.problem.clone() else {
        eprintln!(
            "Usage: solve <problem>\n\nAvailable problems:\n  - {}",
            problems::names().join("\n  - ")
        );
        return ExitCode::from(2);
    };

    match run(&args, &name) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Failed to solve {name}: {err}");
            ExitCode::FAILURE
        }
    }
}
