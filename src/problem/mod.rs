//! Problem layer: glue between the position, the stipulation and the solver.
//!
//! A [`Problem`] bundles:
//! - the diagram ([`Position`]) with stable piece identities
//! - the [`Stipulation`] to satisfy
//! - the active fairy [`ConditionSet`]
//! - user options ([`SolveOptions`]) and explicit budgets ([`ResourceLimits`])
//! - twins, each editing the original problem
//!
//! Problems come from the built-in registry ([`crate::problems`]) or from JSON
//! files ([`ProblemFile`]).

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chess::attacks::is_in_check;
use crate::conditions::ConditionSet;
use crate::core::piece::{Flags, Side, Walk};
use crate::core::position::Position;
use crate::core::square::Square;
use crate::stipulation::Stipulation;

/// Search budgets used to bound memory/time consumption.
///
/// These are not exact byte limits, but correlate strongly with work done:
/// - `max_moves_played`: moves executed through the journal
/// - `max_hash_entries`: entries admitted to the hash table
/// - `max_constructions`: candidate final positions built in intelligent mode
/// - `max_runtime_steps`: slice solve calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceLimits {
    pub max_moves_played: u64,
    pub max_hash_entries: usize,
    pub max_constructions: u64,
    pub max_runtime_steps: u64,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_moves_played: 2_000_000_000,
            max_hash_entries: 1_000_000,
            max_constructions: 50_000_000,
            max_runtime_steps: 20_000_000_000,
        }
    }
}

/// Running counters tracked during a solve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceCounts {
    pub moves_played: u64,
    pub hash_entries: u64,
    pub constructions: u64,
    pub runtime_steps: u64,
}

/// Structured errors for everything that is not an invariant violation.
#[derive(Debug, Error)]
pub enum SolveError {
    /// The problem is internally inconsistent (e.g. two white kings).
    #[error("invalid problem: {reason}")]
    InvalidProblem { reason: String },
    /// Conditions or options that cannot be combined.
    #[error("incompatible conditions: {reason}")]
    IncompatibleConditions { reason: String },
    #[error("cannot parse stipulation {input:?}: {reason}")]
    StipulationParse { input: String, reason: String },
    /// The assembled slice graph breaks one of its own invariants.
    #[error("malformed slice graph: {reason}")]
    Structure { reason: String },
    /// A configured resource limit was exceeded.
    #[error(
        "limit exceeded at {stage}: {metric} (limit={limit}, observed={observed}); \
         counts(moves_played={}, hash_entries={}, constructions={}, runtime_steps={})",
        counts.moves_played,
        counts.hash_entries,
        counts.constructions,
        counts.runtime_steps
    )]
    LimitExceeded {
        stage: &'static str,
        metric: &'static str,
        limit: u64,
        observed: u64,
        counts: ResourceCounts,
    },
    /// A `try_reserve` allocation failed for a large structure.
    #[error(
        "allocation failed at {stage} for {structure}; \
         counts(moves_played={}, hash_entries={}, constructions={}, runtime_steps={})",
        counts.moves_played,
        counts.hash_entries,
        counts.constructions,
        counts.runtime_steps
    )]
    AllocationFailed {
        stage: &'static str,
        structure: &'static str,
        counts: ResourceCounts,
    },
    #[error("io error for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed problem file: {0}")]
    Json(#[from] serde_json::Error),
}

/// User options consumed read-only by the guard slices and the assembler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolveOptions {
    /// Stop after this many solutions.
    pub max_solutions: Option<usize>,
    /// Wall-clock budget in seconds.
    pub max_time: Option<u64>,
    /// Solve mate/stalemate help problems by retrograde construction.
    pub intelligent: bool,
    /// Prune lines where the mating side has no piece left besides its king.
    pub keep_mating: bool,
    /// Do not compute threats in battle play.
    pub no_threat: bool,
    /// Only accept keys whose threat is at most this many moves.
    pub max_threat_length: Option<u32>,
    /// Also solve the set play (help play only).
    pub set_play: bool,
    /// Skip root moves before this 1-based move number.
    pub restart: Option<usize>,
    /// Minimum solution length in moves. Direct play rejects shorter
    /// solutions; help play also tries every length from here up.
    pub min_length: Option<u32>,
    /// Hash table capacity; 0 disables hashing.
    pub hash_entries: usize,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            max_solutions: None,
            max_time: None,
            intelligent: false,
            keep_mating: false,
            no_threat: false,
            max_threat_length: None,
            set_play: false,
            restart: None,
            min_length: None,
            hash_entries: 100_000,
        }
    }
}

impl SolveOptions {
    pub fn max_time(&self) -> Option<Duration> {
        self.max_time.map(Duration::from_secs)
    }
}

/// A position edit applied by a twin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TwinEdit {
    /// Add a piece, e.g. `"wSc3"`.
    Add(String),
    Remove(String),
    Move { from: String, to: String },
    /// Exchange the colours of all pieces.
    SwapSides,
    /// Mirror the board between ranks 1 and 8.
    Reflect,
}

/// One twin: edits of the original problem.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Twin {
    pub label: String,
    pub edits: Vec<TwinEdit>,
    pub stipulation: Option<Stipulation>,
    pub conditions: Option<Vec<String>>,
}

/// A fully specified problem.
///
/// `Problem::validate()` checks invariants such as king counts and
/// condition/option compatibility.
#[derive(Debug, Clone)]
pub struct Problem {
    pub name: String,
    pub position: Position,
    pub stipulation: Stipulation,
    pub conditions: ConditionSet,
    pub options: SolveOptions,
    pub limits: ResourceLimits,
    pub twins: Vec<Twin>,
}

impl Problem {
    pub fn new(name: impl Into<String>, position: Position, stipulation: Stipulation) -> Self {
        Self {
            name: name.into(),
            position,
            stipulation,
            conditions: ConditionSet::default(),
            options: SolveOptions::default(),
            limits: ResourceLimits::default(),
            twins: Vec::new(),
        }
    }

    /// Validate problem invariants. Intended to be called by CLIs/tests before solving.
    pub fn validate(&self) -> Result<(), SolveError> {
        for side in Side::BOTH {
            let kings = self
                .position
                .pieces_of(side)
                .filter(|(_, walk, _, _)| *walk == Walk::King)
                .count();
            if kings > 1 {
                return Err(SolveError::InvalidProblem {
                    reason: format!("{side:?} has {kings} kings"),
                });
            }
        }

        self.stipulation.check()?;

        let starter = self.stipulation.starter();
        if is_in_check(&self.position, starter.opponent()) {
            return Err(SolveError::InvalidProblem {
                reason: format!("{:?} to move but {:?} is in check", starter, starter.opponent()),
            });
        }

        for side in Side::BOTH {
            let edges = [side.relative_rank(0), side.relative_rank(7)];
            for (sq, walk, _, _) in self.position.pieces_of(side) {
                if walk == Walk::Pawn && edges.contains(&sq.rank()) {
                    return Err(SolveError::InvalidProblem {
                        reason: format!("{side:?} pawn on {sq}"),
                    });
                }
            }
        }

        self.conditions.validate()?;

        if self.options.intelligent {
            if !self.conditions.is_orthodox() {
                return Err(SolveError::IncompatibleConditions {
                    reason: "intelligent mode only supports orthodox play".to_string(),
                });
            }
            if self.options.set_play {
                return Err(SolveError::IncompatibleConditions {
                    reason: "intelligent mode cannot be combined with set play".to_string(),
                });
            }
        }

        if self.options.set_play && !self.stipulation.is_help() {
            return Err(SolveError::InvalidProblem {
                reason: "set play is only supported for help play".to_string(),
            });
        }

        Ok(())
    }

    /// The problem as modified by twin `index` (twins are relative to the original).
    pub fn twin(&self, index: usize) -> Result<Problem, SolveError> {
        let twin = self.twins.get(index).ok_or_else(|| SolveError::InvalidProblem {
            reason: format!("no twin {index}"),
        })?;
        let mut out = self.clone();
        out.twins.clear();
        out.name = format!("{} {}", self.name, twin.label);
        for edit in &twin.edits {
            apply_edit(&mut out.position, edit)?;
        }
        if let Some(stip) = &twin.stipulation {
            out.stipulation = stip.clone();
        }
        if let Some(names) = &twin.conditions {
            out.conditions = ConditionSet::from_names(names)?;
        }
        Ok(out)
    }

    /// Load a problem from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Problem, SolveError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SolveError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Problem, SolveError> {
        let file: ProblemFile = serde_json::from_str(text)?;
        file.into_problem()
    }
}

fn apply_edit(pos: &mut Position, edit: &TwinEdit) -> Result<(), SolveError> {
    match edit {
        TwinEdit::Add(spec) => {
            let (side, rest) = match spec.chars().next() {
                Some('w') => (Side::White, &spec[1..]),
                Some('b') => (Side::Black, &spec[1..]),
                _ => {
                    return Err(SolveError::InvalidProblem {
                        reason: format!("twin piece {spec:?} needs a w/b colour prefix"),
                    })
                }
            };
            place_piece(pos, side, rest)
        }
        TwinEdit::Remove(sq) => {
            let sq = parse_square(sq)?;
            if !pos.is_occupied(sq) {
                return Err(SolveError::InvalidProblem {
                    reason: format!("twin removes from empty square {sq}"),
                });
            }
            pos.empty_square(sq);
            Ok(())
        }
        TwinEdit::Move { from, to } => {
            let (from, to) = (parse_square(from)?, parse_square(to)?);
            if !pos.is_occupied(from) || !pos.is_empty(to) {
                return Err(SolveError::InvalidProblem {
                    reason: format!("twin cannot move {from} to {to}"),
                });
            }
            let (walk, flags, id) = (pos.walk(from), pos.flags(from), pos.piece_id(from));
            pos.empty_square(from);
            pos.occupy_square(to, walk, flags, id);
            Ok(())
        }
        TwinEdit::SwapSides => {
            pos.swap_sides();
            Ok(())
        }
        TwinEdit::Reflect => {
            pos.reflect_position();
            Ok(())
        }
    }
}

fn parse_square(s: &str) -> Result<Square, SolveError> {
    Square::parse(s).ok_or_else(|| SolveError::InvalidProblem {
        reason: format!("bad square {s:?}"),
    })
}

/// Place a piece given as `"Kb6"`, `"Pa7"` or `"cQd1"` (chameleon).
pub fn place_piece(pos: &mut Position, side: Side, spec: &str) -> Result<(), SolveError> {
    let bad = || SolveError::InvalidProblem {
        reason: format!("bad piece {spec:?}"),
    };
    let (extra, rest) = match spec.strip_prefix('c') {
        Some(rest) => (Flags::CHAMELEON, rest),
        None => (Flags::NONE, spec),
    };
    let mut chars = rest.chars();
    let walk = chars.next().and_then(Walk::from_letter).ok_or_else(bad)?;
    let sq = Square::parse(chars.as_str()).ok_or_else(bad)?;
    if !pos.is_empty(sq) {
        return Err(SolveError::InvalidProblem {
            reason: format!("square {sq} is used twice"),
        });
    }
    pos.add_piece(sq, walk, side, extra);
    Ok(())
}

/// On-disk problem description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemFile {
    #[serde(default)]
    pub name: String,
    pub white: Vec<String>,
    pub black: Vec<String>,
    pub stipulation: Stipulation,
    #[serde(default)]
    pub conditions: Vec<String>,
    #[serde(default)]
    pub options: SolveOptions,
    #[serde(default)]
    pub limits: ResourceLimits,
    #[serde(default)]
    pub twins: Vec<Twin>,
}

impl ProblemFile {
    pub fn into_problem(self) -> Result<Problem, SolveError> {
        let mut position = Position::empty();
        for spec in &self.white {
            place_piece(&mut position, Side::White, spec)?;
        }
        for spec in &self.black {
            place_piece(&mut position, Side::Black, spec)?;
        }
        position.grant_castling_from_placement();
        Ok(Problem {
            name: self.name,
            position,
            stipulation: self.stipulation,
            conditions: ConditionSet::from_names(&self.conditions)?,
            options: self.options,
            limits: self.limits,
            twins: self.twins,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stipulation::goal::{Goal, GoalExpr};

    #[test]
    fn problem_file_round_trip_builds_the_diagram() {
        let json = r##"{
            "name": "corner",
            "white": ["Kb6", "Rc1"],
            "black": ["Ka8"],
            "stipulation": "#1",
            "twins": [{"label": "b)", "edits": [{"move": {"from": "c1", "to": "d1"}}]}]
        }"##;
        let problem = Problem::from_json(json).unwrap();
        problem.validate().unwrap();
        assert_eq!(problem.position.pieces().count(), 3);
        assert_eq!(problem.stipulation.to_string(), "#1");
        let twin = problem.twin(0).unwrap();
        assert_eq!(twin.position.walk(Square::parse("d1").unwrap()), Walk::Rook);
        assert!(twin.position.is_empty(Square::parse("c1").unwrap()));
    }

    #[test]
    fn chameleon_prefix_sets_the_flag() {
        let mut pos = Position::empty();
        place_piece(&mut pos, Side::White, "cQd1").unwrap();
        let d1 = Square::parse("d1").unwrap();
        assert!(pos.flags(d1).contains(Flags::CHAMELEON));
        assert!(place_piece(&mut pos, Side::Black, "Qd1").is_err());
        assert!(place_piece(&mut pos, Side::Black, "Zd2").is_err());
    }

    #[test]
    fn side_not_to_move_in_check_is_rejected() {
        let mut pos = Position::empty();
        place_piece(&mut pos, Side::White, "Ke1").unwrap();
        place_piece(&mut pos, Side::White, "Ra8").unwrap();
        place_piece(&mut pos, Side::Black, "Kh8").unwrap();
        let problem = Problem::new("bad", pos, "#1".parse().unwrap());
        assert!(matches!(
            problem.validate(),
            Err(SolveError::InvalidProblem { .. })
        ));
    }

    #[test]
    fn stipulation_without_moves_is_rejected() {
        let mut pos = Position::empty();
        place_piece(&mut pos, Side::White, "Kb6").unwrap();
        place_piece(&mut pos, Side::Black, "Ka8").unwrap();
        let stipulation = Stipulation::Direct {
            goal: GoalExpr::Goal(Goal::Mate),
            moves: 0,
        };
        assert_eq!(stipulation.half_moves(), 0);
        let problem = Problem::new("empty", pos, stipulation);
        assert!(matches!(
            problem.validate(),
            Err(SolveError::InvalidProblem { .. })
        ));
    }
}
