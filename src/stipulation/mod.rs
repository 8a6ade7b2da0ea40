//! Stipulations and the slice graph that solves them.
//!
//! - [`slice`]: slice types and the index arena
//! - [`traversal`]: structure traversal with per-type overrides
//! - [`rank`]: rank orders and order-driven insertion
//! - [`branch`]: branch templates (battle, help, goal)
//! - [`builder`]: stipulation -> slice graph, starter imposition

pub mod branch;
pub mod builder;
pub mod goal;
pub mod parse;
pub mod rank;
pub mod slice;
pub mod traversal;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::piece::Side;
use crate::problem::SolveError;

pub use goal::{Goal, GoalExpr};

/// The formal goal specification of a problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Stipulation {
    /// White forces the goal in `moves` moves against any defense (`#2`).
    Direct { goal: GoalExpr, moves: u32 },
    /// White forces Black to reach the goal against White within `moves`
    /// moves (`s#2`): the goal is tested after Black's moves.
    SelfPlay { goal: GoalExpr, moves: u32 },
    /// A self stipulation where either side must reach the goal in one
    /// move whenever it can (`r#2`).
    Reflex { goal: GoalExpr, moves: u32 },
    /// Both sides cooperate to reach the goal in `half_moves` half-moves
    /// (`h#2` = 4, `h#1.5` = 3).
    Help { goal: GoalExpr, half_moves: u32 },
    /// Either stipulation solves the problem.
    Quodlibet(Box<Stipulation>, Box<Stipulation>),
    /// Both stipulations must be solvable.
    Reciprocal(Box<Stipulation>, Box<Stipulation>),
}

impl Stipulation {
    /// Side making the first move.
    pub fn starter(&self) -> Side {
        match self {
            Stipulation::Direct { .. }
            | Stipulation::SelfPlay { .. }
            | Stipulation::Reflex { .. } => Side::White,
            Stipulation::Help { half_moves, .. } => {
                if half_moves % 2 == 0 {
                    Side::Black
                } else {
                    Side::White
                }
            }
            Stipulation::Quodlibet(a, _) | Stipulation::Reciprocal(a, _) => a.starter(),
        }
    }

    /// Half-moves of the (longest) branch.
    pub fn half_moves(&self) -> u32 {
        match self {
            Stipulation::Direct { moves, .. } => (2 * moves).saturating_sub(1),
            Stipulation::SelfPlay { moves, .. } | Stipulation::Reflex { moves, .. } => 2 * moves,
            Stipulation::Help { half_moves, .. } => *half_moves,
            Stipulation::Quodlibet(a, b) | Stipulation::Reciprocal(a, b) => {
                a.half_moves().max(b.half_moves())
            }
        }
    }

    pub fn is_help(&self) -> bool {
        match self {
            Stipulation::Direct { .. }
            | Stipulation::SelfPlay { .. }
            | Stipulation::Reflex { .. } => false,
            Stipulation::Help { .. } => true,
            Stipulation::Quodlibet(a, b) | Stipulation::Reciprocal(a, b) => {
                a.is_help() && b.is_help()
            }
        }
    }

    /// Reject stipulations built in code that the parser would refuse.
    pub fn check(&self) -> Result<(), SolveError> {
        let empty = match self {
            Stipulation::Direct { moves, .. }
            | Stipulation::SelfPlay { moves, .. }
            | Stipulation::Reflex { moves, .. } => *moves == 0,
            Stipulation::Help { half_moves, .. } => *half_moves == 0,
            Stipulation::Quodlibet(a, b) | Stipulation::Reciprocal(a, b) => {
                a.check()?;
                b.check()?;
                false
            }
        };
        if empty {
            return Err(SolveError::InvalidProblem {
                reason: format!("stipulation {self} has no moves"),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Stipulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stipulation::Direct { goal, moves } => write!(f, "{goal}{moves}"),
            Stipulation::SelfPlay { goal, moves } => write!(f, "s{goal}{moves}"),
            Stipulation::Reflex { goal, moves } => write!(f, "r{goal}{moves}"),
            Stipulation::Help { goal, half_moves } => {
                write!(f, "h{goal}{}", half_moves / 2)?;
                if half_moves % 2 == 1 {
                    write!(f, ".5")?;
                }
                Ok(())
            }
            Stipulation::Quodlibet(a, b) => write!(f, "quod({a},{b})"),
            Stipulation::Reciprocal(a, b) => write!(f, "reci({a},{b})"),
        }
    }
}

impl FromStr for Stipulation {
    type Err = SolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse::parse_stipulation(s)
    }
}

impl TryFrom<String> for Stipulation {
    type Error = SolveError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Stipulation> for String {
    fn from(s: Stipulation) -> String {
        s.to_string()
    }
}
