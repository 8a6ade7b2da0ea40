use std::fmt;

use serde::{Deserialize, Serialize};

/// What the last move of a branch has to achieve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Goal {
    Mate,
    Stalemate,
    Check,
    Capture,
}

impl Goal {
    pub fn symbol(self) -> char {
        match self {
            Goal::Mate => '#',
            Goal::Stalemate => '=',
            Goal::Check => '+',
            Goal::Capture => 'x',
        }
    }

    pub fn from_symbol(c: char) -> Option<Goal> {
        match c {
            '#' => Some(Goal::Mate),
            '=' => Some(Goal::Stalemate),
            '+' => Some(Goal::Check),
            'x' => Some(Goal::Capture),
            _ => None,
        }
    }

    /// Goals whose test asks whether the side to move has a legal move.
    #[inline]
    pub fn needs_immobility_test(self) -> bool {
        matches!(self, Goal::Mate | Goal::Stalemate)
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Boolean combination of goals tested at the end of a branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoalExpr {
    Goal(Goal),
    And(Box<GoalExpr>, Box<GoalExpr>),
    Or(Box<GoalExpr>, Box<GoalExpr>),
    Not(Box<GoalExpr>),
}

impl GoalExpr {
    /// The goal if the expression is a single plain goal.
    pub fn single(&self) -> Option<Goal> {
        match self {
            GoalExpr::Goal(g) => Some(*g),
            _ => None,
        }
    }
}

impl fmt::Display for GoalExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GoalExpr::Goal(g) => write!(f, "{g}"),
            GoalExpr::And(a, b) => write!(f, "({a}&{b})"),
            GoalExpr::Or(a, b) => write!(f, "({a}|{b})"),
            GoalExpr::Not(a) => write!(f, "!{a}"),
        }
    }
}
