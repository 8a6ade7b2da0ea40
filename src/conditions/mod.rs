//! Fairy conditions.
//!
//! A condition contributes slice types to the solving graph:
//! - rebirth and change slices behind every move (including the moves of
//!   immobility tests, since they decide legality)
//! - extra move generators behind the ordinary ones (Messigny)
//!
//! Where a slice lands is decided by the rank orders, so the order in which
//! conditions are activated does not matter.

pub mod andernach;
pub mod chameleon;
pub mod circe;
pub mod haan;
pub mod messigny;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::problem::SolveError;
use crate::solving::SolveTable;
use crate::stipulation::rank::insert_slices;
use crate::stipulation::slice::{Slice, SliceIndex, SliceType, Slices};
use crate::stipulation::traversal::find_all;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    Circe,
    Anticirce,
    Supercirce,
    Chameleon,
    Andernach,
    Haan,
    Messigny,
}

impl Condition {
    pub const ALL: [Condition; 7] = [
        Condition::Circe,
        Condition::Anticirce,
        Condition::Supercirce,
        Condition::Chameleon,
        Condition::Andernach,
        Condition::Haan,
        Condition::Messigny,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Condition::Circe => "circe",
            Condition::Anticirce => "anticirce",
            Condition::Supercirce => "supercirce",
            Condition::Chameleon => "chameleon",
            Condition::Andernach => "andernach",
            Condition::Haan => "haan",
            Condition::Messigny => "messigny",
        }
    }

    /// Parse a condition name; case is ignored and a trailing "chess" is
    /// accepted (`"HaanChess"`).
    pub fn from_name(name: &str) -> Option<Condition> {
        let lower = name.trim().to_ascii_lowercase();
        let base = lower.strip_suffix("chess").unwrap_or(&lower);
        Condition::ALL.into_iter().find(|c| c.name() == base)
    }

    fn is_rebirth(self) -> bool {
        matches!(
            self,
            Condition::Circe | Condition::Anticirce | Condition::Supercirce
        )
    }

    /// Slices inserted behind every move, in rank order.
    fn move_slices(self) -> &'static [SliceType] {
        match self {
            Condition::Circe => &[SliceType::CirceRebirth],
            Condition::Anticirce => &[SliceType::AnticirceRebirth],
            Condition::Supercirce => &[SliceType::SupercirceRebirth],
            Condition::Chameleon => &[SliceType::ChameleonPromotion, SliceType::ChameleonChanger],
            Condition::Andernach => &[SliceType::AndernachSideChanger],
            Condition::Haan => &[SliceType::HaanHoleInserter],
            Condition::Messigny => &[],
        }
    }

    /// Slices inserted behind every move generator.
    fn generator_slices(self) -> &'static [SliceType] {
        match self {
            Condition::Messigny => &[SliceType::MessignyMoveGenerator],
            _ => &[],
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The conditions active for a twin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConditionSet {
    active: Vec<Condition>,
}

impl ConditionSet {
    pub fn from_names(names: &[String]) -> Result<Self, SolveError> {
        let mut set = Self::default();
        for name in names {
            let condition = Condition::from_name(name).ok_or_else(|| SolveError::InvalidProblem {
                reason: format!("unknown condition {name:?}"),
            })?;
            set.insert(condition);
        }
        set.validate()?;
        Ok(set)
    }

    pub fn with(mut self, condition: Condition) -> Self {
        self.insert(condition);
        self
    }

    pub fn insert(&mut self, condition: Condition) {
        if !self.active.contains(&condition) {
            self.active.push(condition);
        }
    }

    pub fn contains(&self, condition: Condition) -> bool {
        self.active.contains(&condition)
    }

    pub fn is_orthodox(&self) -> bool {
        self.active.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Condition> + '_ {
        self.active.iter().copied()
    }

    pub fn names(&self) -> Vec<String> {
        self.active.iter().map(|c| c.name().to_string()).collect()
    }

    /// Reject combinations that would fight over the same capture.
    pub fn validate(&self) -> Result<(), SolveError> {
        let rebirths: Vec<_> = self.iter().filter(|c| c.is_rebirth()).collect();
        if rebirths.len() > 1 {
            return Err(SolveError::IncompatibleConditions {
                reason: format!("{} and {} both decide rebirths", rebirths[0], rebirths[1]),
            });
        }
        Ok(())
    }

    /// Insert the slices of every active condition below `root`.
    pub fn instrument(&self, slices: &mut Slices, root: SliceIndex) {
        if self.is_orthodox() {
            return;
        }
        let moves = find_all(
            slices,
            root,
            &[SliceType::AttackMove, SliceType::DefenseMove, SliceType::HelpMove],
        );
        let generators = find_all(
            slices,
            root,
            &[
                SliceType::AttackMoveGenerator,
                SliceType::DefenseMoveGenerator,
                SliceType::HelpMoveGenerator,
            ],
        );
        for condition in self.iter() {
            let protos: Vec<Slice> = condition.move_slices().iter().map(|&k| Slice::new(k)).collect();
            if !protos.is_empty() {
                for &mv in &moves {
                    insert_slices(slices, mv, &protos);
                }
            }
            let protos: Vec<Slice> = condition
                .generator_slices()
                .iter()
                .map(|&k| Slice::new(k))
                .collect();
            if !protos.is_empty() {
                for &generator in &generators {
                    insert_slices(slices, generator, &protos);
                }
            }
            debug!(%condition, moves = moves.len(), generators = generators.len(), "condition instrumented");
        }
    }
}

pub fn register(table: &mut SolveTable) {
    circe::register(table);
    chameleon::register(table);
    andernach::register(table);
    haan::register(table);
    messigny::register(table);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::SolveOptions;
    use crate::stipulation::builder::build_stipulation;
    use crate::stipulation::Stipulation;

    fn kinds_after_instrumenting(conditions: &ConditionSet) -> Vec<Vec<SliceType>> {
        let stip: Stipulation = "h#2".parse().unwrap();
        let mut slices = Slices::new();
        let root = build_stipulation(&mut slices, &stip, &SolveOptions::default());
        conditions.instrument(&mut slices, root);
        let mut moves = find_all(&mut slices, root, &[SliceType::HelpMove]);
        moves.sort_unstable();
        moves.iter().map(|&mv| slices.kinds_along(mv)[..4].to_vec()).collect()
    }

    #[test]
    fn names_parse_with_and_without_suffix() {
        assert_eq!(Condition::from_name("Circe"), Some(Condition::Circe));
        assert_eq!(Condition::from_name("HaanChess"), Some(Condition::Haan));
        assert_eq!(Condition::from_name("einstein"), None);
        assert!(ConditionSet::from_names(&["nonsense".to_string()]).is_err());
    }

    #[test]
    fn two_rebirth_conditions_are_incompatible() {
        let names = vec!["circe".to_string(), "anticirce".to_string()];
        assert!(matches!(
            ConditionSet::from_names(&names),
            Err(SolveError::IncompatibleConditions { .. })
        ));
    }

    #[test]
    fn activation_order_does_not_change_the_graph() {
        let a = ConditionSet::default()
            .with(Condition::Circe)
            .with(Condition::Chameleon)
            .with(Condition::Haan);
        let b = ConditionSet::default()
            .with(Condition::Haan)
            .with(Condition::Chameleon)
            .with(Condition::Circe);
        let kinds_a = kinds_after_instrumenting(&a);
        let kinds_b = kinds_after_instrumenting(&b);
        assert_eq!(kinds_a, kinds_b);
        assert_eq!(
            kinds_a[0],
            vec![
                SliceType::HelpMove,
                SliceType::CirceRebirth,
                SliceType::ChameleonPromotion,
                SliceType::ChameleonChanger,
            ]
        );
    }
}
