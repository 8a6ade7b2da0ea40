//! Resource tracking and allocation guards for the solver.
//!
//! Solving explodes combinatorially with length. To avoid hard OOM aborts the
//! solver uses:
//! - counter-based budgets ([`crate::problem::ResourceLimits`])
//! - `try_reserve` wrappers surfacing allocation failures as [`SolveError`]
//!
//! Budgets are approximate but correlate strongly with memory and time used.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::problem::{ResourceCounts, ResourceLimits, SolveError};

/// Budgets and counters of one solve.
#[derive(Debug, Clone)]
pub struct ResourceTracker {
    limits: ResourceLimits,
    counts: ResourceCounts,
}

impl ResourceTracker {
    #[inline]
    pub fn new(limits: ResourceLimits) -> Self {
        Self {
            limits,
            counts: ResourceCounts::default(),
        }
    }

    #[inline]
    pub fn limits(&self) -> &ResourceLimits {
        &self.limits
    }

    #[inline]
    pub fn counts(&self) -> ResourceCounts {
        self.counts
    }

    #[inline]
    pub fn bump_moves_played(&mut self, stage: &'static str) -> Result<(), SolveError> {
        let limit = self.limits.max_moves_played;
        self.bump(stage, "moves_played", 1, limit, |c| &mut c.moves_played)
    }

    #[inline]
    pub fn bump_hash_entries(&mut self, stage: &'static str, delta: usize) -> Result<(), SolveError> {
        let limit = self.limits.max_hash_entries as u64;
        self.bump(stage, "hash_entries", delta as u64, limit, |c| &mut c.hash_entries)
    }

    #[inline]
    pub fn reset_hash_entries(&mut self) {
        self.counts.hash_entries = 0;
    }

    #[inline]
    pub fn bump_constructions(&mut self, stage: &'static str) -> Result<(), SolveError> {
        let limit = self.limits.max_constructions;
        self.bump(stage, "constructions", 1, limit, |c| &mut c.constructions)
    }

    #[inline]
    pub fn bump_steps(&mut self, stage: &'static str) -> Result<(), SolveError> {
        let limit = self.limits.max_runtime_steps;
        self.bump(stage, "runtime_steps", 1, limit, |c| &mut c.runtime_steps)
    }

    fn bump(
        &mut self,
        stage: &'static str,
        metric: &'static str,
        delta: u64,
        limit: u64,
        field: impl FnOnce(&mut ResourceCounts) -> &mut u64,
    ) -> Result<(), SolveError> {
        let observed = {
            let v = field(&mut self.counts);
            *v = v.saturating_add(delta);
            *v
        };

        if observed > limit {
            return Err(SolveError::LimitExceeded {
                stage,
                metric,
                limit,
                observed,
                counts: self.counts,
            });
        }

        Ok(())
    }

    pub fn try_reserve_vec<T>(
        &self,
        stage: &'static str,
        structure: &'static str,
        v: &mut Vec<T>,
        additional: usize,
    ) -> Result<(), SolveError> {
        v.try_reserve(additional)
            .map_err(|_| SolveError::AllocationFailed {
                stage,
                structure,
                counts: self.counts,
            })
    }

    pub fn try_reserve_set<K>(
        &self,
        stage: &'static str,
        structure: &'static str,
        set: &mut FxHashSet<K>,
        additional: usize,
    ) -> Result<(), SolveError>
    where
        K: std::hash::Hash + Eq,
    {
        set.try_reserve(additional)
            .map_err(|_| SolveError::AllocationFailed {
                stage,
                structure,
                counts: self.counts,
            })
    }

    pub fn try_reserve_map<K, V>(
        &self,
        stage: &'static str,
        structure: &'static str,
        map: &mut FxHashMap<K, V>,
        additional: usize,
    ) -> Result<(), SolveError>
    where
        K: std::hash::Hash + Eq,
    {
        map.try_reserve(additional)
            .map_err(|_| SolveError::AllocationFailed {
                stage,
                structure,
                counts: self.counts,
            })
    }
}
