//! The solving context and slice dispatch.
//!
//! A [`Solver`] owns everything one twin's search mutates:
//! - the live [`Position`] and the move-effect [`Journal`]
//! - the frozen slice graph and the per-ply move lists
//! - threat tables, the hash table, post-move iteration and intelligent-mode state
//! - budgets ([`ResourceTracker`]), the max-time deadline and the solution buffer
//!
//! `solve(si, n)` dispatches on the slice type through a [`SolveTable`] built
//! once at construction; slice types without a handler pass straight through
//! to their successor. See [`length`] for the meaning of `n` and of the result.

pub mod battle;
pub mod boolean;
pub mod constraint;
pub mod goals;
pub mod guard;
pub mod guards;
pub mod hash;
pub mod help;
pub mod instrument;
pub mod keepmating;
pub mod length;
pub mod moves;
pub mod post_move;
pub mod resources;
pub mod threat;
pub mod writers;

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::chess::moves::MoveStack;
use crate::conditions::ConditionSet;
use crate::core::piece::Side;
use crate::core::position::Position;
use crate::intelligent::{self, IntelligentState};
use crate::journal::{Journal, Ply};
use crate::problem::{Problem, SolveError, SolveOptions};
use crate::solution::{Solution, SolveReport, TwinReport};
use crate::stipulation::builder::{build_stipulation, impose_starter};
use crate::stipulation::slice::{SliceIndex, SliceType, Slices, NO_SLICE};
use crate::stipulation::Stipulation;

use hash::HashTable;
use length::{Length, SLACK_LENGTH};
use post_move::PostMoveIteration;
use resources::ResourceTracker;
use threat::ThreatTable;
use writers::PostKeyPlay;

/// Ply of the first move of every branch entered from the root.
pub const ROOT_PLY: Ply = 1;

pub type SolveFn = fn(&mut Solver, SliceIndex, Length) -> Length;

/// Per-type solve handlers.
pub struct SolveTable {
    handlers: [Option<SolveFn>; SliceType::COUNT],
}

impl SolveTable {
    pub fn new() -> Self {
        let mut table = Self {
            handlers: [None; SliceType::COUNT],
        };
        moves::register(&mut table);
        battle::register(&mut table);
        help::register(&mut table);
        goals::register(&mut table);
        boolean::register(&mut table);
        constraint::register(&mut table);
        threat::register(&mut table);
        keepmating::register(&mut table);
        guards::register(&mut table);
        hash::register(&mut table);
        writers::register(&mut table);
        crate::conditions::register(&mut table);
        intelligent::register(&mut table);
        table
    }

    pub fn register(&mut self, kind: SliceType, f: SolveFn) {
        debug_assert!(self.handlers[kind.index()].is_none(), "{kind:?} registered twice");
        self.handlers[kind.index()] = Some(f);
    }

    #[inline]
    pub fn get(&self, kind: SliceType) -> Option<SolveFn> {
        self.handlers[kind.index()]
    }
}

impl Default for SolveTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Solve: find and record every solution. Test: answer "is there one?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Solve,
    Test,
}

/// Why solving stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interruption {
    MaxSolutions,
    MaxTime,
    ResourceLimit,
}

pub struct Solver {
    pub position: Position,
    pub journal: Journal,
    pub slices: Slices,
    pub root: SliceIndex,
    pub moves: MoveStack,
    table: SolveTable,
    pub stipulation: Option<Stipulation>,
    pub conditions: ConditionSet,
    pub options: SolveOptions,
    pub mode: Mode,
    pub threats: ThreatTable,
    pub post_move: PostMoveIteration,
    pub hash: HashTable,
    pub intelligent: IntelligentState,
    pub postkey: PostKeyPlay,
    pub solutions: Vec<Solution>,
    pub interrupted: Option<Interruption>,
    limit_error: Option<SolveError>,
    deadline: Option<Instant>,
    pub tracker: ResourceTracker,
    sides: Vec<Side>,
    pub in_set_play: bool,
    /// Results up to this length are known to be impossible for the attacker
    /// about to move (set by the min-length optimiser).
    pub max_unsolvable: Length,
}

impl Default for Solver {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver {
    pub fn new() -> Self {
        Self {
            position: Position::empty(),
            journal: Journal::new(),
            slices: Slices::new(),
            root: NO_SLICE,
            moves: MoveStack::new(),
            table: SolveTable::new(),
            stipulation: None,
            conditions: ConditionSet::default(),
            options: SolveOptions::default(),
            mode: Mode::Solve,
            threats: ThreatTable::default(),
            post_move: PostMoveIteration::new(),
            hash: HashTable::new(0),
            intelligent: IntelligentState::default(),
            postkey: PostKeyPlay::default(),
            solutions: Vec::new(),
            interrupted: None,
            limit_error: None,
            deadline: None,
            tracker: ResourceTracker::new(Default::default()),
            sides: vec![Side::Black],
            in_set_play: false,
            max_unsolvable: SLACK_LENGTH,
        }
    }

    /// Solve slice `si` with `n` (encoded) half-moves available.
    pub fn solve(&mut self, si: SliceIndex, n: Length) -> Length {
        if let Err(err) = self.tracker.bump_steps("solve") {
            self.limit_reached(err);
            return n + 2;
        }
        let kind = self.slices[si].kind;
        trace!(si, ?kind, n, "solve");
        match self.table.get(kind) {
            Some(handler) => handler(self, si, n),
            None => {
                let next = self.slices[si].next;
                self.solve(next, n)
            }
        }
    }

    /// Solve `si`'s successor.
    #[inline]
    pub fn solve_next(&mut self, si: SliceIndex, n: Length) -> Length {
        let next = self.slices[si].next;
        self.solve(next, n)
    }

    /// Solve `si`'s fork.
    #[inline]
    pub fn solve_fork(&mut self, si: SliceIndex, n: Length) -> Length {
        let fork = self.slices[si].fork;
        self.solve(fork, n)
    }

    /// Run `f` in `mode`, restoring the previous mode afterwards.
    pub fn with_mode(&mut self, mode: Mode, f: impl FnOnce(&mut Solver) -> Length) -> Length {
        let saved = std::mem::replace(&mut self.mode, mode);
        let r = f(self);
        self.mode = saved;
        r
    }

    /// Open a ply for `side` to move in.
    pub fn nextply(&mut self, side: Side) -> Ply {
        let ply = self.journal.open_ply();
        self.sides.truncate(ply);
        self.sides.push(side);
        debug_assert_eq!(self.sides.len(), ply + 1);
        ply
    }

    /// Close the current ply.
    pub fn finply(&mut self) {
        let ply = self.journal.current_ply();
        self.moves.clear(ply);
        self.journal.close_ply();
        self.sides.truncate(ply);
    }

    #[inline]
    pub fn current_ply(&self) -> Ply {
        self.journal.current_ply()
    }

    /// Side moving in `ply`.
    #[inline]
    pub fn side_at(&self, ply: Ply) -> Side {
        self.sides[ply]
    }

    /// Side to move at `si`. Every reachable slice has one once
    /// [`Solver::begin_twin`] has succeeded.
    pub fn starter(&self, si: SliceIndex) -> Side {
        debug_assert!(self.slices[si].starter.is_some(), "slice {si} has no starter");
        self.slices[si].starter.unwrap_or(Side::White)
    }

    pub fn interrupt(&mut self, why: Interruption) {
        if self.interrupted.is_none() {
            warn!(?why, solutions = self.solutions.len(), "solving interrupted");
            self.interrupted = Some(why);
        }
    }

    #[inline]
    pub fn is_interrupted(&self) -> bool {
        self.interrupted.is_some()
    }

    /// A budget was exceeded: keep the first error for the report and stop.
    pub fn limit_reached(&mut self, err: SolveError) {
        if self.limit_error.is_none() {
            warn!(%err, "resource limit reached");
            self.limit_error = Some(err);
        }
        self.interrupt(Interruption::ResourceLimit);
    }

    pub fn limit_error(&self) -> Option<&SolveError> {
        self.limit_error.as_ref()
    }

    /// Check the max-time deadline; true if solving must stop.
    pub fn poll_time(&mut self) -> bool {
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                self.interrupt(Interruption::MaxTime);
            }
        }
        self.is_interrupted()
    }

    /// Empty the hash table and its entry count.
    pub fn clear_hash(&mut self) {
        self.hash.clear();
        self.tracker.reset_hash_entries();
    }

    /// Forget everything a previous twin left behind.
    pub fn reset_for_twin(&mut self) {
        self.journal.reset();
        self.moves.reset();
        self.threats.reset();
        self.post_move.reset();
        self.clear_hash();
        self.intelligent = IntelligentState::default();
        self.solutions.clear();
        self.interrupted = None;
        self.limit_error = None;
        self.sides.clear();
        self.sides.push(Side::Black);
        self.in_set_play = false;
        self.max_unsolvable = SLACK_LENGTH;
        self.mode = Mode::Solve;
    }

    /// Load a (twin) problem and assemble its slice graph.
    pub fn begin_twin(&mut self, problem: &Problem) -> Result<(), SolveError> {
        problem.validate()?;
        self.reset_for_twin();
        self.position = problem.position.clone();
        self.conditions = problem.conditions.clone();
        self.options = problem.options.clone();
        if self.options.intelligent && !intelligent::is_supported(&problem.stipulation) {
            warn!(stipulation = %problem.stipulation, "intelligent mode not supported here; solving normally");
            self.options.intelligent = false;
        }
        self.tracker = ResourceTracker::new(problem.limits);
        let capacity = self.options.hash_entries.min(problem.limits.max_hash_entries);
        self.hash = HashTable::new(capacity);
        self.stipulation = Some(problem.stipulation.clone());
        self.deadline = self.options.max_time().map(|d| Instant::now() + d);

        self.slices = Slices::new();
        self.root = build_stipulation(&mut self.slices, &problem.stipulation, &self.options);
        let starter = problem.stipulation.starter();
        impose_starter(&mut self.slices, self.root, starter);
        instrument::instrument(self);
        impose_starter(&mut self.slices, self.root, starter);
        if let Some(si) = self
            .slices
            .reachable(self.root)
            .into_iter()
            .find(|&si| self.slices[si].starter.is_none())
        {
            return Err(SolveError::Structure {
                reason: format!("slice {si} ({:?}) has no starter", self.slices[si].kind),
            });
        }
        debug!(
            problem = %problem.name,
            stipulation = %problem.stipulation,
            slices = self.slices.len(),
            "twin ready"
        );
        Ok(())
    }

    /// Solve the loaded twin from the root.
    pub fn run(&mut self) -> Length {
        let n = self.slices[self.root].length;
        self.mode = Mode::Solve;
        let r = self.solve(self.root, n);
        debug_assert_eq!(self.journal.current_ply(), 0, "plies left open");
        r
    }

    /// Collect the twin's outcome.
    pub fn end_twin(&mut self, label: &str) -> TwinReport {
        let solutions = std::mem::take(&mut self.solutions);
        info!(label, solutions = solutions.len(), "twin solved");
        TwinReport {
            label: label.to_string(),
            stipulation: self
                .stipulation
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            conditions: self.conditions.names(),
            solutions,
            interrupted: self.interrupted,
            counts: self.tracker.counts(),
        }
    }
}

/// Solve a problem and all of its twins.
pub fn solve_problem(problem: &Problem) -> Result<SolveReport, SolveError> {
    let mut solver = Solver::new();
    let mut twins = Vec::with_capacity(problem.twins.len() + 1);

    solver.begin_twin(problem)?;
    solver.run();
    twins.push(solver.end_twin(""));

    for (i, twin) in problem.twins.iter().enumerate() {
        let twinned = problem.twin(i)?;
        solver.begin_twin(&twinned)?;
        solver.run();
        twins.push(solver.end_twin(&twin.label));
    }
    Ok(SolveReport::new(problem.name.clone(), twins))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_executable_slice_type_has_a_handler() {
        let table = SolveTable::new();
        use SliceType::*;
        for kind in [
            AttackMove, DefenseMove, HelpMove, AttackMoveGenerator, DefenseMoveGenerator,
            HelpMoveGenerator, SelfCheckGuard, GoalReachedTester, True, And, Or, Not,
            Quodlibet, Reciprocal, EndOfBranchGoal, ForkOnRemaining, DeadEnd,
        ] {
            assert!(table.get(kind).is_some(), "{kind:?}");
        }
        // pass-through types
        assert!(table.get(Proxy).is_none());
        assert!(table.get(ReadyForAttack).is_none());
    }

    #[test]
    fn every_reachable_slice_gets_a_starter() {
        for (text, intelligent) in [("#2", false), ("s#2", false), ("r=1", false), ("h#2", true)] {
            let mut problem = crate::problems::corner_mate().unwrap();
            problem.stipulation = text.parse().unwrap();
            problem.options.intelligent = intelligent;
            problem.options.set_play = true;
            let mut solver = Solver::new();
            solver.begin_twin(&problem).unwrap();
            let root = solver.root;
            for si in solver.slices.reachable(root) {
                assert!(solver.slices[si].starter.is_some(), "{text}: slice {si}");
                assert_eq!(solver.starter(si), solver.slices[si].starter.unwrap());
            }
        }
    }

    #[test]
    fn plies_record_the_side_to_move() {
        let mut solver = Solver::new();
        let p1 = solver.nextply(Side::White);
        let p2 = solver.nextply(Side::Black);
        assert_eq!((p1, p2), (1, 2));
        assert_eq!(solver.side_at(1), Side::White);
        assert_eq!(solver.side_at(2), Side::Black);
        solver.finply();
        solver.finply();
        assert_eq!(solver.current_ply(), 0);
    }
}
