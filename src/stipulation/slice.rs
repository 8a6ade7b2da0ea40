//! Slice types and the index-based slice arena.
//!
//! Slices are addressed by [`SliceIndex`] handles into a flat table. Every
//! slice has a `next` successor (binary slices: operand 1) and an optional
//! `fork` (binary slices: operand 2). Pred links (`prev`) are kept for the
//! first predecessor only; a loop-back edge (end of a battle or help branch)
//! does not overwrite it.

use std::ops::{Index, IndexMut};

use crate::core::piece::Side;
use crate::solving::length::Length;
use crate::stipulation::goal::Goal;

pub type SliceIndex = usize;

/// "No slice" handle.
pub const NO_SLICE: SliceIndex = usize::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SliceType {
    Proxy,

    AttackAdapter,
    HelpAdapter,
    ReadyForAttack,
    ReadyForDefense,
    ReadyForHelpMove,
    MinLengthOptimiser,
    AttackFindShortest,
    HelpFindShortest,
    DeadEnd,

    AttackMoveGenerator,
    DefenseMoveGenerator,
    HelpMoveGenerator,
    MessignyMoveGenerator,
    AttackMove,
    DefenseMove,
    HelpMove,

    SelfCheckGuard,
    EndOfBranchGoal,
    EndOfBranchForced,
    ReflexAttackerFilter,
    ReflexDefenderFilter,
    ForkOnRemaining,
    SetplayFork,

    GoalReachedTester,
    True,
    And,
    Or,
    Not,
    Reciprocal,
    Quodlibet,

    KeyWriter,
    SolutionWriter,
    VariationWriter,
    MaxSolutionsGuard,
    MaxTimeGuard,
    RestartGuard,

    ThreatSolver,
    ThreatEnforcer,
    ThreatCollector,
    MaxThreatLength,
    KeepMatingFilter,
    AttackHashed,
    HelpHashed,

    CirceRebirth,
    AnticirceRebirth,
    SupercirceRebirth,
    ChameleonChanger,
    ChameleonPromotion,
    AndernachSideChanger,
    HaanHoleInserter,

    IntelligentFilter,
    GoalReachableGuard,
    IntelligentDuplicateAvoider,
}

impl SliceType {
    /// Number of variants (size of per-type tables).
    pub const COUNT: usize = SliceType::IntelligentDuplicateAvoider as usize + 1;

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn structure(self) -> Structure {
        use SliceType::*;
        match self {
            True => Structure::Leaf,
            AttackAdapter | HelpAdapter | ReadyForAttack | ReadyForDefense
            | ReadyForHelpMove | MinLengthOptimiser | AttackFindShortest | HelpFindShortest => {
                Structure::Branch
            }
            EndOfBranchGoal | EndOfBranchForced | ReflexAttackerFilter | ReflexDefenderFilter
            | ForkOnRemaining | SetplayFork | GoalReachedTester | ThreatSolver
            | MaxThreatLength => Structure::Fork,
            And | Or | Reciprocal | Quodlibet => Structure::Binary,
            _ => Structure::Pipe,
        }
    }

    #[inline]
    pub fn is_move(self) -> bool {
        matches!(
            self,
            SliceType::AttackMove | SliceType::DefenseMove | SliceType::HelpMove
        )
    }
}

/// Structural class of a slice type: how many successors it has.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Structure {
    Leaf,
    Pipe,
    /// A pipe carrying branch length bounds.
    Branch,
    Fork,
    Binary,
}

/// Type-specific slice state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload {
    None,
    Goal(Goal),
    /// The side a filter watches (keep-mating).
    Side(Side),
    /// A length threshold (fork-on-remaining, max threat length).
    Threshold(Length),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slice {
    pub kind: SliceType,
    pub starter: Option<Side>,
    pub prev: SliceIndex,
    pub next: SliceIndex,
    pub fork: SliceIndex,
    pub length: Length,
    pub min_length: Length,
    pub payload: Payload,
}

impl Slice {
    pub fn new(kind: SliceType) -> Self {
        Self {
            kind,
            starter: None,
            prev: NO_SLICE,
            next: NO_SLICE,
            fork: NO_SLICE,
            length: 0,
            min_length: 0,
            payload: Payload::None,
        }
    }

    pub fn branch(kind: SliceType, length: Length, min_length: Length) -> Self {
        Self {
            length,
            min_length,
            ..Self::new(kind)
        }
    }

    pub fn with_payload(kind: SliceType, payload: Payload) -> Self {
        Self {
            payload,
            ..Self::new(kind)
        }
    }

    /// First operand of a binary slice.
    #[inline]
    pub fn op1(&self) -> SliceIndex {
        debug_assert_eq!(self.kind.structure(), Structure::Binary);
        self.next
    }

    /// Second operand of a binary slice.
    #[inline]
    pub fn op2(&self) -> SliceIndex {
        debug_assert_eq!(self.kind.structure(), Structure::Binary);
        self.fork
    }

    pub fn goal(&self) -> Option<Goal> {
        match self.payload {
            Payload::Goal(g) => Some(g),
            _ => None,
        }
    }

    pub fn threshold(&self) -> Length {
        match self.payload {
            Payload::Threshold(t) => t,
            _ => 0,
        }
    }
}

/// The slice arena.
#[derive(Debug, Clone, Default)]
pub struct Slices {
    slots: Vec<Option<Slice>>,
    free: Vec<SliceIndex>,
}

impl Slices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, slice: Slice) -> SliceIndex {
        if let Some(si) = self.free.pop() {
            self.slots[si] = Some(slice);
            si
        } else {
            self.slots.push(Some(slice));
            self.slots.len() - 1
        }
    }

    pub fn alloc_pipe(&mut self, kind: SliceType) -> SliceIndex {
        debug_assert!(matches!(
            kind.structure(),
            Structure::Pipe | Structure::Leaf
        ));
        self.alloc(Slice::new(kind))
    }

    pub fn alloc_branch(&mut self, kind: SliceType, length: Length, min_length: Length) -> SliceIndex {
        debug_assert_eq!(kind.structure(), Structure::Branch);
        self.alloc(Slice::branch(kind, length, min_length))
    }

    pub fn alloc_fork(&mut self, kind: SliceType, fork: SliceIndex) -> SliceIndex {
        debug_assert_eq!(kind.structure(), Structure::Fork);
        let si = self.alloc(Slice::new(kind));
        self[si].fork = fork;
        si
    }

    pub fn alloc_binary(&mut self, kind: SliceType, op1: SliceIndex, op2: SliceIndex) -> SliceIndex {
        debug_assert_eq!(kind.structure(), Structure::Binary);
        let si = self.alloc(Slice::new(kind));
        self.link(si, op1);
        self[si].fork = op2;
        if op2 != NO_SLICE && self[op2].prev == NO_SLICE {
            self[op2].prev = si;
        }
        si
    }

    pub fn dealloc(&mut self, si: SliceIndex) {
        assert!(self.slots[si].is_some(), "double dealloc of slice {si}");
        self.slots[si] = None;
        self.free.push(si);
    }

    #[inline]
    pub fn contains(&self, si: SliceIndex) -> bool {
        si != NO_SLICE && self.slots.get(si).is_some_and(Option::is_some)
    }

    pub fn get(&self, si: SliceIndex) -> Option<&Slice> {
        self.slots.get(si).and_then(Option::as_ref)
    }

    /// Number of live slices.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make `succ` the successor of `si`; `succ` adopts `si` as its pred if it has none.
    pub fn link(&mut self, si: SliceIndex, succ: SliceIndex) {
        self[si].next = succ;
        if succ != NO_SLICE && self[succ].prev == NO_SLICE {
            self[succ].prev = si;
        }
    }

    /// Set the successor without touching `succ`'s pred (loop-back edges).
    #[inline]
    pub fn set_next(&mut self, si: SliceIndex, succ: SliceIndex) {
        self[si].next = succ;
    }

    /// Insert `new` right after `pos`.
    pub fn pipe_append(&mut self, pos: SliceIndex, new: SliceIndex) {
        let next = self[pos].next;
        self[new].next = next;
        if next != NO_SLICE && self[next].prev == pos {
            self[next].prev = new;
        }
        self[pos].next = new;
        self[new].prev = pos;
    }

    /// Insert `new` right before `pos`, redirecting `pos`'s pred.
    pub fn pipe_insert_before(&mut self, pred: SliceIndex, pos: SliceIndex, new: SliceIndex) {
        debug_assert_eq!(self[pred].next, pos);
        self.pipe_append(pred, new);
        debug_assert_eq!(self[new].next, pos);
    }

    /// Detach `si` from its pred, which then points to `si`'s successor.
    /// `si` itself is left allocated and unlinked.
    pub fn pipe_unlink(&mut self, si: SliceIndex) {
        let prev = self[si].prev;
        let next = self[si].next;
        if prev != NO_SLICE {
            if self[prev].next == si {
                self[prev].next = next;
            }
            if self[prev].fork == si {
                self[prev].fork = next;
            }
        }
        if next != NO_SLICE && self[next].prev == si {
            self[next].prev = prev;
        }
        self[si].prev = NO_SLICE;
        self[si].next = NO_SLICE;
    }

    pub fn pipe_remove(&mut self, si: SliceIndex) {
        self.pipe_unlink(si);
        self.dealloc(si);
    }

    /// Shallow copy: same type and payload, unlinked.
    pub fn copy_slice(&mut self, si: SliceIndex) -> SliceIndex {
        let mut copy = self[si].clone();
        copy.prev = NO_SLICE;
        copy.next = NO_SLICE;
        copy.fork = NO_SLICE;
        self.alloc(copy)
    }

    /// Successor edges of `si` (next, then fork).
    pub fn successors(&self, si: SliceIndex) -> impl Iterator<Item = SliceIndex> + '_ {
        let s = &self[si];
        [s.next, s.fork].into_iter().filter(|&x| x != NO_SLICE)
    }

    /// Slices reachable from `root`, in depth-first preorder (next before fork).
    pub fn reachable(&self, root: SliceIndex) -> Vec<SliceIndex> {
        let mut seen = vec![false; self.slots.len()];
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(si) = stack.pop() {
            if si == NO_SLICE || seen[si] {
                continue;
            }
            seen[si] = true;
            order.push(si);
            let s = &self[si];
            if s.fork != NO_SLICE {
                stack.push(s.fork);
            }
            if s.next != NO_SLICE {
                stack.push(s.next);
            }
        }
        order
    }

    /// Free every slice not reachable from `root`.
    pub fn dealloc_unreachable(&mut self, root: SliceIndex) -> usize {
        let mut keep = vec![false; self.slots.len()];
        for si in self.reachable(root) {
            keep[si] = true;
        }
        let mut freed = 0;
        for si in 0..self.slots.len() {
            if self.slots[si].is_some() && !keep[si] {
                self.dealloc(si);
                freed += 1;
            }
        }
        freed
    }

    /// The kinds met along `next` edges from `start`, stopping at a loop or a leaf.
    pub fn kinds_along(&self, start: SliceIndex) -> Vec<SliceType> {
        let mut out = Vec::new();
        let mut seen = Vec::new();
        let mut si = start;
        while si != NO_SLICE && !seen.contains(&si) {
            seen.push(si);
            out.push(self[si].kind);
            si = self[si].next;
        }
        out
    }
}

impl Index<SliceIndex> for Slices {
    type Output = Slice;

    #[inline]
    fn index(&self, si: SliceIndex) -> &Slice {
        match self.slots.get(si) {
            Some(Some(s)) => s,
            _ => panic!("dangling slice index {si}"),
        }
    }
}

impl IndexMut<SliceIndex> for Slices {
    #[inline]
    fn index_mut(&mut self, si: SliceIndex) -> &mut Slice {
        match self.slots.get_mut(si) {
            Some(Some(s)) => s,
            _ => panic!("dangling slice index {si}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_and_remove_keep_links_consistent() {
        let mut slices = Slices::new();
        let a = slices.alloc_pipe(SliceType::Proxy);
        let c = slices.alloc_pipe(SliceType::True);
        slices.link(a, c);
        let b = slices.alloc_pipe(SliceType::SelfCheckGuard);
        slices.pipe_append(a, b);
        assert_eq!(slices.kinds_along(a), vec![SliceType::Proxy, SliceType::SelfCheckGuard, SliceType::True]);
        assert_eq!(slices[c].prev, b);

        slices.pipe_remove(b);
        assert_eq!(slices[a].next, c);
        assert_eq!(slices[c].prev, a);
        assert_eq!(slices.len(), 2);
        // freed slot is reused
        let d = slices.alloc_pipe(SliceType::Proxy);
        assert_eq!(d, b);
    }

    #[test]
    fn unreachable_slices_are_collected() {
        let mut slices = Slices::new();
        let root = slices.alloc_pipe(SliceType::Proxy);
        let leaf = slices.alloc_pipe(SliceType::True);
        slices.link(root, leaf);
        let orphan = slices.alloc_pipe(SliceType::DeadEnd);
        assert_eq!(slices.dealloc_unreachable(root), 1);
        assert!(!slices.contains(orphan));
        assert!(slices.contains(leaf));
    }

    #[test]
    fn copies_are_detached() {
        let mut slices = Slices::new();
        let a = slices.alloc_pipe(SliceType::Proxy);
        let b = slices.alloc_pipe(SliceType::True);
        slices.link(a, b);
        slices[a].length = 7;
        let c = slices.copy_slice(a);
        assert_ne!(c, a);
        assert_eq!(slices[c].kind, SliceType::Proxy);
        assert_eq!(slices[c].length, 7);
        assert_eq!(slices[c].next, NO_SLICE);
        assert_eq!(slices[a].next, b);
    }
}
