//! Rank orders and order-driven slice insertion.
//!
//! A rank order lists slice types in the order they appear in a branch. A
//! prototype is inserted before the first slice (walking `next` from the
//! insertion point) whose rank exceeds its own. Orders are cyclic: ranks are
//! searched from the current base and wrap around, so a battle branch's
//! attack and defense halves each find their own copy of a duplicated type.

use tracing::trace;

use crate::stipulation::slice::{Slice, SliceIndex, SliceType, Slices, Structure, NO_SLICE};

use SliceType as T;

/// Attack half followed by defense half of a battle branch.
pub const BATTLE_ORDER: &[SliceType] = &[
    T::AttackAdapter,
    T::ReadyForAttack,
    T::MinLengthOptimiser,
    T::ReflexAttackerFilter,
    T::AttackHashed,
    T::ThreatEnforcer,
    T::DeadEnd,
    T::AttackFindShortest,
    T::AttackMoveGenerator,
    T::MessignyMoveGenerator,
    T::AttackMove,
    T::CirceRebirth,
    T::AnticirceRebirth,
    T::SupercirceRebirth,
    T::AndernachSideChanger,
    T::ChameleonPromotion,
    T::ChameleonChanger,
    T::HaanHoleInserter,
    T::SelfCheckGuard,
    T::MaxTimeGuard,
    T::MaxSolutionsGuard,
    T::RestartGuard,
    T::KeyWriter,
    T::ThreatCollector,
    T::KeepMatingFilter,
    T::EndOfBranchGoal,
    T::ReadyForDefense,
    T::ReflexDefenderFilter,
    T::MaxThreatLength,
    T::ThreatSolver,
    T::DeadEnd,
    T::DefenseMoveGenerator,
    T::MessignyMoveGenerator,
    T::DefenseMove,
    T::CirceRebirth,
    T::AnticirceRebirth,
    T::SupercirceRebirth,
    T::AndernachSideChanger,
    T::ChameleonPromotion,
    T::ChameleonChanger,
    T::HaanHoleInserter,
    T::SelfCheckGuard,
    T::MaxTimeGuard,
    T::VariationWriter,
    T::KeepMatingFilter,
    T::EndOfBranchForced,
];

pub const HELP_ORDER: &[SliceType] = &[
    T::HelpAdapter,
    T::SetplayFork,
    T::IntelligentFilter,
    T::HelpFindShortest,
    T::ReadyForHelpMove,
    T::HelpHashed,
    T::HelpMoveGenerator,
    T::MessignyMoveGenerator,
    T::HelpMove,
    T::CirceRebirth,
    T::AnticirceRebirth,
    T::SupercirceRebirth,
    T::AndernachSideChanger,
    T::ChameleonPromotion,
    T::ChameleonChanger,
    T::HaanHoleInserter,
    T::SelfCheckGuard,
    T::MaxTimeGuard,
    T::MaxSolutionsGuard,
    T::RestartGuard,
    T::KeepMatingFilter,
    T::GoalReachableGuard,
    T::ForkOnRemaining,
];

/// Goal branches: a proxy head, writers, then the goal expression.
pub const GOAL_ORDER: &[SliceType] = &[
    T::Proxy,
    T::IntelligentDuplicateAvoider,
    T::SolutionWriter,
    T::GoalReachedTester,
    T::True,
];

/// Rank of `kind` in `order`, searching cyclically from `base`.
///
/// The returned rank is `>= base`; `None` if the type is not in the order.
pub fn get_slice_rank(order: &[SliceType], kind: SliceType, base: usize) -> Option<usize> {
    let len = order.len();
    (0..len).find_map(|i| (order[(base + i) % len] == kind).then_some(base + i))
}

/// Rank used for a slice met during insertion: goal expression operators
/// share the rank of the goal tester.
fn rank_kind(kind: SliceType) -> SliceType {
    match kind {
        T::And | T::Or | T::Not => T::GoalReachedTester,
        other => other,
    }
}

/// Pick the order that knows `kind` (battle, then help, then goal).
pub fn order_for(kind: SliceType) -> &'static [SliceType] {
    let kind = rank_kind(kind);
    if kind.is_move() {
        return if kind == T::HelpMove {
            HELP_ORDER
        } else {
            BATTLE_ORDER
        };
    }
    [BATTLE_ORDER, HELP_ORDER, GOAL_ORDER]
        .into_iter()
        .find(|order| order.contains(&kind))
        .unwrap_or(GOAL_ORDER)
}

struct Insertion<'p> {
    order: &'static [SliceType],
    prototypes: &'p [Slice],
    start: SliceIndex,
}

/// Insert copies of `prototypes` into the branch starting at `si`.
///
/// Prototypes must be listed in rank order.
pub fn insert_slices(slices: &mut Slices, si: SliceIndex, prototypes: &[Slice]) {
    if prototypes.is_empty() {
        return;
    }
    let order = order_for(slices[si].kind);
    let Some(base) = get_slice_rank(order, rank_kind(slices[si].kind), 0) else {
        insert_before_all(slices, si, prototypes);
        return;
    };
    let ins = Insertion {
        order,
        prototypes,
        start: si,
    };
    let mut visited = Vec::new();
    insert_beyond(slices, si, &ins, base, 0, &mut visited);
}

/// Insertion point has no rank: just put the prototypes right after it.
fn insert_before_all(slices: &mut Slices, si: SliceIndex, prototypes: &[Slice]) {
    let mut pos = si;
    for proto in prototypes {
        let new = slices.alloc(proto.clone());
        slices.pipe_append(pos, new);
        pos = new;
    }
}

fn insert_beyond(
    slices: &mut Slices,
    mut prev: SliceIndex,
    ins: &Insertion<'_>,
    mut base: usize,
    mut next_proto: usize,
    visited: &mut Vec<SliceIndex>,
) {
    while next_proto < ins.prototypes.len() {
        let next = slices[prev].next;
        if next == NO_SLICE {
            for proto in &ins.prototypes[next_proto..] {
                let new = slices.alloc(proto.clone());
                slices.pipe_append(prev, new);
                prev = new;
            }
            return;
        }
        if next == ins.start || visited.contains(&next) {
            return;
        }
        let next_kind = slices[next].kind;
        if next_kind == T::Proxy {
            visited.push(next);
            prev = next;
            continue;
        }

        let proto_kind = ins.prototypes[next_proto].kind;
        let Some(proto_rank) = get_slice_rank(ins.order, proto_kind, base) else {
            trace!(?proto_kind, "prototype has no rank here");
            return;
        };
        let next_rank = get_slice_rank(ins.order, rank_kind(next_kind), base);

        match next_rank {
            Some(next_rank) if proto_rank >= next_rank => {
                if next_kind.structure() == Structure::Binary && proto_rank > next_rank {
                    // descend into both operands with fresh copies
                    let (op1, op2) = (slices[next].op1(), slices[next].op2());
                    for op in [op1, op2] {
                        let head = proxy_before(slices, next, op);
                        insert_beyond(slices, head, ins, next_rank, next_proto, visited);
                    }
                    return;
                }
                visited.push(next);
                prev = next;
                base = next_rank;
            }
            _ => {
                trace!(?proto_kind, ?next_kind, "insert slice");
                let new = slices.alloc(ins.prototypes[next_proto].clone());
                slices.pipe_insert_before(prev, next, new);
                prev = new;
                base = proto_rank;
                next_proto += 1;
            }
        }
    }
}

/// Make sure operand `op` of binary slice `bin` is headed by a proxy we can insert after.
fn proxy_before(slices: &mut Slices, bin: SliceIndex, op: SliceIndex) -> SliceIndex {
    if slices[op].kind == T::Proxy {
        return op;
    }
    let proxy = slices.alloc_pipe(T::Proxy);
    slices[proxy].next = op;
    slices[proxy].prev = bin;
    if slices[bin].next == op {
        slices[bin].next = proxy;
    } else {
        slices[bin].fork = proxy;
    }
    if slices[op].prev == bin {
        slices[op].prev = proxy;
    }
    proxy
}

/// Remove every reachable slice of type `kind`; all preds are redirected.
pub fn remove_slices(slices: &mut Slices, root: SliceIndex, kind: SliceType) -> usize {
    assert_ne!(slices[root].kind, kind, "cannot remove the root slice");
    let reachable = slices.reachable(root);
    let skip = |slices: &Slices, mut si: SliceIndex| {
        let mut hops = 0;
        while si != NO_SLICE && slices[si].kind == kind && hops <= reachable.len() {
            si = slices[si].next;
            hops += 1;
        }
        si
    };
    for &si in &reachable {
        if slices[si].kind == kind {
            continue;
        }
        let next = skip(slices, slices[si].next);
        slices[si].next = next;
        let fork = slices[si].fork;
        if fork != NO_SLICE {
            let fork = skip(slices, fork);
            slices[si].fork = fork;
        }
    }
    let mut removed = 0;
    for &si in &reachable {
        if slices.contains(si) && slices[si].kind == kind {
            slices.dealloc(si);
            removed += 1;
        }
    }
    for &si in &reachable {
        if slices.contains(si) {
            let next = slices[si].next;
            if next != NO_SLICE && !slices.contains(slices[next].prev) {
                slices[next].prev = si;
            }
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_are_cyclic_and_skip_to_the_next_copy() {
        let first = get_slice_rank(BATTLE_ORDER, T::SelfCheckGuard, 0).unwrap();
        let second = get_slice_rank(BATTLE_ORDER, T::SelfCheckGuard, first + 1).unwrap();
        assert!(second > first);
        assert_eq!(BATTLE_ORDER[second % BATTLE_ORDER.len()], T::SelfCheckGuard);
        let wrapped = get_slice_rank(BATTLE_ORDER, T::ReadyForAttack, second).unwrap();
        assert!(wrapped > BATTLE_ORDER.len());
    }

    #[test]
    fn insertion_lands_between_move_and_guard() {
        let mut slices = Slices::new();
        let mv = slices.alloc_pipe(T::HelpMove);
        let guard = slices.alloc_pipe(T::SelfCheckGuard);
        slices.link(mv, guard);
        let fork = slices.alloc_fork(T::ForkOnRemaining, NO_SLICE);
        slices.link(guard, fork);

        insert_slices(&mut slices, mv, &[Slice::new(T::ChameleonChanger)]);
        insert_slices(&mut slices, mv, &[Slice::new(T::CirceRebirth)]);
        assert_eq!(
            slices.kinds_along(mv),
            vec![
                T::HelpMove,
                T::CirceRebirth,
                T::ChameleonChanger,
                T::SelfCheckGuard,
                T::ForkOnRemaining
            ]
        );
    }

    #[test]
    fn removal_redirects_every_pred() {
        let mut slices = Slices::new();
        let a = slices.alloc_pipe(T::Proxy);
        let g = slices.alloc_pipe(T::MaxTimeGuard);
        let b = slices.alloc_pipe(T::SelfCheckGuard);
        slices.link(a, g);
        slices.link(g, b);
        slices.set_next(b, g);
        assert_eq!(remove_slices(&mut slices, a, T::MaxTimeGuard), 1);
        assert_eq!(slices[a].next, b);
        assert_eq!(slices[b].next, b);
    }
}
