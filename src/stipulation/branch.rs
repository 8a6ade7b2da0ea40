//! Branch templates.
//!
//! Battle branch (one attack/defense cycle, looping back):
//! ```text
//! AttackAdapter -> ReadyForAttack -> DeadEnd -> AttackFindShortest -> AttackMoveGenerator
//!   -> AttackMove -> SelfCheckGuard -> EndOfBranchGoal(goal) -> ReadyForDefense -> DeadEnd
//!   -> DefenseMoveGenerator -> DefenseMove -> SelfCheckGuard -> (ReadyForAttack)
//! ```
//! A `MinLengthOptimiser` follows `ReadyForAttack` when the minimum length
//! exceeds one half-move.
//!
//! Self and reflex branches move the goal behind the defense:
//! ```text
//! ... AttackMove -> SelfCheckGuard -> ReadyForDefense -> [ReflexDefenderFilter] -> DeadEnd
//!   -> DefenseMoveGenerator -> DefenseMove -> SelfCheckGuard -> EndOfBranchForced(goal)
//!   -> (ReadyForAttack -> [ReflexAttackerFilter] -> ...)
//! ```
//! The reflex filters fork into a one-move branch asking whether the side to
//! move can reach the goal at once.
//!
//! Help branch (two half-moves, looping back):
//! ```text
//! HelpAdapter -> [HelpFindShortest] -> ReadyForHelpMove -> HelpMoveGenerator -> HelpMove
//!   -> SelfCheckGuard -> ForkOnRemaining(goal) -> ReadyForHelpMove -> ... -> (first ReadyForHelpMove)
//! ```
//! Goal branches are a proxy head in front of the goal expression; each fork
//! point gets its own copy so that starters stay static.

use crate::solving::length::{Length, SLACK_LENGTH};
use crate::stipulation::goal::GoalExpr;
use crate::stipulation::slice::{Payload, Slice, SliceIndex, SliceType, Slices};

/// Build a chain of pipe slices linked in order; returns (first, last).
fn chain(slices: &mut Slices, kinds: &[SliceType]) -> (SliceIndex, SliceIndex) {
    let first = slices.alloc_pipe(kinds[0]);
    let mut last = first;
    for &kind in &kinds[1..] {
        let si = slices.alloc_pipe(kind);
        slices.link(last, si);
        last = si;
    }
    (first, last)
}

/// Moves of the side to move, tested for legality only.
fn alloc_immobility_branch(slices: &mut Slices) -> SliceIndex {
    let (first, last) = chain(
        slices,
        &[
            SliceType::HelpMoveGenerator,
            SliceType::HelpMove,
            SliceType::SelfCheckGuard,
        ],
    );
    let leaf = slices.alloc_pipe(SliceType::True);
    slices.link(last, leaf);
    first
}

fn alloc_goal_expr(slices: &mut Slices, expr: &GoalExpr, leaf: SliceIndex) -> SliceIndex {
    match expr {
        GoalExpr::Goal(goal) => {
            let tester = slices.alloc(Slice::with_payload(
                SliceType::GoalReachedTester,
                Payload::Goal(*goal),
            ));
            if goal.needs_immobility_test() {
                let immobility = alloc_immobility_branch(slices);
                slices[tester].fork = immobility;
                slices[immobility].prev = tester;
            }
            slices.link(tester, leaf);
            tester
        }
        GoalExpr::And(a, b) | GoalExpr::Or(a, b) => {
            let op1 = alloc_goal_expr(slices, a, leaf);
            let op2 = alloc_goal_expr(slices, b, leaf);
            let kind = if matches!(expr, GoalExpr::And(..)) {
                SliceType::And
            } else {
                SliceType::Or
            };
            slices.alloc_binary(kind, op1, op2)
        }
        GoalExpr::Not(a) => {
            let not = slices.alloc_pipe(SliceType::Not);
            let inner = alloc_goal_expr(slices, a, leaf);
            slices.link(not, inner);
            not
        }
    }
}

/// A goal branch: proxy head, goal expression, shared `True` leaf.
pub fn alloc_goal_branch(slices: &mut Slices, expr: &GoalExpr) -> SliceIndex {
    let head = slices.alloc_pipe(SliceType::Proxy);
    let leaf = slices.alloc_pipe(SliceType::True);
    let expr = alloc_goal_expr(slices, expr, leaf);
    slices.link(head, expr);
    head
}

/// A battle branch of `length` (encoded) solving `goal`; returns the adapter.
pub fn alloc_battle_branch(
    slices: &mut Slices,
    length: Length,
    min_length: Length,
    goal: &GoalExpr,
) -> SliceIndex {
    let defense_length = length.saturating_sub(1).max(SLACK_LENGTH);
    let defense_min = min_length.saturating_sub(1).max(SLACK_LENGTH);

    let adapter = slices.alloc_branch(SliceType::AttackAdapter, length, min_length);
    let ready = slices.alloc_branch(SliceType::ReadyForAttack, length, min_length);
    let shortest = slices.alloc_branch(SliceType::AttackFindShortest, length, min_length);
    let (attack_first, attack_last) = chain(
        slices,
        &[
            SliceType::AttackMoveGenerator,
            SliceType::AttackMove,
            SliceType::SelfCheckGuard,
        ],
    );
    let attack_dead_end = slices.alloc_pipe(SliceType::DeadEnd);
    slices.link(adapter, ready);
    slices.link(ready, attack_dead_end);
    slices.link(attack_dead_end, shortest);
    slices.link(shortest, attack_first);
    if min_length > SLACK_LENGTH + 1 {
        let optimiser = slices.alloc_branch(SliceType::MinLengthOptimiser, length, min_length);
        slices.pipe_append(ready, optimiser);
    }

    let goal_branch = alloc_goal_branch(slices, goal);
    let end = slices.alloc_fork(SliceType::EndOfBranchGoal, goal_branch);
    slices[goal_branch].prev = end;
    slices.link(attack_last, end);

    let defense = slices.alloc_branch(SliceType::ReadyForDefense, defense_length, defense_min);
    let (defense_first, defense_last) = chain(
        slices,
        &[
            SliceType::DeadEnd,
            SliceType::DefenseMoveGenerator,
            SliceType::DefenseMove,
            SliceType::SelfCheckGuard,
        ],
    );
    slices.link(end, defense);
    slices.link(defense, defense_first);
    slices.set_next(defense_last, ready);
    adapter
}

/// Can the side to move reach `goal` with its next move?
fn alloc_goal_in_one(slices: &mut Slices, goal: &GoalExpr) -> SliceIndex {
    let (first, last) = chain(
        slices,
        &[
            SliceType::HelpMoveGenerator,
            SliceType::HelpMove,
            SliceType::SelfCheckGuard,
        ],
    );
    let goal_branch = alloc_goal_branch(slices, goal);
    slices.link(last, goal_branch);
    first
}

fn alloc_reflex_filter(slices: &mut Slices, kind: SliceType, goal: &GoalExpr) -> SliceIndex {
    let avoided = alloc_goal_in_one(slices, goal);
    let filter = slices.alloc_fork(kind, avoided);
    slices[avoided].prev = filter;
    filter
}

/// A self (or, with `reflex`, reflex) branch of `length` (encoded) in which
/// the defender is forced to reach `goal`; returns the adapter.
pub fn alloc_self_branch(
    slices: &mut Slices,
    length: Length,
    min_length: Length,
    goal: &GoalExpr,
    reflex: bool,
) -> SliceIndex {
    let defense_length = length.saturating_sub(1).max(SLACK_LENGTH);
    let defense_min = min_length.saturating_sub(1).max(SLACK_LENGTH);

    let adapter = slices.alloc_branch(SliceType::AttackAdapter, length, min_length);
    let ready = slices.alloc_branch(SliceType::ReadyForAttack, length, min_length);
    let shortest = slices.alloc_branch(SliceType::AttackFindShortest, length, min_length);
    let (attack_first, attack_last) = chain(
        slices,
        &[
            SliceType::AttackMoveGenerator,
            SliceType::AttackMove,
            SliceType::SelfCheckGuard,
        ],
    );
    let attack_dead_end = slices.alloc_pipe(SliceType::DeadEnd);
    slices.link(adapter, ready);
    slices.link(ready, attack_dead_end);
    slices.link(attack_dead_end, shortest);
    slices.link(shortest, attack_first);
    if reflex {
        let filter = alloc_reflex_filter(slices, SliceType::ReflexAttackerFilter, goal);
        slices.pipe_append(ready, filter);
    }
    if min_length > SLACK_LENGTH + 2 {
        let optimiser = slices.alloc_branch(SliceType::MinLengthOptimiser, length, min_length);
        slices.pipe_append(ready, optimiser);
    }

    let defense = slices.alloc_branch(SliceType::ReadyForDefense, defense_length, defense_min);
    let (defense_first, defense_last) = chain(
        slices,
        &[
            SliceType::DeadEnd,
            SliceType::DefenseMoveGenerator,
            SliceType::DefenseMove,
            SliceType::SelfCheckGuard,
        ],
    );
    slices.link(attack_last, defense);
    slices.link(defense, defense_first);
    if reflex {
        let filter = alloc_reflex_filter(slices, SliceType::ReflexDefenderFilter, goal);
        slices.pipe_append(defense, filter);
    }

    let goal_branch = alloc_goal_branch(slices, goal);
    let end = slices.alloc_fork(SliceType::EndOfBranchForced, goal_branch);
    slices[goal_branch].prev = end;
    slices.link(defense_last, end);
    slices.set_next(end, ready);
    adapter
}

/// A help branch of `length` (encoded) solving `goal`; returns the adapter.
pub fn alloc_help_branch(
    slices: &mut Slices,
    length: Length,
    min_length: Length,
    goal: &GoalExpr,
) -> SliceIndex {
    let adapter = slices.alloc_branch(SliceType::HelpAdapter, length, min_length);
    let mut last = adapter;
    if min_length < length {
        let shortest = slices.alloc_branch(SliceType::HelpFindShortest, length, min_length);
        slices.link(last, shortest);
        last = shortest;
    }

    let mut first_ready = None;
    for half in 0..2 {
        let ready = slices.alloc_branch(
            SliceType::ReadyForHelpMove,
            length.saturating_sub(half).max(SLACK_LENGTH),
            min_length.saturating_sub(half).max(SLACK_LENGTH),
        );
        first_ready.get_or_insert(ready);
        let (move_first, move_last) = chain(
            slices,
            &[
                SliceType::HelpMoveGenerator,
                SliceType::HelpMove,
                SliceType::SelfCheckGuard,
            ],
        );
        let goal_branch = alloc_goal_branch(slices, goal);
        let fork = slices.alloc(Slice::with_payload(
            SliceType::ForkOnRemaining,
            Payload::Threshold(0),
        ));
        slices[fork].fork = goal_branch;
        slices[goal_branch].prev = fork;
        slices.link(last, ready);
        slices.link(ready, move_first);
        slices.link(move_last, fork);
        last = fork;
    }
    if let Some(ready) = first_ready {
        slices.set_next(last, ready);
    }
    adapter
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stipulation::goal::Goal;
    use SliceType as T;

    #[test]
    fn battle_branch_loops_back_to_ready_for_attack() {
        let mut slices = Slices::new();
        let adapter = alloc_battle_branch(&mut slices, SLACK_LENGTH + 3, SLACK_LENGTH + 1, &GoalExpr::Goal(Goal::Mate));
        assert_eq!(
            slices.kinds_along(adapter),
            vec![
                T::AttackAdapter,
                T::ReadyForAttack,
                T::DeadEnd,
                T::AttackFindShortest,
                T::AttackMoveGenerator,
                T::AttackMove,
                T::SelfCheckGuard,
                T::EndOfBranchGoal,
                T::ReadyForDefense,
                T::DeadEnd,
                T::DefenseMoveGenerator,
                T::DefenseMove,
                T::SelfCheckGuard,
            ]
        );
    }

    #[test]
    fn reflex_branch_forces_the_goal_after_the_defense() {
        let mut slices = Slices::new();
        let mate = GoalExpr::Goal(Goal::Mate);
        let adapter = alloc_self_branch(&mut slices, SLACK_LENGTH + 4, SLACK_LENGTH + 1, &mate, true);
        assert_eq!(
            slices.kinds_along(adapter),
            vec![
                T::AttackAdapter,
                T::ReadyForAttack,
                T::ReflexAttackerFilter,
                T::DeadEnd,
                T::AttackFindShortest,
                T::AttackMoveGenerator,
                T::AttackMove,
                T::SelfCheckGuard,
                T::ReadyForDefense,
                T::ReflexDefenderFilter,
                T::DeadEnd,
                T::DefenseMoveGenerator,
                T::DefenseMove,
                T::SelfCheckGuard,
                T::EndOfBranchForced,
            ]
        );
        let plain = alloc_self_branch(&mut slices, SLACK_LENGTH + 4, SLACK_LENGTH + 1, &mate, false);
        let kinds = slices.kinds_along(plain);
        assert!(!kinds.contains(&T::ReflexAttackerFilter));
        assert!(!kinds.contains(&T::EndOfBranchGoal));
        assert_eq!(kinds.last(), Some(&T::EndOfBranchForced));
    }

    #[test]
    fn help_branch_has_one_goal_branch_per_half_move() {
        let mut slices = Slices::new();
        let adapter = alloc_help_branch(&mut slices, SLACK_LENGTH + 2, SLACK_LENGTH + 2, &GoalExpr::Goal(Goal::Mate));
        let kinds = slices.kinds_along(adapter);
        assert_eq!(kinds.iter().filter(|&&k| k == T::HelpMove).count(), 2);
        assert_eq!(kinds.iter().filter(|&&k| k == T::ForkOnRemaining).count(), 2);
        assert!(!kinds.contains(&T::HelpFindShortest));
        let testers = crate::stipulation::traversal::find_all(&mut slices, adapter, &[T::GoalReachedTester]);
        assert_eq!(testers.len(), 2);
    }
}
