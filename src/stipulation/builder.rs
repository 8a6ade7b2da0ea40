//! Stipulation -> slice graph.

use tracing::debug;

use crate::core::piece::Side;
use crate::problem::SolveOptions;
use crate::solving::length::{branch_length, Length, SLACK_LENGTH};
use crate::stipulation::branch::{alloc_battle_branch, alloc_help_branch, alloc_self_branch};
use crate::stipulation::slice::{SliceIndex, SliceType, Slices, Structure, NO_SLICE};
use crate::stipulation::traversal::Traversal;
use crate::stipulation::Stipulation;

/// Build the graph for `stip` below a fresh root proxy; returns the root.
///
/// Starters are not imposed yet: instrumentation comes first, then
/// [`impose_starter`].
pub fn build_stipulation(slices: &mut Slices, stip: &Stipulation, options: &SolveOptions) -> SliceIndex {
    let root = slices.alloc_pipe(SliceType::Proxy);
    let main = alloc_stipulation(slices, stip, options, true);
    slices.link(root, main);
    slices[root].length = entry_length(slices, main);
    debug!(%stip, root, slices = slices.len(), "built stipulation");
    root
}

fn alloc_stipulation(slices: &mut Slices, stip: &Stipulation, options: &SolveOptions, top: bool) -> SliceIndex {
    match stip {
        Stipulation::Direct { goal, moves } => {
            let length = branch_length((2 * moves).saturating_sub(1));
            let min_length = options
                .min_length
                .filter(|&m| m >= 1)
                .map(|m| branch_length(2 * m - 1).min(length))
                .unwrap_or(SLACK_LENGTH + 1);
            alloc_battle_branch(slices, length, min_length, goal)
        }
        Stipulation::SelfPlay { goal, moves } | Stipulation::Reflex { goal, moves } => {
            let length = branch_length(2 * moves);
            let min_length = options
                .min_length
                .filter(|&m| m >= 1)
                .map(|m| branch_length(2 * m).min(length))
                .unwrap_or(SLACK_LENGTH + 1);
            let reflex = matches!(stip, Stipulation::Reflex { .. });
            alloc_self_branch(slices, length, min_length, goal, reflex)
        }
        Stipulation::Help { goal, half_moves } => {
            let length = branch_length(*half_moves);
            let min_length = options
                .min_length
                .map(|m| branch_length(2 * m + half_moves % 2).clamp(SLACK_LENGTH + 1, length))
                .unwrap_or(length);
            let adapter = alloc_help_branch(slices, length, min_length, goal);
            if top && options.set_play && length > SLACK_LENGTH + 1 {
                let set_min = min_length.saturating_sub(1).max(SLACK_LENGTH + 1);
                let set_branch = alloc_help_branch(slices, length - 1, set_min, goal);
                let fork = slices.alloc_fork(SliceType::SetplayFork, set_branch);
                slices[set_branch].prev = fork;
                slices.pipe_append(adapter, fork);
            }
            adapter
        }
        Stipulation::Quodlibet(a, b) | Stipulation::Reciprocal(a, b) => {
            let op1 = alloc_stipulation(slices, a, options, false);
            let op2 = alloc_stipulation(slices, b, options, false);
            let kind = if matches!(stip, Stipulation::Quodlibet(..)) {
                SliceType::Quodlibet
            } else {
                SliceType::Reciprocal
            };
            let bin = slices.alloc_binary(kind, op1, op2);
            slices[bin].length = slices[op1].length.max(slices[op2].length);
            bin
        }
    }
}

/// Length a solve call entering at `si` starts with: the first length
/// bound met along `next` edges.
pub fn entry_length(slices: &Slices, mut si: SliceIndex) -> Length {
    let mut hops = 0;
    while si != NO_SLICE && hops <= slices.len() {
        let slice = &slices[si];
        match slice.kind.structure() {
            Structure::Branch | Structure::Binary => return slice.length,
            _ => si = slice.next,
        }
        hops += 1;
    }
    SLACK_LENGTH
}

/// Side starting a branch entered through adapter `si`.
fn adapter_starter(slices: &Slices, si: SliceIndex) -> Option<Side> {
    match slices[si].kind {
        SliceType::AttackAdapter => Some(Side::White),
        SliceType::HelpAdapter => {
            let half_moves = slices[si].length - SLACK_LENGTH;
            Some(if half_moves % 2 == 0 { Side::Black } else { Side::White })
        }
        _ => None,
    }
}

fn impose_on_slice(slices: &mut Slices, si: SliceIndex, t: &mut Traversal<Side>) {
    if let Some(side) = adapter_starter(slices, si) {
        t.state = side;
    }
    slices[si].starter = Some(t.state);
    let saved = t.state;
    let next = slices[si].next;
    if slices[si].kind.is_move() {
        t.state = saved.opponent();
        t.traverse(slices, next);
    } else if slices[si].kind == SliceType::SetplayFork {
        t.traverse(slices, next);
        t.state = saved.opponent();
        t.fork(slices, si);
    } else {
        t.children(slices, si);
    }
    t.state = saved;
}

/// Propagate the side to move through the whole graph.
///
/// Adapters fix their branch's starter; move slices hand the opponent to
/// their successors; everything else inherits.
pub fn impose_starter(slices: &mut Slices, root: SliceIndex, starter: Side) {
    let mut t = Traversal::new(starter);
    for kind in all_kinds() {
        t.override_kind(kind, impose_on_slice);
    }
    t.traverse(slices, root);
}

fn all_kinds() -> impl Iterator<Item = SliceType> {
    use SliceType::*;
    [
        Proxy, AttackAdapter, HelpAdapter, ReadyForAttack, ReadyForDefense, ReadyForHelpMove,
        MinLengthOptimiser, AttackFindShortest, HelpFindShortest, DeadEnd, AttackMoveGenerator,
        DefenseMoveGenerator, HelpMoveGenerator, MessignyMoveGenerator, AttackMove, DefenseMove,
        HelpMove, SelfCheckGuard, EndOfBranchGoal, EndOfBranchForced, ReflexAttackerFilter,
        ReflexDefenderFilter, ForkOnRemaining, SetplayFork,
        GoalReachedTester, True, And, Or, Not, Reciprocal, Quodlibet, KeyWriter, SolutionWriter,
        VariationWriter, MaxSolutionsGuard, MaxTimeGuard, RestartGuard, ThreatSolver, ThreatEnforcer,
        ThreatCollector, MaxThreatLength, KeepMatingFilter, AttackHashed, HelpHashed,
        CirceRebirth, AnticirceRebirth, SupercirceRebirth, ChameleonChanger, ChameleonPromotion,
        AndernachSideChanger, HaanHoleInserter, IntelligentFilter, GoalReachableGuard,
        IntelligentDuplicateAvoider,
    ]
    .into_iter()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stipulation::traversal::find_all;

    fn build(text: &str, options: &SolveOptions) -> (Slices, SliceIndex) {
        let stip: Stipulation = text.parse().unwrap();
        let mut slices = Slices::new();
        let root = build_stipulation(&mut slices, &stip, options);
        impose_starter(&mut slices, root, stip.starter());
        (slices, root)
    }

    #[test]
    fn kind_list_covers_every_slice_type() {
        assert_eq!(all_kinds().count(), SliceType::COUNT);
    }

    #[test]
    fn help_starters_alternate() {
        let (mut slices, root) = build("h#2", &SolveOptions::default());
        assert_eq!(slices[root].length, SLACK_LENGTH + 4);
        let moves = find_all(&mut slices, root, &[SliceType::HelpMove]);
        // main loop: black then white; immobility tests inside the goal branches
        assert_eq!(slices[moves[0]].starter, Some(Side::Black));
        assert_eq!(slices[moves[1]].starter, Some(Side::White));
        let testers = find_all(&mut slices, root, &[SliceType::GoalReachedTester]);
        let sides: Vec<_> = testers.iter().map(|&t| slices[t].starter).collect();
        assert!(sides.contains(&Some(Side::Black)));
        assert!(sides.contains(&Some(Side::White)));
    }

    #[test]
    fn set_play_branch_is_started_by_the_other_side() {
        let options = SolveOptions {
            set_play: true,
            ..SolveOptions::default()
        };
        let (mut slices, root) = build("h#2", &options);
        let fork = find_all(&mut slices, root, &[SliceType::SetplayFork])[0];
        let set_adapter = slices[fork].fork;
        assert_eq!(slices[set_adapter].kind, SliceType::HelpAdapter);
        assert_eq!(slices[set_adapter].length, SLACK_LENGTH + 3);
        assert_eq!(slices[set_adapter].starter, Some(Side::White));
        assert_eq!(slices[fork].starter, Some(Side::Black));
    }

    #[test]
    fn quodlibet_operands_keep_their_own_lengths() {
        let (slices, root) = build("quod(#2,h#1)", &SolveOptions::default());
        let bin = slices[root].next;
        assert_eq!(slices[bin].kind, SliceType::Quodlibet);
        assert_eq!(entry_length(&slices, slices[bin].op1()), SLACK_LENGTH + 3);
        assert_eq!(entry_length(&slices, slices[bin].op2()), SLACK_LENGTH + 2);
        assert_eq!(slices[slices[bin].op2()].starter, Some(Side::Black));
        assert_eq!(slices[root].length, SLACK_LENGTH + 3);
    }

    #[test]
    fn reflex_filters_fork_for_the_side_they_watch() {
        let (mut slices, root) = build("r#2", &SolveOptions::default());
        assert_eq!(slices[root].length, SLACK_LENGTH + 4);
        let attacker = find_all(&mut slices, root, &[SliceType::ReflexAttackerFilter])[0];
        let defender = find_all(&mut slices, root, &[SliceType::ReflexDefenderFilter])[0];
        assert_eq!(slices[attacker].starter, Some(Side::White));
        assert_eq!(slices[defender].starter, Some(Side::Black));
        let generator = slices[defender].fork;
        assert_eq!(slices[generator].kind, SliceType::HelpMoveGenerator);
        assert_eq!(slices[generator].starter, Some(Side::Black));
        // the goal is inflicted on white after black's move
        let forced = find_all(&mut slices, root, &[SliceType::EndOfBranchForced])[0];
        let goal_branch = slices[forced].fork;
        let testers = find_all(&mut slices, goal_branch, &[SliceType::GoalReachedTester]);
        assert_eq!(slices[testers[0]].starter, Some(Side::White));
    }

    #[test]
    fn exact_direct_problems_get_a_min_length_optimiser() {
        let options = SolveOptions {
            min_length: Some(2),
            ..SolveOptions::default()
        };
        let (mut slices, root) = build("#2", &options);
        assert_eq!(find_all(&mut slices, root, &[SliceType::MinLengthOptimiser]).len(), 1);
        let (mut slices, root) = build("#2", &SolveOptions::default());
        assert!(find_all(&mut slices, root, &[SliceType::MinLengthOptimiser]).is_empty());
    }
}
