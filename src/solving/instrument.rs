//! Instrumentation of a freshly built slice graph.
//!
//! Every pass inserts prototypes through the rank orders, so passes compose
//! independently of the order they run in. Starters have already been
//! imposed once; they are imposed again after instrumentation.

use tracing::debug;

use crate::core::piece::Side;
use crate::solving::length::SLACK_LENGTH;
use crate::solving::Solver;
use crate::stipulation::rank::insert_slices;
use crate::stipulation::slice::{Payload, Slice, SliceIndex, SliceType, Slices, NO_SLICE};
use crate::stipulation::traversal::{find_all, Traversal};

use SliceType as T;

/// Run every instrumentation pass the twin's options and conditions ask for.
pub fn instrument(s: &mut Solver) {
    let root = s.root;
    let options = s.options.clone();

    s.conditions.instrument(&mut s.slices, root);

    if !options.no_threat {
        let n = insert_threat_slices(&mut s.slices, root);
        debug!(inserted = n, "threat slices");
    }
    if let Some(max) = options.max_threat_length {
        let n = insert_max_threat_length(&mut s.slices, root, max);
        debug!(inserted = n, max, "max threat length");
    }
    if options.hash_entries > 0 && options.min_length.is_none() {
        let n = insert_hash_slices(&mut s.slices, root, !options.intelligent);
        debug!(inserted = n, "hash slices");
    }
    let n = insert_writers(&mut s.slices, root, options.intelligent);
    debug!(inserted = n, "solution writers");

    let mut guards = Vec::new();
    if options.max_time.is_some() {
        guards.push(T::MaxTimeGuard);
    }
    if options.max_solutions.is_some() {
        guards.push(T::MaxSolutionsGuard);
    }
    if options.restart.is_some() {
        guards.push(T::RestartGuard);
    }
    if !guards.is_empty() {
        let n = insert_guards(&mut s.slices, root, &guards);
        debug!(inserted = n, ?guards, "option guards");
    }

    if options.keep_mating {
        let n = insert_keep_mating_filters(&mut s.slices, root);
        debug!(inserted = n, "keep-mating filters");
    }
    if options.intelligent {
        let n = insert_intelligent_slices(&mut s.slices, root);
        debug!(inserted = n, "intelligent mode");
    }
}

/// First slice of `kind` along `next` edges from `start` (not following loops).
pub fn find_along(slices: &Slices, start: SliceIndex, kind: SliceType) -> Option<SliceIndex> {
    let mut seen = Vec::new();
    let mut si = start;
    while si != NO_SLICE && !seen.contains(&si) {
        if slices[si].kind == kind {
            return Some(si);
        }
        seen.push(si);
        si = slices[si].next;
    }
    None
}

/// Every slice along `next` edges from `start` whose kind passes `pred`.
fn all_along(slices: &Slices, start: SliceIndex, pred: impl Fn(SliceType) -> bool) -> Vec<SliceIndex> {
    let mut seen = Vec::new();
    let mut si = start;
    while si != NO_SLICE && !seen.contains(&si) {
        seen.push(si);
        si = slices[si].next;
    }
    seen.into_iter().filter(|&si| pred(slices[si].kind)).collect()
}

/// Slices of `kinds` in the play itself: goal testers' immobility branches
/// and the one-move branches of reflex filters are left out.
pub fn find_in_play(slices: &mut Slices, root: SliceIndex, kinds: &[SliceType]) -> Vec<SliceIndex> {
    struct Found {
        kinds: Vec<SliceType>,
        out: Vec<SliceIndex>,
    }
    fn visit(slices: &mut Slices, si: SliceIndex, t: &mut Traversal<Found>) {
        if t.state.kinds.contains(&slices[si].kind) {
            t.state.out.push(si);
        }
        t.children(slices, si);
    }
    fn tester(slices: &mut Slices, si: SliceIndex, t: &mut Traversal<Found>) {
        let next = slices[si].next;
        t.traverse(slices, next);
    }
    let mut t = Traversal::new(Found {
        kinds: kinds.to_vec(),
        out: Vec::new(),
    });
    for &kind in kinds {
        t.override_kind(kind, visit);
    }
    for kind in [T::GoalReachedTester, T::ReflexAttackerFilter, T::ReflexDefenderFilter] {
        t.override_kind(kind, tester);
    }
    t.traverse(slices, root);
    t.state.out
}

/// The loop's ready-for-attack slice behind a ready-for-defense slice.
fn loop_ready_for_attack(slices: &Slices, defense: SliceIndex) -> Option<SliceIndex> {
    find_along(slices, slices[defense].next, T::ReadyForAttack)
}

fn insert_threat_slices(slices: &mut Slices, root: SliceIndex) -> usize {
    let mut inserted = 0;
    for defense in find_all(slices, root, &[T::ReadyForDefense]) {
        if slices[defense].length < SLACK_LENGTH + 2 {
            continue;
        }
        let Some(ready) = loop_ready_for_attack(slices, defense) else {
            continue;
        };
        let mut solver = Slice::new(T::ThreatSolver);
        solver.fork = ready;
        insert_slices(slices, defense, &[solver]);
        insert_slices(slices, ready, &[Slice::new(T::ThreatEnforcer)]);
        if let Some(attack) = find_along(slices, ready, T::AttackMove) {
            insert_slices(slices, attack, &[Slice::new(T::ThreatCollector)]);
        }
        inserted += 3;
    }
    inserted
}

fn insert_max_threat_length(slices: &mut Slices, root: SliceIndex, max: u32) -> usize {
    let mut inserted = 0;
    for defense in find_all(slices, root, &[T::ReadyForDefense]) {
        let Some(ready) = loop_ready_for_attack(slices, defense) else {
            continue;
        };
        let mut proto = Slice::with_payload(T::MaxThreatLength, Payload::Threshold(max));
        proto.fork = ready;
        insert_slices(slices, defense, &[proto]);
        inserted += 1;
    }
    inserted
}

fn insert_hash_slices(slices: &mut Slices, root: SliceIndex, help: bool) -> usize {
    let mut inserted = 0;
    for ready in find_in_play(slices, root, &[T::ReadyForAttack]) {
        insert_slices(slices, ready, &[Slice::new(T::AttackHashed)]);
        inserted += 1;
    }
    if help {
        for ready in find_in_play(slices, root, &[T::ReadyForHelpMove]) {
            insert_slices(slices, ready, &[Slice::new(T::HelpHashed)]);
            inserted += 1;
        }
    }
    inserted
}

/// Key writers behind attack moves; solution writers at the head of help
/// goal branches.
fn insert_writers(slices: &mut Slices, root: SliceIndex, intelligent: bool) -> usize {
    let mut inserted = 0;
    for attack in find_in_play(slices, root, &[T::AttackMove]) {
        insert_slices(slices, attack, &[Slice::new(T::KeyWriter)]);
        inserted += 1;
    }
    for defense in find_in_play(slices, root, &[T::DefenseMove]) {
        insert_slices(slices, defense, &[Slice::new(T::VariationWriter)]);
        inserted += 1;
    }
    let mut protos = Vec::new();
    if intelligent {
        protos.push(Slice::new(T::IntelligentDuplicateAvoider));
    }
    protos.push(Slice::new(T::SolutionWriter));
    for fork in find_in_play(slices, root, &[T::ForkOnRemaining]) {
        let goal = slices[fork].fork;
        insert_slices(slices, goal, &protos);
        inserted += protos.len();
    }
    inserted
}

fn insert_guards(slices: &mut Slices, root: SliceIndex, guards: &[SliceType]) -> usize {
    let mut inserted = 0;
    for mv in find_in_play(slices, root, &[T::AttackMove, T::DefenseMove, T::HelpMove]) {
        let protos: Vec<Slice> = guards
            .iter()
            .filter(|&&g| g == T::MaxTimeGuard || slices[mv].kind != T::DefenseMove)
            .map(|&g| Slice::new(g))
            .collect();
        insert_slices(slices, mv, &protos);
        inserted += protos.len();
    }
    inserted
}

/// Sides flagged as "must keep a piece able to deliver the goal", per
/// side index.
type MatingSides = [bool; 2];

fn mating_sides(slices: &Slices, si: SliceIndex) -> MatingSides {
    if si == NO_SLICE {
        return [false; 2];
    }
    let slice = &slices[si];
    match slice.kind {
        T::GoalReachedTester => {
            let mut sides = [false; 2];
            if let Some(victim) = slice.starter {
                sides[victim.opponent().index()] = true;
            }
            sides
        }
        T::And => {
            let (a, b) = (mating_sides(slices, slice.next), mating_sides(slices, slice.fork));
            [a[0] || b[0], a[1] || b[1]]
        }
        T::Or => {
            let (a, b) = (mating_sides(slices, slice.next), mating_sides(slices, slice.fork));
            [a[0] && b[0], a[1] && b[1]]
        }
        T::Not | T::True => [false; 2],
        _ => mating_sides(slices, slice.next),
    }
}

/// Goal branch that ends the play of the branch entered at `adapter`.
fn final_goal_branch(slices: &Slices, adapter: SliceIndex) -> Option<SliceIndex> {
    match slices[adapter].kind {
        T::AttackAdapter => find_along(slices, adapter, T::EndOfBranchGoal)
            .or_else(|| find_along(slices, adapter, T::EndOfBranchForced))
            .map(|si| slices[si].fork),
        T::HelpAdapter => {
            let forks = all_along(slices, adapter, |k| k == T::ForkOnRemaining);
            let half_moves = slices[adapter].length - SLACK_LENGTH;
            let index = if half_moves % 2 == 1 { 0 } else { 1 };
            forks.get(index).map(|&si| slices[si].fork)
        }
        _ => None,
    }
}

fn insert_keep_mating_filters(slices: &mut Slices, root: SliceIndex) -> usize {
    let mut inserted = 0;
    for adapter in find_in_play(slices, root, &[T::AttackAdapter, T::HelpAdapter]) {
        let Some(goal) = final_goal_branch(slices, adapter) else {
            continue;
        };
        let side = match mating_sides(slices, goal) {
            [true, false] => Side::White,
            [false, true] => Side::Black,
            _ => continue,
        };
        for mv in all_along(slices, adapter, SliceType::is_move) {
            insert_slices(
                slices,
                mv,
                &[Slice::with_payload(T::KeepMatingFilter, Payload::Side(side))],
            );
            inserted += 1;
        }
    }
    inserted
}

fn insert_intelligent_slices(slices: &mut Slices, root: SliceIndex) -> usize {
    let Some(adapter) = find_along(slices, root, T::HelpAdapter) else {
        return 0;
    };
    let mut inserted = 1;
    insert_slices(slices, adapter, &[Slice::new(T::IntelligentFilter)]);
    for mv in all_along(slices, adapter, |k| k == T::HelpMove) {
        insert_slices(slices, mv, &[Slice::new(T::GoalReachableGuard)]);
        inserted += 1;
    }
    inserted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::SolveOptions;
    use crate::stipulation::builder::{build_stipulation, impose_starter};
    use crate::stipulation::Stipulation;

    fn instrumented(text: &str, options: SolveOptions) -> Solver {
        let stip: Stipulation = text.parse().unwrap();
        let mut s = Solver::new();
        s.options = options;
        s.root = build_stipulation(&mut s.slices, &stip, &s.options);
        impose_starter(&mut s.slices, s.root, stip.starter());
        instrument(&mut s);
        impose_starter(&mut s.slices, s.root, stip.starter());
        s
    }

    #[test]
    fn battle_branch_gets_threats_hash_and_writers() {
        let s = instrumented("#2", SolveOptions::default());
        let adapter = s.slices[s.root].next;
        let kinds = s.slices.kinds_along(adapter);
        let pos = |k| kinds.iter().position(|&x| x == k).unwrap();
        assert!(pos(T::AttackHashed) < pos(T::ThreatEnforcer));
        assert!(pos(T::ThreatEnforcer) < pos(T::AttackMove));
        assert!(pos(T::SelfCheckGuard) < pos(T::KeyWriter));
        assert!(pos(T::KeyWriter) < pos(T::ThreatCollector));
        assert!(pos(T::ThreatCollector) < pos(T::EndOfBranchGoal));
        assert!(pos(T::ReadyForDefense) < pos(T::ThreatSolver));
        assert!(pos(T::DefenseMove) < pos(T::VariationWriter));
    }

    #[test]
    fn no_threat_option_leaves_out_threat_slices() {
        let options = SolveOptions {
            no_threat: true,
            ..SolveOptions::default()
        };
        let mut s = instrumented("#2", options);
        let root = s.root;
        assert!(find_all(&mut s.slices, root, &[T::ThreatSolver, T::ThreatEnforcer]).is_empty());
    }

    #[test]
    fn solution_writers_stay_out_of_immobility_tests() {
        let mut s = instrumented("h#2", SolveOptions::default());
        let root = s.root;
        let writers = find_all(&mut s.slices, root, &[T::SolutionWriter]);
        assert_eq!(writers.len(), 2);
        for w in writers {
            assert_eq!(s.slices[s.slices[w].next].kind, T::GoalReachedTester);
        }
    }

    #[test]
    fn keep_mating_watches_the_mating_side() {
        let options = SolveOptions {
            keep_mating: true,
            ..SolveOptions::default()
        };
        let mut s = instrumented("h#2", options);
        let root = s.root;
        let filters = find_all(&mut s.slices, root, &[T::KeepMatingFilter]);
        assert_eq!(filters.len(), 2);
        for f in filters {
            assert_eq!(s.slices[f].payload, Payload::Side(Side::White));
        }
    }

    #[test]
    fn keep_mating_is_omitted_for_negated_goals() {
        let options = SolveOptions {
            keep_mating: true,
            ..SolveOptions::default()
        };
        let mut s = instrumented("h!#1", options);
        let root = s.root;
        assert!(find_all(&mut s.slices, root, &[T::KeepMatingFilter]).is_empty());
        let mut s = instrumented("#2", SolveOptions { keep_mating: true, ..SolveOptions::default() });
        let root = s.root;
        let filters = find_all(&mut s.slices, root, &[T::KeepMatingFilter]);
        assert_eq!(filters.len(), 2);
        assert!(filters
            .iter()
            .all(|&f| s.slices[f].payload == Payload::Side(Side::White)));
    }

    #[test]
    fn reflex_branches_get_condition_slices_but_no_writers() {
        let mut s = instrumented("r#2", SolveOptions::default());
        s.conditions.insert(crate::conditions::Condition::Circe);
        let root = s.root;
        s.conditions.clone().instrument(&mut s.slices, root);
        let filter = find_all(&mut s.slices, root, &[T::ReflexDefenderFilter])[0];
        let avoided = s.slices[filter].fork;
        let kinds = s.slices.kinds_along(avoided);
        assert!(kinds.contains(&T::CirceRebirth));
        assert!(!kinds.contains(&T::KeyWriter));
        assert_eq!(find_all(&mut s.slices, root, &[T::KeyWriter]).len(), 1);
    }

    #[test]
    fn guards_follow_every_move_of_the_play() {
        let options = SolveOptions {
            max_solutions: Some(1),
            max_time: Some(10),
            ..SolveOptions::default()
        };
        let mut s = instrumented("#2", options);
        let root = s.root;
        assert_eq!(find_all(&mut s.slices, root, &[T::MaxTimeGuard]).len(), 2);
        assert_eq!(find_all(&mut s.slices, root, &[T::MaxSolutionsGuard]).len(), 1);
    }
}
