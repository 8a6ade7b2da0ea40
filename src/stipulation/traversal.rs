//! Structure traversal: a visitor over the slice graph with per-type overrides.
//!
//! - every slice is visited at most once (visited marks)
//! - the default visitor descends by structure (next, then fork / op2)
//! - a [`Context`] tracks which kind of branch the walk is in
//!
//! Overrides receive the traversal itself and call [`Traversal::children`]
//! to continue below the slice they handle.

use rustc_hash::FxHashSet;

use crate::stipulation::slice::{SliceIndex, SliceType, Slices, Structure, NO_SLICE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Context {
    Intro,
    Attack,
    Defense,
    Help,
}

pub type Visitor<S> = fn(&mut Slices, SliceIndex, &mut Traversal<S>);

pub struct Traversal<S> {
    overrides: Vec<Option<Visitor<S>>>,
    visited: FxHashSet<SliceIndex>,
    pub context: Context,
    /// Caller state threaded through the visitors.
    pub state: S,
}

impl<S> Traversal<S> {
    pub fn new(state: S) -> Self {
        Self {
            overrides: vec![None; SliceType::COUNT],
            visited: FxHashSet::default(),
            context: Context::Intro,
            state,
        }
    }

    pub fn override_kind(&mut self, kind: SliceType, visitor: Visitor<S>) -> &mut Self {
        self.overrides[kind.index()] = Some(visitor);
        self
    }

    /// Visit `si` unless it was visited before.
    pub fn traverse(&mut self, slices: &mut Slices, si: SliceIndex) {
        if si == NO_SLICE || !self.visited.insert(si) {
            return;
        }
        let kind = slices[si].kind;
        let saved = self.context;
        self.context = match kind {
            SliceType::AttackAdapter | SliceType::ReadyForAttack => Context::Attack,
            SliceType::ReadyForDefense => Context::Defense,
            SliceType::HelpAdapter | SliceType::ReadyForHelpMove => Context::Help,
            _ => self.context,
        };
        match self.overrides[kind.index()] {
            Some(visitor) => visitor(slices, si, self),
            None => self.children(slices, si),
        }
        self.context = saved;
    }

    /// Default descent below `si`.
    pub fn children(&mut self, slices: &mut Slices, si: SliceIndex) {
        let (next, fork) = (slices[si].next, slices[si].fork);
        match slices[si].kind.structure() {
            Structure::Leaf => {}
            Structure::Pipe | Structure::Branch => self.traverse(slices, next),
            Structure::Fork | Structure::Binary => {
                self.traverse(slices, next);
                self.traverse(slices, fork);
            }
        }
    }

    /// Continue with the fork branch only (used by overrides that handle `next` themselves).
    pub fn fork(&mut self, slices: &mut Slices, si: SliceIndex) {
        let fork = slices[si].fork;
        self.traverse(slices, fork);
    }
}

/// Collect every reachable slice of the given kinds, in visiting order.
pub fn find_all(slices: &mut Slices, root: SliceIndex, kinds: &[SliceType]) -> Vec<SliceIndex> {
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
    let mut t = Traversal::new(Found {
        kinds: kinds.to_vec(),
        out: Vec::new(),
    });
    for &kind in kinds {
        t.override_kind(kind, visit);
    }
    t.traverse(slices, root);
    t.state.out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loops_are_visited_once() {
        let mut slices = Slices::new();
        let a = slices.alloc_pipe(SliceType::Proxy);
        let b = slices.alloc_pipe(SliceType::SelfCheckGuard);
        slices.link(a, b);
        slices.set_next(b, a);
        assert_eq!(find_all(&mut slices, a, &[SliceType::SelfCheckGuard]), vec![b]);
    }
}
