//! Post-move iteration.
//!
//! Some conditions let a single generated move end in several ways
//! (Supercirce rebirth squares, chameleon or plain promotee). Each such slice
//! *participates* in the ply with a number of alternatives; the move slice
//! replays the move until every combination of alternatives was visited,
//! advancing the participants like an odometer (last registered first).
//!
//! A participant that is not visited during a replay (an earlier slice cut
//! the line short) drops out.

use crate::journal::Ply;
use crate::stipulation::slice::SliceIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Participant {
    slice: SliceIndex,
    current: usize,
    count: usize,
    visited: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PostMoveIteration {
    plies: Vec<Vec<Participant>>,
}

impl PostMoveIteration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.plies.clear();
    }

    fn participants(&mut self, ply: Ply) -> &mut Vec<Participant> {
        if self.plies.len() <= ply {
            self.plies.resize_with(ply + 1, Vec::new);
        }
        &mut self.plies[ply]
    }

    /// Start iterating a fresh move in `ply`.
    pub fn begin(&mut self, ply: Ply) {
        self.participants(ply).clear();
    }

    /// Register slice `si` with `count` alternatives (or find it again on a
    /// replay); returns the alternative to play this time.
    pub fn participate(&mut self, ply: Ply, si: SliceIndex, count: usize) -> usize {
        let participants = self.participants(ply);
        if let Some(p) = participants.iter_mut().find(|p| p.slice == si) {
            p.visited = true;
            return p.current;
        }
        participants.push(Participant {
            slice: si,
            current: 0,
            count,
            visited: true,
        });
        0
    }

    /// Move to the next combination; `false` when every combination was played.
    pub fn advance(&mut self, ply: Ply) -> bool {
        let participants = self.participants(ply);
        participants.retain(|p| p.visited);
        while let Some(last) = participants.last_mut() {
            last.current += 1;
            if last.current < last.count {
                for p in participants.iter_mut() {
                    p.visited = false;
                }
                return true;
            }
            participants.pop();
        }
        false
    }

    /// Is anyone iterating in `ply`?
    pub fn is_active(&self, ply: Ply) -> bool {
        self.plies.get(ply).is_some_and(|p| !p.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_participants_visit_every_combination() {
        let mut it = PostMoveIteration::new();
        it.begin(1);
        let mut seen = Vec::new();
        loop {
            let a = it.participate(1, 10, 2);
            let b = it.participate(1, 20, 3);
            seen.push((a, b));
            if !it.advance(1) {
                break;
            }
        }
        assert_eq!(seen.len(), 6);
        assert_eq!(seen[0], (0, 0));
        assert_eq!(seen[1], (0, 1));
        assert_eq!(seen[3], (1, 0));
        assert!(!it.is_active(1));
    }

    #[test]
    fn unvisited_participant_drops_out() {
        let mut it = PostMoveIteration::new();
        it.begin(2);
        assert_eq!(it.participate(2, 10, 2), 0);
        assert_eq!(it.participate(2, 20, 2), 0);
        assert!(it.advance(2));
        // slice 20 cut off on this replay: only slice 10 keeps iterating
        assert_eq!(it.participate(2, 10, 2), 0);
        assert!(it.advance(2));
        assert_eq!(it.participate(2, 10, 2), 1);
        assert!(!it.advance(2));
    }
}
