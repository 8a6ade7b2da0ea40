//! Threats in battle play.
//!
//! Before the defender moves, the attacker is allowed a second move in a row
//! (the defender "passes" in a null ply). The shortest solutions found there
//! are the threat. After each real defense the attacker first tries only the
//! threat moves at the threat's length; a defense that does not parry the
//! threat is refuted cheaply.
//!
//! Threat data is stored at the index of the null ply, which is also the
//! ply of the defense that follows.

use tracing::trace;

use crate::chess::attacks::is_in_check;
use crate::chess::moves::Move;
use crate::journal::Ply;
use crate::solving::length::{is_solved, Length, SLACK_LENGTH};
use crate::solving::writers;
use crate::solving::{Mode, SolveTable, Solver, ROOT_PLY};
use crate::stipulation::slice::{SliceIndex, SliceType};

pub fn register(table: &mut SolveTable) {
    table.register(SliceType::ThreatSolver, threat_solver);
    table.register(SliceType::ThreatEnforcer, threat_enforcer);
    table.register(SliceType::ThreatCollector, threat_collector);
    table.register(SliceType::MaxThreatLength, max_threat_length);
}

#[derive(Debug, Clone, Default)]
struct ThreatSlot {
    /// Length of the threat, once it has been computed.
    length: Option<Length>,
    moves: Vec<Move>,
    collecting: bool,
    enforcing: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ThreatTable {
    slots: Vec<ThreatSlot>,
}

impl ThreatTable {
    pub fn reset(&mut self) {
        self.slots.clear();
    }

    fn slot(&mut self, ply: Ply) -> &mut ThreatSlot {
        if self.slots.len() <= ply {
            self.slots.resize_with(ply + 1, ThreatSlot::default);
        }
        &mut self.slots[ply]
    }

    pub fn clear(&mut self, ply: Ply) {
        if let Some(slot) = self.slots.get_mut(ply) {
            *slot = ThreatSlot::default();
        }
    }

    pub fn begin_collecting(&mut self, ply: Ply) {
        let slot = self.slot(ply);
        *slot = ThreatSlot::default();
        slot.collecting = true;
    }

    /// Stop collecting and remember the threat's length.
    pub fn finish_collecting(&mut self, ply: Ply, length: Length) {
        let slot = self.slot(ply);
        slot.collecting = false;
        slot.length = Some(length);
    }

    pub fn is_collecting(&self, ply: Ply) -> bool {
        self.slots.get(ply).is_some_and(|s| s.collecting)
    }

    pub fn is_enforcing(&self, ply: Ply) -> bool {
        self.slots.get(ply).is_some_and(|s| s.enforcing)
    }

    pub fn set_enforcing(&mut self, ply: Ply, on: bool) {
        self.slot(ply).enforcing = on;
    }

    pub fn threat_length(&self, ply: Ply) -> Option<Length> {
        self.slots.get(ply).and_then(|s| s.length)
    }

    pub fn moves(&self, ply: Ply) -> &[Move] {
        self.slots.get(ply).map_or(&[], |s| s.moves.as_slice())
    }

    pub fn add_move(&mut self, ply: Ply, mv: Move) {
        let slot = self.slot(ply);
        if !slot.moves.contains(&mv) {
            slot.moves.push(mv);
        }
    }
}

/// Solve the attacker's continuation after a pass by the defender.
fn solve_after_null_move(s: &mut Solver, si: SliceIndex, n: Length) -> Length {
    s.with_mode(Mode::Test, |s| s.solve_fork(si, n))
}

fn threat_solver(s: &mut Solver, si: SliceIndex, n: Length) -> Length {
    let defender = s.starter(si);
    let null_ply = s.current_ply() + 1;
    s.threats.clear(null_ply);
    if n > SLACK_LENGTH + 1 && !is_in_check(&s.position, defender) {
        let ply = s.nextply(defender);
        debug_assert_eq!(ply, null_ply);
        s.threats.begin_collecting(ply);
        let r = solve_after_null_move(s, si, n - 1);
        s.threats.finish_collecting(ply, r);
        trace!(ply, length = r, threats = s.threats.moves(ply).len(), "threat");
        s.finply();
    }
    let r = s.solve_next(si, n);
    s.threats.clear(null_ply);
    r
}

fn threat_enforcer(s: &mut Solver, si: SliceIndex, n: Length) -> Length {
    let ply = s.current_ply();
    if let Some(length) = s.threats.threat_length(ply) {
        if is_solved(length, n) && !s.threats.moves(ply).is_empty() {
            s.threats.set_enforcing(ply, true);
            let r = s.solve_next(si, length);
            s.threats.set_enforcing(ply, false);
            if is_solved(r, length) {
                return r;
            }
        }
    }
    s.solve_next(si, n)
}

/// Behind the attacker's move: records threat moves while collecting and
/// filters out everything else while enforcing.
fn threat_collector(s: &mut Solver, si: SliceIndex, n: Length) -> Length {
    let ply = s.current_ply();
    let parent = ply - 1;
    let mv = s.moves.get(ply, s.moves.current_index(ply));
    if s.threats.is_enforcing(parent) && !s.threats.moves(parent).contains(&mv) {
        return n + 2;
    }
    let r = s.solve_next(si, n);
    if s.threats.is_collecting(parent) && is_solved(r, n) {
        s.threats.add_move(parent, mv);
        writers::record_threat(s);
    }
    r
}

/// Reject keys whose threat takes longer than the configured maximum.
fn max_threat_length(s: &mut Solver, si: SliceIndex, n: Length) -> Length {
    let defender = s.starter(si);
    let max = SLACK_LENGTH + (2 * s.slices[si].threshold()).saturating_sub(1);
    if s.current_ply() == ROOT_PLY && max < n - 1 && !is_in_check(&s.position, defender) {
        let ply = s.nextply(defender);
        s.threats.clear(ply);
        let r = solve_after_null_move(s, si, max);
        s.finply();
        if !is_solved(r, max) {
            trace!(max, "threat too long");
            return n + 2;
        }
    }
    s.solve_next(si, n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::square::Square;

    #[test]
    fn slots_start_empty_and_clear_completely() {
        let mut table = ThreatTable::default();
        assert!(!table.is_collecting(3));
        table.begin_collecting(3);
        let mv = Move::quiet(Square::parse("a1").unwrap(), Square::parse("a8").unwrap());
        table.add_move(3, mv);
        table.add_move(3, mv);
        table.finish_collecting(3, SLACK_LENGTH + 1);
        assert_eq!(table.moves(3), &[mv]);
        assert_eq!(table.threat_length(3), Some(SLACK_LENGTH + 1));
        assert!(!table.is_collecting(3));
        table.clear(3);
        assert_eq!(table.threat_length(3), None);
        assert!(table.moves(3).is_empty());
    }
}
