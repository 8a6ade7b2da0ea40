//! Transposition table for attack and help positions.
//!
//! Only failures are stored: an entry says "from this position, entering
//! slice `si`, there is no solution within `n`". A later visit with a length
//! not above the stored one fails immediately.

use rustc_hash::FxHashMap;
use tracing::{trace, warn};

use crate::chess::execution::en_passant_square;
use crate::core::position::PositionKey;
use crate::journal::Effect;
use crate::problem::SolveError;
use crate::solving::length::{is_sentinel, Length};
use crate::solving::resources::ResourceTracker;
use crate::solving::{SolveTable, Solver};
use crate::stipulation::slice::{SliceIndex, SliceType};

pub fn register(table: &mut SolveTable) {
    table.register(SliceType::AttackHashed, hashed);
    table.register(SliceType::HelpHashed, hashed);
}

#[derive(Debug, Clone, Default)]
pub struct HashTable {
    entries: FxHashMap<(PositionKey, SliceIndex), Length>,
    capacity: usize,
    full_reported: bool,
}

impl HashTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: FxHashMap::default(),
            capacity,
            full_reported: false,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.full_reported = false;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_enabled(&self) -> bool {
        self.capacity > 0
    }

    /// Longest length known to fail for `key`.
    pub fn lookup(&self, key: &(PositionKey, SliceIndex)) -> Option<Length> {
        self.entries.get(key).copied()
    }

    /// Record a failure within `n`; returns whether a new entry was created.
    pub fn store(
        &mut self,
        tracker: &ResourceTracker,
        key: (PositionKey, SliceIndex),
        n: Length,
    ) -> Result<bool, SolveError> {
        if let Some(stored) = self.entries.get_mut(&key) {
            *stored = (*stored).max(n);
            return Ok(false);
        }
        if self.entries.len() >= self.capacity {
            if !self.full_reported {
                warn!(capacity = self.capacity, "hash table full; no further entries");
                self.full_reported = true;
            }
            return Ok(false);
        }
        tracker.try_reserve_map("hash_store", "hash_table", &mut self.entries, 1)?;
        self.entries.insert(key, n);
        Ok(true)
    }
}

fn position_key(s: &Solver, si: SliceIndex) -> PositionKey {
    let ply = s.current_ply();
    let after_exchange = matches!(
        s.journal.movement(ply).map(|e| e.effect),
        Some(Effect::Exchange { .. })
    );
    s.position.key(
        s.starter(si),
        en_passant_square(&s.journal, ply),
        u8::from(after_exchange),
    )
}

fn hashed(s: &mut Solver, si: SliceIndex, n: Length) -> Length {
    if !s.hash.is_enabled() || s.current_ply() == 0 {
        return s.solve_next(si, n);
    }
    let key = (position_key(s, si), si);
    if s.hash.lookup(&key).is_some_and(|stored| stored >= n) {
        trace!(si, n, "hash hit");
        return n + 2;
    }
    let r = s.solve_next(si, n);
    if r > n && !is_sentinel(r) && !s.is_interrupted() {
        let stored = match s.hash.store(&s.tracker, key, n) {
            Ok(true) => s.tracker.bump_hash_entries("hash_store", 1),
            Ok(false) => Ok(()),
            Err(err) => Err(err),
        };
        if let Err(err) = stored {
            s.limit_reached(err);
        }
    }
    r
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::piece::Side;
    use crate::core::position::Position;
    use crate::core::square::Square;
    use crate::problem::ResourceLimits;

    #[test]
    fn entries_keep_the_longest_failure_and_respect_capacity() {
        let pos = Position::initial_game_array();
        let key = |side| (pos.key(side, Square::NONE, 0), 7);
        let tracker = ResourceTracker::new(ResourceLimits::default());
        let mut table = HashTable::new(1);
        assert!(table.store(&tracker, key(Side::White), 5).unwrap());
        assert!(!table.store(&tracker, key(Side::White), 7).unwrap());
        assert!(!table.store(&tracker, key(Side::White), 6).unwrap());
        assert_eq!(table.lookup(&key(Side::White)), Some(7));
        assert!(!table.store(&tracker, key(Side::Black), 5).unwrap());
        assert_eq!(table.len(), 1);
        table.clear();
        assert!(table.is_empty());
    }
}
