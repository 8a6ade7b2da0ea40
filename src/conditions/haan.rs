//! Haan chess: every square a piece leaves becomes a hole.

use crate::journal::Reason;
use crate::solving::length::Length;
use crate::solving::{SolveTable, Solver};
use crate::stipulation::slice::{SliceIndex, SliceType};

pub fn register(table: &mut SolveTable) {
    table.register(SliceType::HaanHoleInserter, haan_hole_inserter);
}

fn haan_hole_inserter(s: &mut Solver, si: SliceIndex, n: Length) -> Length {
    let from = s.journal.departure_square(s.current_ply());
    if !from.is_none() && s.position.is_empty(from) {
        s.journal
            .do_square_block(&mut s.position, Reason::HaanHole, from);
    }
    s.solve_next(si, n)
}
