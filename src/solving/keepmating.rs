//! Keep-mating filter: a line dies as soon as the side that has to deliver
//! the goal is reduced to its king.

use crate::solving::length::Length;
use crate::solving::{SolveTable, Solver};
use crate::stipulation::slice::{Payload, SliceIndex, SliceType};

pub fn register(table: &mut SolveTable) {
    table.register(SliceType::KeepMatingFilter, keep_mating_filter);
}

fn keep_mating_filter(s: &mut Solver, si: SliceIndex, n: Length) -> Length {
    match s.slices[si].payload {
        Payload::Side(side) if !s.position.has_non_royal_piece(side) => n + 2,
        _ => s.solve_next(si, n),
    }
}
