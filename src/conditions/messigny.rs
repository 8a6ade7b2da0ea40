//! Messigny chess: instead of moving, a piece may swap places with an enemy
//! piece of the same walk, unless the previous move was such a swap.

use tracing::trace;

use crate::chess::movegen::generate_exchanges;
use crate::journal::Effect;
use crate::solving::length::Length;
use crate::solving::{SolveTable, Solver};
use crate::stipulation::slice::{SliceIndex, SliceType};

pub fn register(table: &mut SolveTable) {
    table.register(SliceType::MessignyMoveGenerator, messigny_move_generator);
}

fn replies_to_exchange(s: &Solver) -> bool {
    let parent = s.current_ply() - 1;
    matches!(
        s.journal.movement(parent).map(|e| e.effect),
        Some(Effect::Exchange { .. })
    )
}

fn messigny_move_generator(s: &mut Solver, si: SliceIndex, n: Length) -> Length {
    if !replies_to_exchange(s) {
        let ply = s.current_ply();
        let exchanges = generate_exchanges(&s.position, s.starter(si));
        trace!(ply, count = exchanges.len(), "messigny exchanges");
        s.moves.extend(ply, exchanges);
    }
    s.solve_next(si, n)
}
