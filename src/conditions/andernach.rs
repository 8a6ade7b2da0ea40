//! Andernach chess: a piece that captures changes side (kings excepted).

use crate::core::piece::Flags;
use crate::journal::Reason;
use crate::solving::length::Length;
use crate::solving::{SolveTable, Solver};
use crate::stipulation::slice::{SliceIndex, SliceType};

pub fn register(table: &mut SolveTable) {
    table.register(SliceType::AndernachSideChanger, andernach_side_changer);
}

fn andernach_side_changer(s: &mut Solver, si: SliceIndex, n: Length) -> Length {
    let ply = s.current_ply();
    if s.journal.captured_piece(ply).is_some() {
        let on = s.journal.moving_piece_square(ply);
        if !on.is_none() && !s.position.flags(on).contains(Flags::ROYAL) {
            let to = s.side_at(ply).opponent();
            s.journal
                .do_side_change(&mut s.position, Reason::Andernach, on, to);
        }
    }
    s.solve_next(si, n)
}
