//! Chameleon chess: chameleons cycle N -> B -> R -> Q -> N whenever they
//! move, and a promoting pawn may choose to become a chameleon.

use crate::core::piece::Flags;
use crate::journal::{Effect, Reason};
use crate::solving::length::Length;
use crate::solving::{SolveTable, Solver};
use crate::stipulation::slice::{SliceIndex, SliceType};

pub fn register(table: &mut SolveTable) {
    table.register(SliceType::ChameleonPromotion, chameleon_promotion);
    table.register(SliceType::ChameleonChanger, chameleon_changer);
}

fn is_promotion(s: &Solver) -> bool {
    let ply = s.current_ply();
    s.journal.ply_entries(ply).iter().any(|e| {
        e.reason == Reason::Promotion && matches!(e.effect, Effect::WalkChange { .. })
    })
}

/// Alternative 0 keeps the ordinary promotee, alternative 1 makes it a
/// chameleon.
fn chameleon_promotion(s: &mut Solver, si: SliceIndex, n: Length) -> Length {
    if is_promotion(s) {
        let ply = s.current_ply();
        let on = s.journal.moving_piece_square(ply);
        if !on.is_none() && s.post_move.participate(ply, si, 2) == 1 {
            let flags = s.position.flags(on).with(Flags::CHAMELEON);
            s.journal
                .do_flags_change(&mut s.position, Reason::ChameleonPromotion, on, flags);
        }
    }
    s.solve_next(si, n)
}

/// Change the walk of a chameleon that moved. Only the flags it carried
/// before the move count, so a fresh chameleon promotee keeps its walk.
fn chameleon_changer(s: &mut Solver, si: SliceIndex, n: Length) -> Length {
    let ply = s.current_ply();
    if let Some(Effect::Movement { walk, flags, .. }) = s.journal.movement(ply).map(|e| e.effect) {
        let on = s.journal.moving_piece_square(ply);
        if flags.contains(Flags::CHAMELEON) && !on.is_none() && s.position.walk(on) == walk {
            let successor = walk.chameleon_successor();
            if successor != walk {
                s.journal
                    .do_walk_change(&mut s.position, Reason::Chameleon, on, successor);
            }
        }
    }
    s.solve_next(si, n)
}
