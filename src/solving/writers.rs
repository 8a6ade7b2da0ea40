//! Solution writers.
//!
//! Battle play records its keys; help play records the whole line at the
//! moment the goal branch is solved. Both only write in solve mode.
//!
//! While a key is being solved, its post-key play is gathered on the side:
//! the threat (collected after the defender's null move) and each defense
//! together with the attacker's first successful answer. Both are dropped
//! again if the key turns out to be refuted.

use tracing::{debug, info};

use crate::chess::moves::Move;
use crate::journal::Ply;
use crate::solution::{MoveRecord, PositionSnapshot, Solution, Variation};
use crate::solving::length::{is_solved, Length};
use crate::solving::{Mode, SolveTable, Solver, ROOT_PLY};
use crate::stipulation::slice::{SliceIndex, SliceType};

pub fn register(table: &mut SolveTable) {
    table.register(SliceType::KeyWriter, key_writer);
    table.register(SliceType::SolutionWriter, solution_writer);
    table.register(SliceType::VariationWriter, variation_writer);
}

/// Threat and variations of the key currently on the board.
#[derive(Debug, Default)]
pub struct PostKeyPlay {
    recording: bool,
    threat: Vec<MoveRecord>,
    variations: Vec<Variation>,
    continuation: Option<MoveRecord>,
}

impl PostKeyPlay {
    fn start(&mut self) {
        *self = Self {
            recording: true,
            ..Self::default()
        };
    }

    fn finish(&mut self) -> (Vec<MoveRecord>, Vec<Variation>) {
        let taken = std::mem::take(self);
        (taken.threat, taken.variations)
    }
}

/// The moves played from the root ply up to the current one, skipping null
/// plies.
pub fn current_line(s: &Solver) -> Vec<(Ply, Move)> {
    (ROOT_PLY..=s.current_ply())
        .filter(|&ply| s.journal.movement(ply).is_some())
        .map(|ply| (ply, s.moves.get(ply, s.moves.current_index(ply))))
        .collect()
}

fn current_record(s: &Solver) -> MoveRecord {
    let ply = s.current_ply();
    let mv = s.moves.get(ply, s.moves.current_index(ply));
    MoveRecord::from_ply(&s.journal, ply, s.side_at(ply), mv)
}

/// Add the attacker's move on the board to the threat of the key being
/// solved. Other threats, deeper in the tree, are ignored.
pub fn record_threat(s: &mut Solver) {
    if s.postkey.recording && s.current_ply() == ROOT_PLY + 2 {
        let record = current_record(s);
        if !s.postkey.threat.contains(&record) {
            s.postkey.threat.push(record);
        }
    }
}

fn record(
    s: &mut Solver,
    line: &[(Ply, Move)],
    threat: Vec<MoveRecord>,
    variations: Vec<Variation>,
) {
    let moves: Vec<MoveRecord> = line
        .iter()
        .map(|&(ply, mv)| MoveRecord::from_ply(&s.journal, ply, s.side_at(ply), mv))
        .collect();
    let solution = Solution {
        moves,
        final_position: PositionSnapshot::of(&s.position),
        set_play: s.in_set_play,
        threat,
        variations,
    };
    info!(solution = %solution, "solution");
    if let Err(err) = s
        .tracker
        .try_reserve_vec("solution_writer", "solutions", &mut s.solutions, 1)
    {
        s.limit_reached(err);
        return;
    }
    s.solutions.push(solution);
}

/// Behind every attacking move: records keys at the root ply and the
/// attacker's answers to the key's defenses two plies later.
fn key_writer(s: &mut Solver, si: SliceIndex, n: Length) -> Length {
    let ply = s.current_ply();
    if s.mode != Mode::Solve {
        return s.solve_next(si, n);
    }
    if ply == ROOT_PLY {
        s.postkey.start();
        let r = s.solve_next(si, n);
        let (threat, variations) = s.postkey.finish();
        if is_solved(r, n) {
            let line = current_line(s);
            record(s, &line, threat, variations);
        }
        return r;
    }
    let r = s.solve_next(si, n);
    if ply == ROOT_PLY + 2
        && s.postkey.recording
        && s.postkey.continuation.is_none()
        && is_solved(r, n)
    {
        s.postkey.continuation = Some(current_record(s));
    }
    r
}

/// Behind every defending move: records the defenses of the key.
fn variation_writer(s: &mut Solver, si: SliceIndex, n: Length) -> Length {
    if s.mode != Mode::Solve || !s.postkey.recording || s.current_ply() != ROOT_PLY + 1 {
        return s.solve_next(si, n);
    }
    let defense = current_record(s);
    s.postkey.continuation = None;
    let r = s.solve_next(si, n);
    let continuation = s.postkey.continuation.take();
    if is_solved(r, n) {
        debug!(defense = %defense.text, "variation");
        s.postkey.variations.push(Variation {
            defense,
            continuation,
        });
    }
    r
}

fn solution_writer(s: &mut Solver, si: SliceIndex, n: Length) -> Length {
    let r = s.solve_next(si, n);
    if s.mode == Mode::Solve && is_solved(r, n) {
        let line = current_line(s);
        record(s, &line, Vec::new(), Vec::new());
    }
    r
}
