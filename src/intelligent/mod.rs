//! Intelligent mode for help mates and help stalemates.
//!
//! Instead of searching forward blindly, candidate final positions are
//! constructed backwards from the goal ([`construct`]), and for each one the
//! help play is solved forward with every line pruned as soon as some piece
//! can no longer reach its place in the candidate within the moves its side
//! has left ([`froto`] gives the lower bounds).
//!
//! Three slice types carry the mode:
//! - `IntelligentFilter` at the help adapter drives construction
//! - `GoalReachableGuard` after every help move prunes unreachable lines
//! - `IntelligentDuplicateAvoider` in the goal branches drops a line that an
//!   earlier candidate already produced

pub mod construct;
pub mod froto;
pub mod guard;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::chess::moves::Move;
use crate::core::piece::{CastlingRights, PieceId, Side, Walk};
use crate::core::position::Position;
use crate::core::square::Square;
use crate::solving::length::{is_solved, Length, SLACK_LENGTH};
use crate::solving::writers::current_line;
use crate::solving::{Mode, SolveTable, Solver};
use crate::stipulation::goal::{Goal, GoalExpr};
use crate::stipulation::slice::{SliceIndex, SliceType, NO_SLICE};
use crate::stipulation::Stipulation;

use froto::{castling_squares, fro_to};

pub fn register(table: &mut SolveTable) {
    table.register(SliceType::IntelligentFilter, intelligent_filter);
    table.register(SliceType::GoalReachableGuard, goal_reachable_guard);
    table.register(SliceType::IntelligentDuplicateAvoider, duplicate_avoider);
}

/// Can intelligent mode solve this stipulation? Help play ending in a plain
/// mate or stalemate only.
pub fn is_supported(stipulation: &Stipulation) -> bool {
    target_goal(stipulation).is_some()
}

fn target_goal(stipulation: &Stipulation) -> Option<Goal> {
    match stipulation {
        Stipulation::Help {
            goal: GoalExpr::Goal(goal @ (Goal::Mate | Goal::Stalemate)),
            ..
        } => Some(*goal),
        _ => None,
    }
}

/// Where a piece stands, and as what, in a candidate final position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub walk: Walk,
    pub square: Square,
}

/// A constructed final position the forward search is steered towards.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub goal: Goal,
    pub mater: Side,
    pub targets: FxHashMap<PieceId, Target>,
    /// The piece giving mate, if any.
    pub checker: Option<PieceId>,
    pub victim_king: Square,
}

impl Candidate {
    /// Take every piece of `pos` as a target.
    pub fn of(pos: &Position, goal: Goal, mater: Side, checker: Option<PieceId>) -> Self {
        let targets = pos
            .pieces()
            .map(|(square, walk, _, id)| (id, Target { walk, square }))
            .collect();
        Self {
            goal,
            mater,
            targets,
            checker,
            victim_king: pos.king_square(mater.opponent()),
        }
    }
}

/// Intelligent-mode tables of the current twin.
#[derive(Debug, Clone, Default)]
pub struct IntelligentState {
    candidate: Option<Candidate>,
    /// Moves each side still has, indexed by side.
    moves_left: [u32; 2],
    /// Lines already reported for the current length.
    seen: FxHashSet<Vec<Move>>,
}

impl IntelligentState {
    pub fn begin_candidate(&mut self, candidate: Candidate, moves_left: [u32; 2]) {
        self.candidate = Some(candidate);
        self.moves_left = moves_left;
    }

    pub fn end_candidate(&mut self) {
        self.candidate = None;
    }

    pub fn candidate(&self) -> Option<&Candidate> {
        self.candidate.as_ref()
    }

    pub fn moves_left(&self) -> [u32; 2] {
        self.moves_left
    }

    pub fn forget_lines(&mut self) {
        self.seen.clear();
    }
}

/// Count the moves of each side in `n` half-moves of the help branch
/// entered at `entry`. Also returns the side making the last move.
pub fn count_moves(s: &Solver, entry: SliceIndex, n: Length) -> ([u32; 2], Option<Side>) {
    let mut left = [0; 2];
    let mut last = None;
    let mut remaining = n.saturating_sub(SLACK_LENGTH);
    let mut si = entry;
    let mut steps = 0;
    let max_steps = s.slices.len() * (remaining as usize + 1);
    while remaining > 0 && si != NO_SLICE && steps <= max_steps {
        let slice = &s.slices[si];
        if slice.kind == SliceType::HelpMove {
            if let Some(side) = slice.starter {
                left[side.index()] += 1;
                last = Some(side);
                remaining -= 1;
            }
        }
        si = slice.next;
        steps += 1;
    }
    (left, last)
}

/// With a restart move number, lengths that end before it are skipped.
fn too_short(s: &Solver, n: Length) -> bool {
    let Some(restart) = s.options.restart else {
        return false;
    };
    let half_moves = n.saturating_sub(SLACK_LENGTH);
    let mut min_length = 2 * restart as u32;
    if half_moves % 2 == 1 {
        min_length = min_length.saturating_sub(1);
    }
    half_moves < min_length
}

/// Replace the forward search of the help branch by construction; tries
/// lengths from the shortest up and stops at the first one with solutions.
fn intelligent_filter(s: &mut Solver, si: SliceIndex, n: Length) -> Length {
    let goal = s.stipulation.as_ref().and_then(target_goal);
    let Some(goal) = goal.filter(|_| s.mode == Mode::Solve) else {
        return s.solve_next(si, n);
    };
    let next = s.slices[si].next;
    let (entry, min_length) = if s.slices[next].kind == SliceType::HelpFindShortest {
        let min_length = s.slices[next].min_length.max(SLACK_LENGTH);
        (s.slices[next].next, min_length)
    } else {
        (next, n)
    };

    let mut n_try = min_length + (n - min_length) % 2;
    while n_try <= n {
        if !too_short(s, n_try) && construct::solve(s, entry, n_try, goal) {
            debug!(half_moves = n_try - SLACK_LENGTH, "intelligent mode found solutions");
            return n_try;
        }
        if s.is_interrupted() {
            break;
        }
        n_try += 2;
    }
    n + 2
}

/// Is the current candidate still reachable with the moves left?
fn is_goal_reachable(s: &Solver) -> bool {
    let Some(candidate) = s.intelligent.candidate() else {
        return true;
    };
    let ply = s.current_ply();
    if let Some((_, _, _, id)) = s.journal.captured_piece(ply) {
        if candidate.targets.contains_key(&id) {
            return false;
        }
    }

    let left = s.intelligent.moves_left();
    let mater = candidate.mater;
    let castling = s.position.castling();
    let mut needed = [0u32; 2];
    let mut to_capture = 0;
    for (sq, walk, flags, id) in s.position.pieces() {
        let side = if flags.belongs_to(Side::White) {
            Side::White
        } else {
            Side::Black
        };
        match candidate.targets.get(&id) {
            Some(target) => {
                let checks = (candidate.checker == Some(id) && left[mater.index()] > 0)
                    .then_some(candidate.victim_king);
                let moves = fro_to(side, walk, sq, target.walk, target.square, castling, checks);
                needed[side.index()] = needed[side.index()].saturating_add(moves);
            }
            None if candidate.goal == Goal::Stalemate && side != mater => to_capture += 1,
            None => {}
        }
    }
    for side in Side::BOTH {
        if castles_into_targets(&s.position, candidate, side, castling) {
            needed[side.index()] = needed[side.index()].saturating_sub(1);
        }
    }
    needed[0] <= left[0] && needed[1] <= left[1] && to_capture <= left[mater.index()]
}

/// Castling takes king and rook to their targets with a single move, which
/// the per-piece bounds charge twice.
fn castles_into_targets(
    pos: &Position,
    candidate: &Candidate,
    side: Side,
    castling: CastlingRights,
) -> bool {
    let holds = |from: Square, walk: Walk, to: Square| {
        pos.walk(from) == walk
            && pos.flags(from).belongs_to(side)
            && candidate.targets.get(&pos.piece_id(from)) == Some(&Target { walk, square: to })
    };
    [true, false].into_iter().any(|king_side| {
        let Some([king_from, king_to, rook_from, rook_to]) = castling_squares(side, king_side)
        else {
            return false;
        };
        castling.has(side, king_side)
            && holds(king_from, Walk::King, king_to)
            && holds(rook_from, Walk::Rook, rook_to)
    })
}

fn goal_reachable_guard(s: &mut Solver, si: SliceIndex, n: Length) -> Length {
    if s.intelligent.candidate().is_none() {
        return s.solve_next(si, n);
    }
    let just_moved = s.side_at(s.current_ply()).index();
    if s.intelligent.moves_left[just_moved] == 0 {
        return n + 2;
    }
    s.intelligent.moves_left[just_moved] -= 1;
    let r = if is_goal_reachable(s) {
        s.solve_next(si, n)
    } else {
        n + 2
    };
    s.intelligent.moves_left[just_moved] += 1;
    r
}

fn duplicate_avoider(s: &mut Solver, si: SliceIndex, n: Length) -> Length {
    if s.intelligent.candidate().is_none() {
        return s.solve_next(si, n);
    }
    let line: Vec<Move> = current_line(s).into_iter().map(|(_, mv)| mv).collect();
    if s.intelligent.seen.contains(&line) {
        return n + 2;
    }
    let r = s.solve_next(si, n);
    if s.mode == Mode::Solve && is_solved(r, n) {
        if let Err(err) =
            s.tracker
                .try_reserve_set("intelligent", "seen_lines", &mut s.intelligent.seen, 1)
        {
            s.limit_reached(err);
            return r;
        }
        s.intelligent.seen.insert(line);
    }
    r
}
