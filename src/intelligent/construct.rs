//! Construction of candidate final positions.
//!
//! Starting from an empty board the victim's king is placed first, then
//! (for mate) a checking piece of the mater, then mater pieces that guard
//! the king's flights, then victim pieces blocking the remaining flights.
//! Whatever still lets the victim move is neutralised by pins and
//! interpositions. Every placement is charged against the moves its side
//! has, using the [`fro_to`] bounds, so only candidates reachable in
//! principle are handed to the forward search.

use tracing::{debug, trace, warn};

use crate::chess::attacks::{is_clear_between, is_in_check, piece_attacks, walk_attacks};
use crate::chess::legality::{first_legal_move, is_mate, is_stalemate, legal_moves};
use crate::chess::moves::MoveKind;
use crate::core::piece::{CastlingRights, Flags, PieceId, Side, Walk};
use crate::core::position::Position;
use crate::core::square::{Square, QUEEN_DIRS, ROOK_DIRS};
use crate::solving::length::{is_solved, Length};
use crate::solving::Solver;
use crate::stipulation::goal::Goal;
use crate::stipulation::slice::SliceIndex;

use super::froto::{castling_squares, fro_to, pawn_captures};
use super::guard::PositionSwap;
use super::{count_moves, Candidate};

/// Solve the help play entered at `entry` with exactly `n` by construction.
/// Returns whether any candidate produced a solution.
pub fn solve(s: &mut Solver, entry: SliceIndex, n: Length, goal: Goal) -> bool {
    let (moves_left, last) = count_moves(s, entry, n);
    let Some(mater) = last else {
        return false;
    };
    if s.position.king_square(mater.opponent()).is_none() {
        warn!(victim = ?mater.opponent(), "no king to mate; solving without construction");
        return is_solved(s.solve(entry, n), n);
    }

    let initial = s.position.clone();
    let mut board = Position::empty();
    for sq in Square::all().filter(|&sq| initial.is_hole(sq)) {
        board.block_square(sq);
    }
    s.intelligent.forget_lines();

    let mut construction = Construction::new(&initial, goal, mater, moves_left, entry, n);
    {
        let mut swap = PositionSwap::new(s, board);
        construction.place_victim_king(&mut swap);
    }
    debug!(
        half_moves = moves_left[0] + moves_left[1],
        candidates = construction.candidates,
        found = construction.found,
        "construction finished"
    );
    construction.found
}

/// A piece of the start position and whether the candidate uses it yet.
#[derive(Debug, Clone, Copy)]
struct Unit {
    id: PieceId,
    walk: Walk,
    flags: Flags,
    square: Square,
    used: bool,
}

/// Moves still available while placing pieces.
#[derive(Debug, Clone, Copy)]
struct Budget {
    mater: u32,
    /// Victim moves not yet committed to any placement.
    victim: u32,
    /// Captures the mater's pawns make on their way.
    mater_captures: u32,
    /// Captures the victim's pawns may still make (one per mater piece left
    /// out of the picture).
    victim_captures: u32,
}

fn units_of(pos: &Position, side: Side) -> Vec<Unit> {
    let king = pos.king_square(side);
    let unit = |(square, walk, flags, id): (Square, Walk, Flags, PieceId)| Unit {
        id,
        walk,
        flags,
        square,
        used: false,
    };
    let mut units: Vec<Unit> = pos
        .pieces_of(side)
        .filter(|&(sq, ..)| sq == king)
        .map(unit)
        .collect();
    units.extend(pos.pieces_of(side).filter(|&(sq, ..)| sq != king).map(unit));
    units
}

/// Walks a unit may have in the final position.
fn shapes(unit: &Unit) -> &'static [Walk] {
    const PAWN: [Walk; 5] = [Walk::Pawn, Walk::Queen, Walk::Rook, Walk::Bishop, Walk::Knight];
    match unit.walk {
        Walk::Pawn => &PAWN,
        Walk::King => &[Walk::King],
        Walk::Queen => &[Walk::Queen],
        Walk::Rook => &[Walk::Rook],
        Walk::Bishop => &[Walk::Bishop],
        Walk::Knight => &[Walk::Knight],
        Walk::Empty | Walk::Invalid => &[],
    }
}

fn may_stand(walk: Walk, side: Side, sq: Square) -> bool {
    walk != Walk::Pawn || (1..=6).contains(&side.relative_rank(sq.rank()))
}

fn file_changes(unit: &Unit, walk: Walk, sq: Square) -> u32 {
    if unit.walk == Walk::Pawn && walk == Walk::Pawn {
        pawn_captures(unit.square, sq)
    } else {
        0
    }
}

struct Construction {
    goal: Goal,
    mater: Side,
    victim: Side,
    entry: SliceIndex,
    n: Length,
    moves_left: [u32; 2],
    initial: Position,
    castling: CastlingRights,
    units: [Vec<Unit>; 2],
    checker: Option<usize>,
    candidates: u64,
    found: bool,
}

impl Construction {
    fn new(
        initial: &Position,
        goal: Goal,
        mater: Side,
        moves_left: [u32; 2],
        entry: SliceIndex,
        n: Length,
    ) -> Self {
        Self {
            goal,
            mater,
            victim: mater.opponent(),
            entry,
            n,
            moves_left,
            initial: initial.clone(),
            castling: initial.castling(),
            units: [units_of(initial, Side::White), units_of(initial, Side::Black)],
            checker: None,
            candidates: 0,
            found: false,
        }
    }

    fn unit(&self, side: Side, index: usize) -> Unit {
        self.units[side.index()][index]
    }

    fn set_used(&mut self, side: Side, index: usize, used: bool) {
        self.units[side.index()][index].used = used;
    }

    fn cost(&self, side: Side, unit: &Unit, walk: Walk, sq: Square, checks: Option<Square>) -> u32 {
        fro_to(side, unit.walk, unit.square, walk, sq, self.castling, checks)
    }

    /// [`Self::cost`] for a placement on the board as it stands: a king or
    /// rook taking its castled square after its partner has taken its own
    /// comes along with the partner's move.
    fn placement_cost(
        &self,
        s: &Solver,
        side: Side,
        unit: &Unit,
        walk: Walk,
        sq: Square,
        checks: Option<Square>,
    ) -> u32 {
        if self.castles_with_partner(s, side, unit, walk, sq) {
            0
        } else {
            self.cost(side, unit, walk, sq, checks)
        }
    }

    fn castles_with_partner(
        &self,
        s: &Solver,
        side: Side,
        unit: &Unit,
        walk: Walk,
        sq: Square,
    ) -> bool {
        if walk != unit.walk || !matches!(walk, Walk::King | Walk::Rook) {
            return false;
        }
        let stands = |walk: Walk, from: Square, on: Square| {
            let id = s.position.piece_id(on);
            s.position.walk(on) == walk
                && self.units[side.index()]
                    .iter()
                    .any(|u| u.used && u.walk == walk && u.square == from && u.id == id)
        };
        [true, false].into_iter().any(|king_side| {
            let Some([king_from, king_to, rook_from, rook_to]) = castling_squares(side, king_side)
            else {
                return false;
            };
            if !self.castling.has(side, king_side) {
                return false;
            }
            match walk {
                Walk::King => {
                    unit.square == king_from
                        && sq == king_to
                        && stands(Walk::Rook, rook_from, rook_to)
                }
                _ => {
                    unit.square == rook_from
                        && sq == rook_to
                        && stands(Walk::King, king_from, king_to)
                }
            }
        })
    }

    fn victim_count(&self) -> u32 {
        self.units[self.victim.index()].len() as u32
    }

    fn unused_mater_pieces(&self) -> u32 {
        self.units[self.mater.index()]
            .iter()
            .filter(|u| !u.used && u.walk != Walk::King)
            .count() as u32
    }

    fn place(s: &mut Solver, unit: &Unit, walk: Walk, sq: Square) {
        s.position.occupy_square(sq, walk, unit.flags, unit.id);
    }

    /// More checks than the goal allows, or kings touching.
    fn illegal_checks(&self, s: &Solver) -> bool {
        let pos = &s.position;
        let victim_king = pos.king_square(self.victim);
        let mater_king = pos.king_square(self.mater);
        if !mater_king.is_none() && victim_king.king_distance(mater_king) <= 1 {
            return true;
        }
        let checks = pos
            .pieces_of(self.mater)
            .filter(|&(sq, ..)| piece_attacks(pos, sq, victim_king))
            .count();
        let allowed = if self.goal == Goal::Mate { 1 } else { 0 };
        checks > allowed
    }

    /// The victim, about to move, may not have the mater's king in check.
    fn victim_checks_mater(&self, s: &Solver) -> bool {
        !s.position.king_square(self.mater).is_none() && is_in_check(&s.position, self.mater)
    }

    /// Does a `walk` on `sq` attack the victim's king or one of its flights?
    /// The king is lifted so that lines through it count.
    fn impacts(&self, s: &mut Solver, walk: Walk, sq: Square) -> bool {
        let king = s.position.king_square(self.victim);
        if walk_attacks(&s.position, walk, self.mater, sq, king) {
            return true;
        }
        let (king_walk, flags, id) = (
            s.position.walk(king),
            s.position.flags(king),
            s.position.piece_id(king),
        );
        s.position.empty_square(king);
        let hit = QUEEN_DIRS
            .iter()
            .map(|&d| king.offset(d))
            .filter(|&flight| flight.is_on_board() && !s.position.is_hole(flight))
            .any(|flight| walk_attacks(&s.position, walk, self.mater, sq, flight));
        s.position.occupy_square(king, king_walk, flags, id);
        hit
    }

    fn place_victim_king(&mut self, s: &mut Solver) {
        let victim = self.victim;
        let king = self.unit(victim, 0);
        self.set_used(victim, 0, true);
        for sq in Square::all() {
            if s.position.is_hole(sq) {
                continue;
            }
            let time = self.cost(victim, &king, Walk::King, sq, None);
            if time <= self.moves_left[victim.index()] {
                Self::place(s, &king, Walk::King, sq);
                let budget = Budget {
                    mater: self.moves_left[self.mater.index()],
                    victim: self.moves_left[victim.index()] - time,
                    mater_captures: 0,
                    victim_captures: 0,
                };
                match self.goal {
                    Goal::Mate => self.place_checker(s, budget),
                    _ => self.guard_flights(s, 0, budget),
                }
                s.position.empty_square(sq);
            }
            if s.poll_time() {
                break;
            }
        }
        self.set_used(victim, 0, false);
    }

    fn place_checker(&mut self, s: &mut Solver, budget: Budget) {
        let mater = self.mater;
        let king = s.position.king_square(self.victim);
        for index in 0..self.units[mater.index()].len() {
            let unit = self.unit(mater, index);
            if unit.walk == Walk::King {
                continue;
            }
            self.set_used(mater, index, true);
            self.checker = Some(index);
            for sq in Square::all() {
                if !s.position.is_empty(sq) {
                    continue;
                }
                for &walk in shapes(&unit) {
                    if !may_stand(walk, mater, sq) {
                        continue;
                    }
                    let time = self.placement_cost(s, mater, &unit, walk, sq, Some(king));
                    if time > budget.mater || !walk_attacks(&s.position, walk, mater, sq, king) {
                        continue;
                    }
                    Self::place(s, &unit, walk, sq);
                    let budget = Budget {
                        mater: budget.mater - time,
                        mater_captures: budget.mater_captures + file_changes(&unit, walk, sq),
                        ..budget
                    };
                    self.guard_flights(s, 0, budget);
                    s.position.empty_square(sq);
                }
            }
            self.checker = None;
            self.set_used(mater, index, false);
            if s.poll_time() {
                break;
            }
        }
    }

    /// Give mater piece `index` and its successors a place guarding the
    /// king's surroundings, or leave them out.
    fn guard_flights(&mut self, s: &mut Solver, index: usize, budget: Budget) {
        if budget.mater_captures + 1 > self.victim_count() || s.poll_time() {
            return;
        }
        let index = if Some(index) == self.checker {
            index + 1
        } else {
            index
        };
        let mater = self.mater;
        if index >= self.units[mater.index()].len() {
            if self.goal == Goal::Stalemate || is_in_check(&s.position, self.victim) {
                self.finalise_guarding(s, budget);
            }
            return;
        }

        let unit = self.unit(mater, index);
        let king = s.position.king_square(self.victim);
        self.set_used(mater, index, true);
        for sq in Square::all() {
            if !s.position.is_empty(sq) || (unit.walk == Walk::King && sq.king_distance(king) <= 1)
            {
                continue;
            }
            for &walk in shapes(&unit) {
                if !may_stand(walk, mater, sq) {
                    continue;
                }
                let time = self.placement_cost(s, mater, &unit, walk, sq, None);
                if time > budget.mater || !self.impacts(s, walk, sq) {
                    continue;
                }
                Self::place(s, &unit, walk, sq);
                if !self.illegal_checks(s) {
                    let budget = Budget {
                        mater: budget.mater - time,
                        mater_captures: budget.mater_captures + file_changes(&unit, walk, sq),
                        ..budget
                    };
                    self.guard_flights(s, index + 1, budget);
                }
                s.position.empty_square(sq);
            }
        }
        self.set_used(mater, index, false);
        self.guard_flights(s, index + 1, budget);
    }

    /// Squares the victim's king can still go to, or `None` if it can
    /// capture its way out.
    fn flights(&self, s: &Solver) -> Option<Vec<Square>> {
        let pos = &s.position;
        let king = pos.king_square(self.victim);
        let mut flights = Vec::new();
        for mv in legal_moves(pos, self.victim, Square::NONE) {
            if mv.from != king {
                continue;
            }
            if mv.is_capture() {
                return None;
            }
            if !flights.contains(&mv.to) {
                flights.push(mv.to);
            }
        }
        Some(flights)
    }

    /// Fewest moves any victim piece needs to block `sq`.
    fn moves_to_block(&self, sq: Square) -> u32 {
        let victim = self.victim;
        self.units[victim.index()]
            .iter()
            .filter(|unit| unit.walk != Walk::King)
            .flat_map(|unit| {
                shapes(unit)
                    .iter()
                    .filter(move |&&walk| may_stand(walk, victim, sq))
                    .map(move |&walk| self.cost(victim, unit, walk, sq, None))
            })
            .min()
            .unwrap_or(super::froto::UNREACHABLE)
    }

    fn finalise_guarding(&mut self, s: &mut Solver, budget: Budget) {
        let mater = self.mater;
        let king = self.unit(mater, 0);
        let idle_king = king.walk == Walk::King && !king.used && budget.mater == 0;
        if !idle_king {
            self.block_flights(s, budget);
            return;
        }
        // a king without moves stays where it started, unless it castles
        // along with a rook that already took its castled square
        let victim_king = s.position.king_square(self.victim);
        let mut squares = vec![king.square];
        squares.extend(
            [true, false]
                .into_iter()
                .filter_map(|king_side| castling_squares(mater, king_side))
                .map(|[_, king_to, ..]| king_to)
                .filter(|&to| self.castles_with_partner(s, mater, &king, Walk::King, to)),
        );
        self.set_used(mater, 0, true);
        for sq in squares {
            if !s.position.is_empty(sq) || sq.king_distance(victim_king) <= 1 {
                continue;
            }
            Self::place(s, &king, Walk::King, sq);
            if !self.illegal_checks(s) {
                self.block_flights(s, budget);
            }
            s.position.empty_square(sq);
        }
        self.set_used(mater, 0, false);
    }

    fn block_flights(&mut self, s: &mut Solver, budget: Budget) {
        let Some(flights) = self.flights(s) else {
            return;
        };
        if budget.mater_captures + flights.len() as u32 >= self.victim_count() {
            return;
        }
        let minimum: Vec<u32> = flights.iter().map(|&sq| self.moves_to_block(sq)).collect();
        let total = minimum.iter().fold(0u32, |acc, &m| acc.saturating_add(m));
        if total > budget.victim {
            return;
        }
        let budget = Budget {
            victim: budget.victim - total,
            victim_captures: self.unused_mater_pieces(),
            ..budget
        };
        self.block(s, &flights, &minimum, flights.len(), budget);
    }

    /// Put victim pieces on the first `count` flights.
    fn block(&mut self, s: &mut Solver, flights: &[Square], minimum: &[u32], count: usize, budget: Budget) {
        if s.poll_time() {
            return;
        }
        let Some(count) = count.checked_sub(1) else {
            self.conclude(s, budget);
            return;
        };
        let sq = flights[count];
        if !s.position.is_empty(sq) {
            self.block(s, flights, minimum, count, budget);
            return;
        }
        let victim = self.victim;
        for index in 0..self.units[victim.index()].len() {
            let unit = self.unit(victim, index);
            if unit.used || unit.walk == Walk::King {
                continue;
            }
            self.set_used(victim, index, true);
            for &walk in shapes(&unit) {
                if !may_stand(walk, victim, sq) {
                    continue;
                }
                let wasted = self.cost(victim, &unit, walk, sq, None).saturating_sub(minimum[count]);
                let captures = file_changes(&unit, walk, sq);
                if wasted > budget.victim || captures > budget.victim_captures {
                    continue;
                }
                Self::place(s, &unit, walk, sq);
                if !self.victim_checks_mater(s) {
                    let budget = Budget {
                        victim: budget.victim - wasted,
                        victim_captures: budget.victim_captures - captures,
                        ..budget
                    };
                    self.block(s, flights, minimum, count, budget);
                }
                s.position.empty_square(sq);
            }
            self.set_used(victim, index, false);
        }
    }

    /// The picture is complete as far as flights go; see whether the goal
    /// is reached or what still moves.
    fn conclude(&mut self, s: &mut Solver, budget: Budget) {
        if s.poll_time() {
            return;
        }
        match self.goal {
            Goal::Mate => {
                if is_in_check(&s.position, self.victim) {
                    self.store_mate(s, budget);
                }
            }
            _ => {
                if is_in_check(&s.position, self.victim) {
                    return;
                }
                if is_stalemate(&s.position, self.victim) {
                    self.store_stalemate(s, budget);
                } else {
                    self.neutralise(s, budget);
                }
            }
        }
    }

    fn store_mate(&mut self, s: &mut Solver, budget: Budget) {
        if !is_mate(&s.position, self.victim) {
            self.neutralise(s, budget);
            return;
        }
        if self.is_redundant(s) {
            return;
        }
        if self.victim_checks_mater(s) {
            self.shield_mater_king(s, budget);
            return;
        }
        self.verify(s);
    }

    fn store_stalemate(&mut self, s: &mut Solver, budget: Budget) {
        if self.victim_checks_mater(s) {
            self.shield_mater_king(s, budget);
            return;
        }
        let victim = self.victim;
        let unused: Vec<usize> = (0..self.units[victim.index()].len())
            .filter(|&i| !self.units[victim.index()][i].used)
            .collect();
        if let Some(&first) = unused.first() {
            self.depose(s, first, budget);
        }
        // the rest of the victim's army has to be captured on the way
        if unused.len() as u32 <= self.moves_left[self.mater.index()] {
            self.verify(s);
        }
    }

    /// Stand an unused victim piece somewhere it ends up immobile.
    fn depose(&mut self, s: &mut Solver, index: usize, budget: Budget) {
        let victim = self.victim;
        let unit = self.unit(victim, index);
        self.set_used(victim, index, true);
        for sq in Square::all() {
            if !s.position.is_empty(sq) {
                continue;
            }
            for &walk in shapes(&unit) {
                if !may_stand(walk, victim, sq) {
                    continue;
                }
                let time = self.placement_cost(s, victim, &unit, walk, sq, None);
                let captures = file_changes(&unit, walk, sq);
                if time > budget.victim || captures > budget.victim_captures {
                    continue;
                }
                Self::place(s, &unit, walk, sq);
                if !self.victim_checks_mater(s) {
                    let budget = Budget {
                        victim: budget.victim - time,
                        victim_captures: budget.victim_captures - captures,
                        ..budget
                    };
                    // a piece that can still move gets pinned or blocked
                    self.conclude(s, budget);
                }
                s.position.empty_square(sq);
            }
            if s.poll_time() {
                break;
            }
        }
        self.set_used(victim, index, false);
    }

    /// A mate picture stays redundant-free: no mater piece apart from the
    /// king may be removable without losing the mate.
    fn is_redundant(&self, s: &mut Solver) -> bool {
        let spare: Vec<_> = s
            .position
            .pieces_of(self.mater)
            .filter(|&(_, _, flags, _)| !flags.contains(Flags::ROYAL))
            .collect();
        spare.into_iter().any(|(sq, walk, flags, id)| {
            s.position.empty_square(sq);
            let still_mate = is_mate(&s.position, self.victim);
            s.position.occupy_square(sq, walk, flags, id);
            still_mate
        })
    }

    /// Take away the victim's first legal move, by a pin, an interposition
    /// or a block of the arrival square.
    fn neutralise(&mut self, s: &mut Solver, budget: Budget) {
        let Some(mv) = first_legal_move(&s.position, self.victim) else {
            return;
        };
        let walk = s.position.walk(mv.from);
        if walk == Walk::King {
            if !mv.is_capture() && s.position.is_empty(mv.to) {
                self.victim_piece_to(s, mv.to, budget);
            }
            return;
        }

        self.pin(s, mv.from, budget);
        let long = walk.is_rider() || mv.kind == MoveKind::DoubleStep;
        if long {
            if let Some(dir) = mv.from.line_direction(mv.to) {
                let mut sq = mv.from.offset(dir);
                while sq != mv.to {
                    self.victim_piece_to(s, sq, budget);
                    self.mater_piece_to(s, sq, budget);
                    sq = sq.offset(dir);
                }
            }
        }
        if !mv.is_capture() && s.position.is_empty(mv.to) {
            self.victim_piece_to(s, mv.to, budget);
            if walk == Walk::Pawn {
                self.mater_piece_to(s, mv.to, budget);
            }
        }
    }

    /// Pin the victim piece on `pinned` against its king with an unused
    /// mater rider.
    fn pin(&mut self, s: &mut Solver, pinned: Square, budget: Budget) {
        let king = s.position.king_square(self.victim);
        let Some(dir) = king.line_direction(pinned) else {
            return;
        };
        if !is_clear_between(&s.position, king, pinned, dir) {
            return;
        }
        let pinner = if ROOK_DIRS.contains(&dir) {
            Walk::Rook
        } else {
            Walk::Bishop
        };
        let mater = self.mater;
        let mut sq = pinned.offset(dir);
        while s.position.is_empty(sq) {
            for index in 0..self.units[mater.index()].len() {
                let unit = self.unit(mater, index);
                if unit.used || unit.walk == Walk::King {
                    continue;
                }
                for &walk in shapes(&unit) {
                    if walk != Walk::Queen && walk != pinner {
                        continue;
                    }
                    let time = self.placement_cost(s, mater, &unit, walk, sq, None);
                    if time > budget.mater {
                        continue;
                    }
                    Self::place(s, &unit, walk, sq);
                    self.set_used(mater, index, true);
                    if !self.illegal_checks(s) {
                        let budget = Budget {
                            mater: budget.mater - time,
                            ..budget
                        };
                        self.conclude(s, budget);
                    }
                    self.set_used(mater, index, false);
                    s.position.empty_square(sq);
                }
            }
            sq = sq.offset(dir);
        }
    }

    fn victim_piece_to(&mut self, s: &mut Solver, sq: Square, budget: Budget) {
        let victim = self.victim;
        for index in 0..self.units[victim.index()].len() {
            let unit = self.unit(victim, index);
            if unit.used || unit.walk == Walk::King {
                continue;
            }
            self.set_used(victim, index, true);
            for &walk in shapes(&unit) {
                if !may_stand(walk, victim, sq) {
                    continue;
                }
                let time = self.placement_cost(s, victim, &unit, walk, sq, None);
                let captures = file_changes(&unit, walk, sq);
                if time > budget.victim || captures > budget.victim_captures {
                    continue;
                }
                Self::place(s, &unit, walk, sq);
                if !self.victim_checks_mater(s) {
                    let budget = Budget {
                        victim: budget.victim - time,
                        victim_captures: budget.victim_captures - captures,
                        ..budget
                    };
                    self.conclude(s, budget);
                }
                s.position.empty_square(sq);
            }
            self.set_used(victim, index, false);
        }
    }

    /// Put a mater piece on `sq`, the king included: it blocks a pawn or
    /// closes a line as well as any other piece.
    fn mater_piece_to(&mut self, s: &mut Solver, sq: Square, budget: Budget) {
        let mater = self.mater;
        let victim_king = s.position.king_square(self.victim);
        for index in 0..self.units[mater.index()].len() {
            let unit = self.unit(mater, index);
            if unit.used || (unit.walk == Walk::King && sq.king_distance(victim_king) <= 1) {
                continue;
            }
            self.set_used(mater, index, true);
            for &walk in shapes(&unit) {
                if !may_stand(walk, mater, sq) {
                    continue;
                }
                let time = self.placement_cost(s, mater, &unit, walk, sq, None);
                let captures = file_changes(&unit, walk, sq);
                if time > budget.mater || budget.mater_captures + captures + 1 > self.victim_count() {
                    continue;
                }
                Self::place(s, &unit, walk, sq);
                if !self.illegal_checks(s) {
                    let budget = Budget {
                        mater: budget.mater - time,
                        mater_captures: budget.mater_captures + captures,
                        ..budget
                    };
                    self.conclude(s, budget);
                }
                s.position.empty_square(sq);
            }
            self.set_used(mater, index, false);
        }
    }

    /// The mater's king stands in check: interpose on the checking line.
    fn shield_mater_king(&mut self, s: &mut Solver, budget: Budget) {
        let king = s.position.king_square(self.mater);
        let checker = s
            .position
            .pieces_of(self.victim)
            .find(|&(sq, ..)| piece_attacks(&s.position, sq, king));
        let Some((from, walk, ..)) = checker else {
            return;
        };
        if !walk.is_rider() {
            return;
        }
        let Some(dir) = from.line_direction(king) else {
            return;
        };
        let mut sq = from.offset(dir);
        while sq != king {
            self.victim_piece_to(s, sq, budget);
            self.mater_piece_to(s, sq, budget);
            sq = sq.offset(dir);
        }
    }

    /// Hand the picture on the board to the forward search.
    fn verify(&mut self, s: &mut Solver) {
        if let Err(err) = s.tracker.bump_constructions("intelligent") {
            s.limit_reached(err);
            return;
        }
        self.candidates += 1;
        let checker = self.checker.map(|index| self.unit(self.mater, index).id);
        let candidate = Candidate::of(&s.position, self.goal, self.mater, checker);
        trace!(pieces = candidate.targets.len(), "candidate");
        s.intelligent.begin_candidate(candidate, self.moves_left);
        s.clear_hash();
        let r = {
            let mut start = PositionSwap::new(s, self.initial.clone());
            start.solve(self.entry, self.n)
        };
        s.intelligent.end_candidate();
        if is_solved(r, self.n) {
            self.found = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        Square::parse(s).unwrap()
    }

    #[test]
    fn the_king_comes_first_among_the_units() {
        let mut pos = Position::empty();
        pos.add_piece(sq("a2"), Walk::Pawn, Side::White, Flags::NONE);
        pos.add_piece(sq("h1"), Walk::Rook, Side::White, Flags::NONE);
        pos.add_piece(sq("e1"), Walk::King, Side::White, Flags::ROYAL);
        let units = units_of(&pos, Side::White);
        assert_eq!(units.len(), 3);
        assert_eq!(units[0].walk, Walk::King);
        assert!(units.iter().all(|u| !u.used));
    }

    #[test]
    fn pawns_stand_between_the_second_and_seventh_ranks() {
        assert!(may_stand(Walk::Pawn, Side::White, sq("e2")));
        assert!(!may_stand(Walk::Pawn, Side::White, sq("e8")));
        assert!(!may_stand(Walk::Pawn, Side::Black, sq("e8")));
        assert!(may_stand(Walk::Rook, Side::Black, sq("e8")));
    }

    #[test]
    fn pawn_file_changes_count_as_captures_unless_promoted() {
        let unit = Unit {
            id: PieceId(1),
            walk: Walk::Pawn,
            flags: Flags::of_side(Side::White),
            square: sq("c2"),
            used: false,
        };
        assert_eq!(file_changes(&unit, Walk::Pawn, sq("e4")), 2);
        assert_eq!(file_changes(&unit, Walk::Queen, sq("e4")), 0);
        assert_eq!(shapes(&unit).len(), 5);
    }
}
