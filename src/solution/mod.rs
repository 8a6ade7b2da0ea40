//! Solution records and JSON reports.
//!
//! A solution is recorded at the moment the solver reaches the goal, straight
//! from the journal:
//! - every ply from the key (or first help move) to the goal move
//! - the effects each ply had beyond the plain movement (rebirths, changes)
//! - a snapshot of the final position
//!
//! Reports bundle the solutions of every twin and can be written to and read
//! back from disk (see `src/bin/solve.rs`).

use std::fmt;
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::chess::moves::{Move, MoveKind};
use crate::core::piece::{Flags, Side, Walk};
use crate::core::position::Position;
use crate::core::square::Square;
use crate::journal::{Effect, Journal, Ply, Reason, CAPTURE_OFFSET, MOVEMENT_OFFSET};
use crate::problem::{ResourceCounts, SolveError};
use crate::solving::Interruption;

const FORMAT_VERSION: u32 = 1;

/// One half-move of a solution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub side: Side,
    pub from: String,
    pub to: String,
    /// Letter of the moving piece (`P` for pawns).
    pub walk: char,
    /// Captured piece as `"bRa8"`, if any.
    pub captured: Option<String>,
    /// Rules that contributed effects to this ply, in journal order.
    pub effects: Vec<Reason>,
    /// Human readable form, e.g. `"Rh1-h8"` or `"Rc1xc8[+bRa8]"`.
    pub text: String,
}

/// Pieces of a position in `"Kb6"` / `"cQd1"` notation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    pub white: Vec<String>,
    pub black: Vec<String>,
}

/// A defense against a battle key and the attacker's answer to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variation {
    pub defense: MoveRecord,
    /// `None` when the defense itself ends the play (self and reflex goals).
    pub continuation: Option<MoveRecord>,
}

/// A solution line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
    pub moves: Vec<MoveRecord>,
    pub final_position: PositionSnapshot,
    /// Found while solving the set play.
    #[serde(default)]
    pub set_play: bool,
    /// Battle play: the shortest continuations had the defender passed.
    #[serde(default)]
    pub threat: Vec<MoveRecord>,
    /// Battle play: every legal defense against the key.
    #[serde(default)]
    pub variations: Vec<Variation>,
}

impl Solution {
    /// The move texts, for comparisons in tests and logs.
    pub fn texts(&self) -> Vec<&str> {
        self.moves.iter().map(|m| m.text.as_str()).collect()
    }
}

impl Variation {
    pub fn text(&self) -> String {
        match &self.continuation {
            Some(reply) => format!("{} {}", self.defense.text, reply.text),
            None => self.defense.text.clone(),
        }
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.set_play {
            write!(f, "(set) ")?;
        }
        for (i, pair) in self.moves.chunks(2).enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}.{}", i + 1, pair[0].text)?;
            if let Some(second) = pair.get(1) {
                write!(f, " {}", second.text)?;
            }
        }
        Ok(())
    }
}

fn piece_text(side: Side, walk: Walk, flags: Flags, sq: Square) -> String {
    let colour = match side {
        Side::White => 'w',
        Side::Black => 'b',
    };
    let chameleon = if flags.contains(Flags::CHAMELEON) { "c" } else { "" };
    format!("{colour}{chameleon}{}{sq}", walk.letter())
}

fn side_of_flags(flags: Flags) -> Side {
    if flags.belongs_to(Side::White) {
        Side::White
    } else {
        Side::Black
    }
}

impl PositionSnapshot {
    pub fn of(pos: &Position) -> Self {
        let mut snapshot = Self::default();
        for (sq, walk, flags, _) in pos.pieces() {
            let chameleon = if flags.contains(Flags::CHAMELEON) { "c" } else { "" };
            let text = format!("{chameleon}{}{sq}", walk.letter());
            match side_of_flags(flags) {
                Side::White => snapshot.white.push(text),
                Side::Black => snapshot.black.push(text),
            }
        }
        snapshot
    }
}

impl MoveRecord {
    /// Describe what `mv`, played by `side` in `ply`, did to the board.
    pub fn from_ply(journal: &Journal, ply: Ply, side: Side, mv: Move) -> Self {
        let mut walk = Walk::Pawn;
        let mut captured = None;
        let mut effects = Vec::new();
        let mut notes = String::new();

        for (offset, entry) in journal.ply_entries(ply).iter().enumerate() {
            let reason = entry.reason;
            if !matches!(reason, Reason::NoCapture | Reason::Moving | Reason::CastlingRights)
                && !effects.contains(&reason)
            {
                effects.push(reason);
            }
            match entry.effect {
                Effect::Removal { on, walk: w, flags, .. } if offset == CAPTURE_OFFSET => {
                    captured = Some(piece_text(side_of_flags(flags), w, flags, on));
                }
                Effect::Movement { walk: w, .. } if offset == MOVEMENT_OFFSET => walk = w,
                Effect::Movement { from, to, .. } if reason != Reason::Castling => {
                    notes.push_str(&format!("[{from}->{to}]"));
                }
                Effect::Addition { on, walk: w, flags, .. } => {
                    notes.push_str(&format!("[+{}]", piece_text(side_of_flags(flags), w, flags, on)));
                }
                Effect::WalkChange { on, to, .. } if reason != Reason::Promotion => {
                    notes.push_str(&format!("[{on}={}]", to.letter()));
                }
                Effect::FlagsChange { on, from, to } => {
                    if to.contains(Flags::CHAMELEON) && !from.contains(Flags::CHAMELEON) {
                        notes.push_str(&format!("[{on}=c]"));
                    }
                }
                Effect::SideChange { on, to, .. } => {
                    let colour = if to.belongs_to(Side::White) { 'w' } else { 'b' };
                    notes.push_str(&format!("[{on}={colour}]"));
                }
                Effect::SquareBlock { on } => notes.push_str(&format!("[{on} hole]")),
                _ => {}
            }
        }

        let prefix = match mv.kind {
            MoveKind::CastleShort | MoveKind::CastleLong | MoveKind::Exchange => String::new(),
            _ if walk == Walk::Pawn => String::new(),
            _ => walk.letter().to_string(),
        };
        Self {
            side,
            from: mv.from.to_string(),
            to: mv.to.to_string(),
            walk: walk.letter(),
            captured,
            effects,
            text: format!("{prefix}{mv}{notes}"),
        }
    }
}

/// Outcome of one twin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwinReport {
    pub label: String,
    pub stipulation: String,
    pub conditions: Vec<String>,
    pub solutions: Vec<Solution>,
    pub interrupted: Option<Interruption>,
    pub counts: ResourceCounts,
}

/// Outcome of a whole problem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveReport {
    pub format_version: u32,
    pub created_unix_secs: u64,
    pub problem: String,
    pub twins: Vec<TwinReport>,
}

impl SolveReport {
    pub fn new(problem: impl Into<String>, twins: Vec<TwinReport>) -> Self {
        let created_unix_secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Self {
            format_version: FORMAT_VERSION,
            created_unix_secs,
            problem: problem.into(),
            twins,
        }
    }

    /// All solutions of all twins.
    pub fn solutions(&self) -> impl Iterator<Item = &Solution> {
        self.twins.iter().flat_map(|t| t.solutions.iter())
    }

    pub fn to_json(&self) -> Result<String, SolveError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json(&self, path: &Path) -> Result<(), SolveError> {
        let io_error = |source| SolveError::Io {
            path: path.display().to_string(),
            source,
        };
        let f = fs::File::create(path).map_err(io_error)?;
        let mut w = BufWriter::new(f);
        serde_json::to_writer_pretty(&mut w, self)?;
        w.flush().map_err(io_error)
    }

    pub fn read_json(path: &Path) -> Result<SolveReport, SolveError> {
        let f = fs::File::open(path).map_err(|source| SolveError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let report: SolveReport = serde_json::from_reader(BufReader::new(f))?;
        if report.format_version != FORMAT_VERSION {
            return Err(SolveError::InvalidProblem {
                reason: format!(
                    "unsupported report format_version {} (expected {FORMAT_VERSION})",
                    report.format_version
                ),
            });
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chess::execution::play_move;

    fn sq(s: &str) -> Square {
        Square::parse(s).unwrap()
    }

    #[test]
    fn capture_is_recorded_with_piece_letters() {
        let mut pos = Position::empty();
        pos.add_piece(sq("c1"), Walk::Rook, Side::White, Flags::NONE);
        pos.add_piece(sq("c8"), Walk::Bishop, Side::Black, Flags::NONE);
        let mut journal = Journal::new();
        let ply = journal.open_ply();
        let mv = Move::capturing(sq("c1"), sq("c8"));
        play_move(&mut journal, &mut pos, mv);

        let record = MoveRecord::from_ply(&journal, ply, Side::White, mv);
        assert_eq!(record.text, "Rc1xc8");
        assert_eq!(record.captured.as_deref(), Some("bBc8"));
        assert_eq!(record.effects, vec![Reason::Capture]);

        let snapshot = PositionSnapshot::of(&pos);
        assert_eq!(snapshot.white, vec!["Rc8".to_string()]);
        assert!(snapshot.black.is_empty());
    }

    #[test]
    fn report_survives_a_json_round_trip() {
        let report = SolveReport::new(
            "empty",
            vec![TwinReport {
                label: String::new(),
                stipulation: "#1".to_string(),
                conditions: Vec::new(),
                solutions: Vec::new(),
                interrupted: Some(Interruption::MaxTime),
                counts: ResourceCounts::default(),
            }],
        );
        let text = report.to_json().unwrap();
        let back: SolveReport = serde_json::from_str(&text).unwrap();
        assert_eq!(back.twins[0].interrupted, Some(Interruption::MaxTime));
        assert_eq!(back.problem, "empty");
    }
}
