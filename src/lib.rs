//! A chess problem solver built around a graph of solving slices.
//!
//! Stipulations (direct, help, set play, quodlibet, reciprocal) are assembled
//! into a slice graph, fairy conditions are instrumented into it by rank
//! order, and every board change goes through a per-ply move-effect journal.
//! Help mates and stalemates can alternatively be solved by construction of
//! candidate final positions (intelligent mode).

pub mod core;
pub mod journal;
pub mod chess;
pub mod stipulation;
pub mod solving;
pub mod conditions;
pub mod intelligent;
pub mod problem;
pub mod problems;
pub mod solution;
