//! Pattern and signal classification on the last two indicator rows.
//!
//! Both are single-shot: they read only the latest bar (and the one before it
//! for engulfing patterns) and carry no state between calls.

pub mod pattern;
pub mod vote;

pub use pattern::{classify, classify_tail, CandlePattern};
pub use vote::{Action, Ballot, Check, Signal, Strength, Vote, VoteTally};
