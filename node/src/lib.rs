//! Relaywatch batch pipeline.
//!
//! One run fetches every configured feed, reconciles them into nodes and operators, and derives
//! the network statistics, intelligence, reliability and leaderboard sections of a single
//! [`ComputedBundle`]. The binary in `main.rs` wraps [`command::run`].

pub mod bundle;
pub mod cli;
pub mod command;
pub mod pipeline;

pub use bundle::{ComputedBundle, RunSignal, Section};
pub use pipeline::{compute, run_once, Pipeline, RunError};
