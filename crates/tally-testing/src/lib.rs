//! Testing infrastructure for tally integration tests.
//!
//! - `TestWorld`: isolated data directory plus a runner for the `tally` binary
//! - `fixtures`: detector logs as CSV, built from runs of counts
//! - `assertions`: checks over the CLI's JSON output

pub mod assertions;
pub mod fixtures;
pub mod world;

pub use fixtures::CountLog;
pub use world::{CliResult, TestWorld};
