//! Process-facing entry points used by the binaries.

pub mod entry;

pub use entry::{predict_from, predict_json, predict_with, Outcome, EXIT_FAILURE, EXIT_OK};
