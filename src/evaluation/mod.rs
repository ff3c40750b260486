//! Evaluation of fitted classifiers on held-out data.

pub mod domain;
pub mod service;

pub use domain::{ClassMetrics, EvalReport};
