//! Inference domain: request parsing, prediction and ranking for one report.

pub mod domain;
pub mod rank;
pub mod service;

pub use domain::{ErrorPayload, PredictionResult, SleepHours, SymptomRequest, TopPrediction};
pub use rank::{rank, recommend, Recommendation};
pub use service::infer;
