//! Symptom-based disease prediction: feature pipeline, training and inference.

pub mod api;
pub mod common;
pub mod data;
pub mod evaluation;
pub mod features;
pub mod inference;
pub mod training;

pub use api::{predict_json, Outcome};
pub use common::{ErrorCode, PredictError, PredictResult};
