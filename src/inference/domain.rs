//! Request and response shapes for single-report inference.

use serde::{Deserialize, Serialize};

use crate::common::error::{PredictError, PredictResult};

/// `sleepHours` arrives as text from form fields but numbers are accepted too.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SleepHours {
    Number(f64),
    Text(String),
}

impl SleepHours {
    pub fn value(&self) -> PredictResult<f64> {
        match self {
            SleepHours::Number(v) => Ok(*v),
            SleepHours::Text(raw) => raw.trim().parse::<f64>().map_err(|_| {
                PredictError::malformed(format!("could not convert string to float: '{raw}'"))
            }),
        }
    }
}

/// One symptom report as submitted by the caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymptomRequest {
    pub primary_symptoms: String,
    pub severity_level: String,
    pub affected_body_parts: String,
    pub sleep_hours: SleepHours,
    #[serde(default)]
    pub travel_history: Option<String>,
    #[serde(default)]
    pub exposure: Option<String>,
}

impl SymptomRequest {
    /// Parse a JSON request. Missing or mistyped fields are `MalformedInput`.
    pub fn from_json(raw: &str) -> PredictResult<Self> {
        serde_json::from_str(raw).map_err(|e| PredictError::malformed(e.to_string()))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TopPrediction {
    pub disease: String,
    /// Percentage in `[0, 100]`, rounded to two decimals.
    pub probability: f64,
}

/// Successful inference output.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    pub top_predictions: Vec<TopPrediction>,
    pub recommendation: String,
}

/// Failure payload. Never carries partial predictions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error: String,
    pub details: String,
}

impl ErrorPayload {
    pub const PREDICTION_FAILED: &'static str = "Prediction failed";

    pub fn prediction_failed(err: &PredictError) -> Self {
        Self {
            error: Self::PREDICTION_FAILED.to_string(),
            details: err.to_string(),
        }
    }
}
