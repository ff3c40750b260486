//! Process-level entry points. Every failure becomes the structured error
//! payload; nothing else reaches stdout.

use std::path::Path;

use serde::Serialize;

use crate::common::error::{PredictError, PredictResult};
use crate::inference::domain::{ErrorPayload, SymptomRequest};
use crate::inference::service::infer;
use crate::training::domain::{BundleRepo, Classifier, ModelBundle};
use crate::training::repo_fs::FsBundleRepo;

pub const EXIT_OK: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;

const FALLBACK_ERROR: &str =
    r#"{"error":"Prediction failed","details":"could not serialise response"}"#;

/// Text for stdout plus the process exit status.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outcome {
    pub payload: String,
    pub exit_code: i32,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        self.exit_code == EXIT_OK
    }

    fn success<T: Serialize>(value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(payload) => Self {
                payload,
                exit_code: EXIT_OK,
            },
            Err(err) => Self::failure(&PredictError::from(err)),
        }
    }

    fn failure(err: &PredictError) -> Self {
        tracing::error!(code = ?err.code(), "prediction failed: {err}");
        let payload = serde_json::to_string(&ErrorPayload::prediction_failed(err))
            .unwrap_or_else(|_| FALLBACK_ERROR.to_string());
        Self {
            payload,
            exit_code: EXIT_FAILURE,
        }
    }
}

fn predict_inner<C: Classifier>(bundle: &ModelBundle<C>, input: &str) -> PredictResult<Outcome> {
    let request = SymptomRequest::from_json(input)?;
    let result = infer(bundle, &request)?;
    Ok(Outcome::success(&result))
}

/// Run one raw JSON request against an already loaded bundle.
pub fn predict_with<C: Classifier>(bundle: &ModelBundle<C>, input: &str) -> Outcome {
    predict_inner(bundle, input).unwrap_or_else(|err| Outcome::failure(&err))
}

/// Load the bundle through `repo` and run one request.
pub fn predict_from(repo: &dyn BundleRepo, input: &str) -> Outcome {
    match repo.get_bundle() {
        Ok(bundle) => predict_with(&bundle, input),
        Err(err) => Outcome::failure(&err),
    }
}

/// Load the bundle from `bundle_dir` and run one request.
pub fn predict_json(bundle_dir: &Path, input: &str) -> Outcome {
    predict_from(&FsBundleRepo::new(bundle_dir), input)
}
