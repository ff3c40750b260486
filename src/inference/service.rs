//! Service layer running one report through a loaded bundle.

use crate::common::error::PredictResult;
use crate::features::{derive, ReportFields};
use crate::training::domain::{Classifier, ModelBundle};

use super::domain::{PredictionResult, SymptomRequest};
use super::rank::{rank, recommend, TOP_K};

/// Turn a request into the raw fields derivation expects. Fails before any
/// feature work if the request is malformed.
pub fn report_fields<C: Classifier>(
    bundle: &ModelBundle<C>,
    request: &SymptomRequest,
) -> PredictResult<ReportFields> {
    let sleep_hours = request.sleep_hours.value()?;
    Ok(ReportFields {
        symptoms: bundle.vocabulary.flags_for(&request.primary_symptoms),
        severity: request.severity_level.clone(),
        body_part: request.affected_body_parts.clone(),
        sleep_hours,
        travel_history: request.travel_history.clone(),
        exposure: request.exposure.clone(),
    })
}

/// Aligned classifier input for a request.
pub fn feature_row<C: Classifier>(
    bundle: &ModelBundle<C>,
    request: &SymptomRequest,
) -> PredictResult<Vec<f64>> {
    let fields = report_fields(bundle, request)?;
    let features = derive(&fields, bundle.feature_context());
    Ok(bundle.feature_columns.align(&features))
}

/// Predict the top diseases for one request.
pub fn infer<C: Classifier>(
    bundle: &ModelBundle<C>,
    request: &SymptomRequest,
) -> PredictResult<PredictionResult> {
    let row = feature_row(bundle, request)?;
    let probs = bundle.model.predict_proba(&row);
    let top_predictions = rank(&probs, &bundle.label_decoder, TOP_K);
    let recommendation = recommend(&top_predictions).to_string();
    tracing::debug!(
        top = ?top_predictions.first().map(|t| &t.disease),
        "inference complete"
    );
    Ok(PredictionResult {
        top_predictions,
        recommendation,
    })
}
