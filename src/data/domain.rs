//! Historical dataset definitions and contracts.

use std::path::Path;

use crate::common::error::PredictResult;
use crate::features::{ReportFields, SymptomVocabulary};

pub const DISEASE: &str = "Disease";

/// One cleaned historical row: the raw report fields plus the ground truth.
#[derive(Clone, Debug, PartialEq)]
pub struct HistoricalRecord {
    pub severity: String,
    pub body_part: String,
    pub sleep_hours: f64,
    pub travel_history: String,
    pub exposure: String,
    /// Presence per dataset symptom column, indexed like `Dataset::symptoms`.
    pub symptoms: Vec<bool>,
    pub disease: String,
}

/// Parsed historical dataset.
#[derive(Clone, Debug)]
pub struct Dataset {
    /// Bare symptom ids from the `has_<symptom>` columns, in column order.
    pub symptoms: Vec<String>,
    pub records: Vec<HistoricalRecord>,
    /// FNV-1a hex digest of the raw file bytes.
    pub fingerprint: String,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Vocabulary established by this dataset's symptom columns.
    pub fn vocabulary(&self) -> SymptomVocabulary {
        SymptomVocabulary::new(self.symptoms.iter().cloned())
    }
}

impl HistoricalRecord {
    /// Raw report fields for derivation, with flags taken from the symptom columns.
    pub fn report_fields(&self, symptom_ids: &[String], vocabulary: &SymptomVocabulary) -> ReportFields {
        let values = symptom_ids
            .iter()
            .map(String::as_str)
            .zip(self.symptoms.iter().copied());
        ReportFields {
            symptoms: vocabulary.flags_from_values(values),
            severity: self.severity.clone(),
            body_part: self.body_part.clone(),
            sleep_hours: self.sleep_hours,
            travel_history: Some(self.travel_history.clone()),
            exposure: Some(self.exposure.clone()),
        }
    }
}

/// Repository contract for historical datasets.
pub trait DataRepo {
    fn load_dataset(&self, path: &Path) -> PredictResult<Dataset>;
}
