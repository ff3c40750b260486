//! Frozen feature column order and projection onto it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::derive::{FeatureVector, BASE_COLUMNS, ENGINEERED_COLUMNS};
use super::vocabulary::{SymptomVocabulary, SYMPTOM_PREFIX};
use crate::common::error::{PredictError, PredictResult};

/// Value used for schema columns the feature vector does not carry.
pub const FILL_VALUE: f64 = 0.0;

/// Ordered list of column names a trained classifier expects.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureSchema {
    columns: Vec<String>,
}

impl FeatureSchema {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Project `vector` onto the schema: schema order, missing columns are
    /// [`FILL_VALUE`], columns outside the schema are dropped.
    pub fn align(&self, vector: &FeatureVector) -> Vec<f64> {
        let lookup: HashMap<&str, f64> = vector.iter().collect();
        self.columns
            .iter()
            .map(|c| lookup.get(c.as_str()).copied().unwrap_or(FILL_VALUE))
            .collect()
    }

    /// Symptom vocabulary implied by the schema's `has_` columns.
    pub fn vocabulary(&self) -> SymptomVocabulary {
        SymptomVocabulary::from_columns(&self.columns)
    }

    /// Check the schema against a vocabulary: every base and engineered
    /// column is present and the `has_` columns equal the vocabulary, in order.
    pub fn validate(&self, vocabulary: &SymptomVocabulary) -> PredictResult<()> {
        for required in BASE_COLUMNS.iter().chain(ENGINEERED_COLUMNS.iter()) {
            if !self.columns.iter().any(|c| c == required) {
                return Err(PredictError::schema(format!(
                    "feature schema lacks column '{required}'"
                )));
            }
        }
        let implied = self.vocabulary();
        if &implied != vocabulary {
            return Err(PredictError::schema(format!(
                "feature schema has {} symptom columns, vocabulary has {}",
                self.columns
                    .iter()
                    .filter(|c| c.starts_with(SYMPTOM_PREFIX))
                    .count(),
                vocabulary.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::derive::feature_columns;

    fn schema(cols: &[&str]) -> FeatureSchema {
        FeatureSchema::new(cols.iter().map(|c| c.to_string()).collect())
    }

    #[test]
    fn align_fills_reorders_and_drops() {
        let mut fv = FeatureVector::default();
        fv.insert("b", 2.0);
        fv.insert("extra", 9.0);
        fv.insert("a", 1.0);

        let row = schema(&["a", "b", "c"]).align(&fv);
        assert_eq!(row, vec![1.0, 2.0, FILL_VALUE]);
    }

    #[test]
    fn align_width_always_matches_schema() {
        let s = schema(&["x", "y", "z", "w"]);
        assert_eq!(s.align(&FeatureVector::default()).len(), 4);
    }

    #[test]
    fn derived_schema_validates_against_its_vocabulary() {
        let vocab = SymptomVocabulary::new(["cough", "rash"]);
        let s = FeatureSchema::new(feature_columns(&vocab));
        assert!(s.validate(&vocab).is_ok());
        assert_eq!(s.vocabulary(), vocab);

        let other = SymptomVocabulary::new(["rash", "cough"]);
        assert!(matches!(
            s.validate(&other),
            Err(PredictError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn missing_engineered_column_is_rejected() {
        let vocab = SymptomVocabulary::new(["cough"]);
        let mut cols = feature_columns(&vocab);
        cols.retain(|c| c != "High_Risk_Flag");
        let err = FeatureSchema::new(cols).validate(&vocab).unwrap_err();
        assert!(err.to_string().contains("High_Risk_Flag"));
    }

    #[test]
    fn serialises_as_plain_list() {
        let s = schema(&["a", "b"]);
        assert_eq!(serde_json::to_string(&s).unwrap(), r#"["a","b"]"#);
    }
}
