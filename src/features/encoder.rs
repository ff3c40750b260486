//! Bidirectional label ↔ code mapping fitted once per categorical field.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::common::error::{PredictError, PredictResult};

/// Immutable category encoder.
///
/// Codes are assigned in lexicographic (byte) order of the distinct labels
/// seen at fit time, so `classes()[code]` is the label for `code`. The same
/// value is passed by reference to training and inference, and it is what
/// gets persisted in the bundle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEncoder {
    field: String,
    classes: Vec<String>,
}

impl CategoryEncoder {
    /// Fit on any sequence of labels. Duplicates collapse.
    pub fn fit<I, S>(field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let distinct: BTreeSet<String> = values
            .into_iter()
            .map(|v| v.as_ref().to_string())
            .collect();
        Self {
            field: field.to_string(),
            classes: distinct.into_iter().collect(),
        }
    }

    /// Name of the field this encoder was fitted for, used in diagnostics.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Labels in code order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn contains(&self, value: &str) -> bool {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(value))
            .is_ok()
    }

    /// Code for `value`, or `UnseenCategory` if it was not present at fit time.
    pub fn encode(&self, value: &str) -> PredictResult<u32> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(value))
            .map(|idx| idx as u32)
            .map_err(|_| PredictError::UnseenCategory {
                field: self.field.clone(),
                value: value.to_string(),
            })
    }

    /// Encode, falling back to code 0 with a diagnostic warning.
    pub fn encode_or_default(&self, value: &str) -> u32 {
        match self.encode(value) {
            Ok(code) => code,
            Err(err) => {
                tracing::warn!("{err}; defaulting to 0");
                0
            }
        }
    }

    /// Label for a single code, if in range.
    pub fn label(&self, code: usize) -> Option<&str> {
        self.classes.get(code).map(String::as_str)
    }

    /// Recover labels for a sequence of codes.
    pub fn decode(&self, codes: &[usize]) -> PredictResult<Vec<&str>> {
        codes
            .iter()
            .map(|&code| {
                self.label(code).ok_or_else(|| PredictError::UnseenCategory {
                    field: self.field.clone(),
                    value: code.to_string(),
                })
            })
            .collect()
    }
}

pub const BODY_PART_FIELD: &str = "body part";
pub const SEVERITY_FIELD: &str = "severity";
pub const DISEASE_FIELD: &str = "disease";

/// Domain correction applied to body part text before encoding, identically
/// in training and inference: "stomach" (any case) becomes "Abdomen".
pub fn normalize_body_part(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("stomach") {
        "Abdomen".to_string()
    } else {
        trimmed.to_string()
    }
}
