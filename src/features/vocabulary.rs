//! Fixed, ordered set of symptom identifiers recognised by a trained model.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Column prefix marking a symptom flag in datasets and feature schemas.
pub const SYMPTOM_PREFIX: &str = "has_";

/// Ordered symptom vocabulary with a stable id → index lookup table.
///
/// Symptom ids are stored without the `has_` prefix (`"chest_pain"`), in the
/// order their columns appeared in the training data.
#[derive(Clone, Debug)]
pub struct SymptomVocabulary {
    ids: Vec<String>,
    index: HashMap<String, usize>,
}

/// Presence flags for every vocabulary entry, indexed like the vocabulary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SymptomFlags(Vec<u8>);

impl SymptomVocabulary {
    /// Build from bare symptom ids. Later duplicates are ignored.
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ordered = Vec::new();
        let mut index = HashMap::new();
        for id in ids {
            let id = id.into();
            if !index.contains_key(&id) {
                index.insert(id.clone(), ordered.len());
                ordered.push(id);
            }
        }
        Self { ids: ordered, index }
    }

    /// Build from dataset or schema column names, keeping only `has_<symptom>` columns.
    pub fn from_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ids: Vec<String> = columns
            .into_iter()
            .filter_map(|c| c.as_ref().strip_prefix(SYMPTOM_PREFIX).map(str::to_string))
            .filter(|id| !id.is_empty())
            .collect();
        Self::new(ids)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Feature column names (`has_<symptom>`) in vocabulary order.
    pub fn column_names(&self) -> impl Iterator<Item = String> + '_ {
        self.ids.iter().map(|id| format!("{SYMPTOM_PREFIX}{id}"))
    }

    /// All-zero flag set.
    pub fn empty_flags(&self) -> SymptomFlags {
        SymptomFlags(vec![0; self.ids.len()])
    }

    /// Flags from free text: comma separated, trimmed, lower-cased, spaces
    /// turned into underscores. Tokens outside the vocabulary are ignored.
    pub fn flags_for(&self, symptom_text: &str) -> SymptomFlags {
        let mut flags = self.empty_flags();
        for token in symptom_text.split(',') {
            let id = token.trim().to_lowercase().replace(' ', "_");
            if let Some(pos) = self.position(&id) {
                flags.0[pos] = 1;
            }
        }
        flags
    }

    /// Flags from already-decided per-symptom values, as read from training rows.
    pub fn flags_from_values<'a, I>(&self, values: I) -> SymptomFlags
    where
        I: IntoIterator<Item = (&'a str, bool)>,
    {
        let mut flags = self.empty_flags();
        for (id, present) in values {
            if let (Some(pos), true) = (self.position(id), present) {
                flags.0[pos] = 1;
            }
        }
        flags
    }
}

impl PartialEq for SymptomVocabulary {
    fn eq(&self, other: &Self) -> bool {
        self.ids == other.ids
    }
}

impl Eq for SymptomVocabulary {}

impl Serialize for SymptomVocabulary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.ids.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SymptomVocabulary {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let ids = Vec::<String>::deserialize(deserializer)?;
        Ok(Self::new(ids))
    }
}

impl SymptomFlags {
    pub fn get(&self, pos: usize) -> u8 {
        self.0.get(pos).copied().unwrap_or(0)
    }

    /// Number of flagged symptoms.
    pub fn count(&self) -> u32 {
        self.0.iter().map(|&f| u32::from(f)).sum()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab() -> SymptomVocabulary {
        SymptomVocabulary::from_columns([
            "Severity_Level",
            "has_cough",
            "has_fever",
            "has_chest_pain",
            "Disease",
            "has_headache",
        ])
    }

    #[test]
    fn keeps_only_prefixed_columns_in_order() {
        let v = vocab();
        assert_eq!(v.ids(), &["cough", "fever", "chest_pain", "headache"]);
        assert_eq!(
            v.column_names().collect::<Vec<_>>(),
            vec!["has_cough", "has_fever", "has_chest_pain", "has_headache"]
        );
    }

    #[test]
    fn free_text_is_normalised_before_lookup() {
        let flags = vocab().flags_for(" Cough ,CHEST PAIN, sneezing,,");
        assert_eq!(flags.as_slice(), &[1, 0, 1, 0]);
        assert_eq!(flags.count(), 2);
    }

    #[test]
    fn empty_text_leaves_every_flag_zero() {
        let flags = vocab().flags_for("");
        assert_eq!(flags.as_slice().len(), 4);
        assert_eq!(flags.count(), 0);
    }

    #[test]
    fn repeated_symptom_counts_once() {
        assert_eq!(vocab().flags_for("fever, fever, Fever").count(), 1);
    }

    #[test]
    fn serialises_as_plain_id_list() {
        let json = serde_json::to_string(&vocab()).unwrap();
        assert_eq!(json, r#"["cough","fever","chest_pain","headache"]"#);
        let back: SymptomVocabulary = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vocab());
        assert_eq!(back.position("headache"), Some(3));
    }
}
