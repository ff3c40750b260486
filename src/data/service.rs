//! Service layer responsible for loading historical datasets.

use std::collections::BTreeMap;
use std::path::Path;

use crate::common::error::{PredictError, PredictResult};

use super::domain::{DataRepo, Dataset};
use super::repo_fs::FsDataRepo;

/// Load the dataset at `path` from the local filesystem.
pub fn ingest_file(path: &Path) -> PredictResult<Dataset> {
    ingest_with(&FsDataRepo::new(), path)
}

/// Load through an arbitrary repository and reject unusable datasets.
pub fn ingest_with(repo: &dyn DataRepo, path: &Path) -> PredictResult<Dataset> {
    let dataset = repo.load_dataset(path)?;
    if dataset.is_empty() {
        return Err(PredictError::dataset(format!(
            "{} contains no records",
            path.display()
        )));
    }
    if dataset.symptoms.is_empty() {
        tracing::warn!("dataset has no has_<symptom> columns; symptom text will be ignored");
    }
    tracing::info!(
        rows = dataset.len(),
        symptoms = dataset.symptoms.len(),
        fingerprint = %dataset.fingerprint,
        "loaded dataset {}",
        path.display()
    );
    Ok(dataset)
}

/// Occurrences per disease label, sorted by label.
pub fn label_counts(dataset: &Dataset) -> BTreeMap<&str, usize> {
    let mut counts = BTreeMap::new();
    for record in &dataset.records {
        *counts.entry(record.disease.as_str()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::repo_fs::parse_csv;

    struct InlineRepo(String);

    impl DataRepo for InlineRepo {
        fn load_dataset(&self, _path: &Path) -> PredictResult<Dataset> {
            parse_csv(&self.0)
        }
    }

    const HEADER: &str = "Disease,Severity_Level,Affected_Body_Parts,Sleep_Hours,Recent_Travel_History,Exposure_to_Sick_People,has_cough\n";

    #[test]
    fn header_only_dataset_is_rejected() {
        let err = ingest_with(&InlineRepo(HEADER.to_string()), Path::new("mem.csv")).unwrap_err();
        assert!(err.to_string().contains("no records"));
    }

    #[test]
    fn counts_labels() {
        let text = format!(
            "{HEADER}Flu,low,Chest,7,No,No,1\nFlu,low,Chest,7,No,No,1\nAsthma,high,Chest,5,No,No,1\n"
        );
        let ds = ingest_with(&InlineRepo(text), Path::new("mem.csv")).unwrap();
        let counts = label_counts(&ds);
        assert_eq!(counts.get("Flu"), Some(&2));
        assert_eq!(counts.get("Asthma"), Some(&1));
    }
}
