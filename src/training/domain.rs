//! Domain types for model training and bundle persistence.

use serde::{Deserialize, Serialize};

use crate::common::error::{PredictError, PredictResult};
use crate::evaluation::domain::EvalReport;
use crate::features::{CategoryEncoder, FeatureContext, FeatureSchema, SymptomVocabulary};

use super::gbdt::GbdtModel;

/// Class probability estimation over a fixed label set.
pub trait Classifier: Send + Sync {
    /// Width of the rows the model was fitted on.
    fn n_features(&self) -> usize;

    /// Size of the class grid `predict_proba` reports over.
    fn n_classes(&self) -> usize;

    /// Probabilities per class index, summing to one.
    fn predict_proba(&self, row: &[f64]) -> Vec<f64>;

    /// Most likely class index; the lowest index wins ties.
    fn predict(&self, row: &[f64]) -> usize {
        let probs = self.predict_proba(row);
        let mut best = 0;
        for (idx, p) in probs.iter().enumerate() {
            if *p > probs[best] {
                best = idx;
            }
        }
        best
    }

    /// Internal consistency of the fitted artefact. Loaders call this before
    /// any prediction; an `Err` must be `SchemaMismatch`.
    fn check(&self) -> PredictResult<()> {
        Ok(())
    }
}

/// Interface for components that can fit a classifier.
pub trait Trainer: Sync {
    type Model: Classifier;

    fn fit(
        &self,
        x: &[Vec<f64>],
        y: &[usize],
        n_classes: usize,
        params: &HyperParams,
    ) -> PredictResult<Self::Model>;
}

/// One cell of the hyperparameter grid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HyperParams {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub learning_rate: f64,
    pub subsample: f64,
    pub colsample_bytree: f64,
}

impl Default for HyperParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: 3,
            learning_rate: 0.1,
            subsample: 1.0,
            colsample_bytree: 1.0,
        }
    }
}

/// Candidate values per hyperparameter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamGrid {
    pub n_estimators: Vec<usize>,
    pub max_depth: Vec<usize>,
    pub learning_rate: Vec<f64>,
    pub subsample: Vec<f64>,
    pub colsample_bytree: Vec<f64>,
}

impl Default for ParamGrid {
    fn default() -> Self {
        Self {
            n_estimators: vec![100],
            max_depth: vec![3, 5],
            learning_rate: vec![0.05, 0.1],
            subsample: vec![0.8, 1.0],
            colsample_bytree: vec![0.8, 1.0],
        }
    }
}

impl ParamGrid {
    /// Every combination. Parameter names are walked alphabetically with the
    /// last one varying fastest, so cell order is stable for tie-breaking.
    pub fn cells(&self) -> Vec<HyperParams> {
        let mut out = Vec::new();
        for &colsample_bytree in &self.colsample_bytree {
            for &learning_rate in &self.learning_rate {
                for &max_depth in &self.max_depth {
                    for &n_estimators in &self.n_estimators {
                        for &subsample in &self.subsample {
                            out.push(HyperParams {
                                n_estimators,
                                max_depth,
                                learning_rate,
                                subsample,
                                colsample_bytree,
                            });
                        }
                    }
                }
            }
        }
        out
    }

    pub fn validate(&self) -> PredictResult<()> {
        let cells = self.cells();
        if cells.is_empty() {
            return Err(PredictError::training("hyperparameter grid is empty"));
        }
        for p in &cells {
            if p.n_estimators == 0 || p.max_depth == 0 {
                return Err(PredictError::training(format!(
                    "n_estimators and max_depth must be positive: {p:?}"
                )));
            }
            let in_unit = |v: f64| v > 0.0 && v <= 1.0;
            if !(p.learning_rate > 0.0 && in_unit(p.subsample) && in_unit(p.colsample_bytree)) {
                return Err(PredictError::training(format!(
                    "learning_rate must be positive, subsample and colsample_bytree in (0, 1]: {p:?}"
                )));
            }
        }
        Ok(())
    }
}

/// Training configuration, deserialised from an optional JSON file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub seed: u64,
    pub test_fraction: f64,
    pub cv_folds: usize,
    pub grid: ParamGrid,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            test_fraction: 0.2,
            cv_folds: 3,
            grid: ParamGrid::default(),
        }
    }
}

impl TrainConfig {
    pub fn parse(raw: &str) -> PredictResult<Self> {
        let cfg: Self = serde_json::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> PredictResult<()> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(PredictError::training("test_fraction must be in (0, 1)"));
        }
        if self.cv_folds < 2 {
            return Err(PredictError::training("cv_folds must be at least 2"));
        }
        self.grid.validate()
    }
}

/// Provenance recorded next to the artefacts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BundleMetadata {
    pub trained_at: chrono::DateTime<chrono::Utc>,
    pub dataset_fingerprint: String,
    pub best_params: HyperParams,
    pub cv_f1_micro: f64,
    /// Labels removed because they occurred exactly once.
    pub dropped_labels: Vec<String>,
}

/// Every artefact inference needs, persisted and loaded as one unit.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelBundle<M = GbdtModel> {
    pub model: M,
    pub label_decoder: CategoryEncoder,
    pub body_part_encoder: CategoryEncoder,
    pub severity_encoder: CategoryEncoder,
    pub vocabulary: SymptomVocabulary,
    pub feature_columns: FeatureSchema,
    pub metadata: BundleMetadata,
}

impl<M: Classifier> ModelBundle<M> {
    /// Borrowed view used by feature derivation.
    pub fn feature_context(&self) -> FeatureContext<'_> {
        FeatureContext {
            vocabulary: &self.vocabulary,
            body_parts: &self.body_part_encoder,
            severities: &self.severity_encoder,
        }
    }

    /// Reject bundles whose parts disagree with each other.
    pub fn validate(&self) -> PredictResult<()> {
        if self.model.n_features() != self.feature_columns.len() {
            return Err(PredictError::schema(format!(
                "classifier expects {} features, schema lists {}",
                self.model.n_features(),
                self.feature_columns.len()
            )));
        }
        self.feature_columns.validate(&self.vocabulary)?;
        self.model.check()?;
        if self.model.n_classes() > self.label_decoder.len() {
            tracing::warn!(
                classes = self.model.n_classes(),
                labels = self.label_decoder.len(),
                "classifier reports more classes than the label decoder knows"
            );
        }
        Ok(())
    }
}

/// Outcome of a training run.
#[derive(Clone, Debug)]
pub struct TrainingReport {
    pub rows_total: usize,
    pub rows_train: usize,
    pub rows_test: usize,
    pub dropped_labels: Vec<String>,
    pub best_params: HyperParams,
    pub cv_f1_micro: f64,
    pub holdout: EvalReport,
}

/// Repository contract for model bundles.
pub trait BundleRepo {
    fn put_bundle(&self, bundle: &ModelBundle) -> PredictResult<()>;
    fn get_bundle(&self) -> PredictResult<ModelBundle>;
}
