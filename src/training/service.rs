//! Service layer orchestrating feature fitting, model selection and
//! bundle assembly.

use std::collections::HashSet;

use crate::common::error::{PredictError, PredictResult};
use crate::data::domain::Dataset;
use crate::evaluation::service::evaluate;
use crate::features::encoder::{BODY_PART_FIELD, DISEASE_FIELD, SEVERITY_FIELD};
use crate::features::{derive, feature_columns, normalize_body_part, CategoryEncoder, FeatureContext, FeatureSchema};

use super::domain::{BundleMetadata, BundleRepo, ModelBundle, Trainer, TrainConfig, TrainingReport};
use super::gbdt::{GbdtModel, GbdtTrainer};
use super::search::grid_search;
use super::split::{shuffled_indices, singleton_labels, stratified_split};

const BASE_SEVERITIES: [&str; 3] = ["low", "medium", "high"];

/// Train the default gradient-boosted classifier.
pub fn train(dataset: &Dataset, cfg: &TrainConfig) -> PredictResult<(ModelBundle, TrainingReport)> {
    train_with(&GbdtTrainer::new(cfg.seed), dataset, cfg)
}

/// Train with any [`Trainer`] and assemble the bundle around its model.
pub fn train_with<T: Trainer>(
    trainer: &T,
    dataset: &Dataset,
    cfg: &TrainConfig,
) -> PredictResult<(ModelBundle<T::Model>, TrainingReport)> {
    cfg.validate()?;
    if dataset.is_empty() {
        return Err(PredictError::dataset("no records to train on"));
    }

    let order = shuffled_indices(dataset.len(), cfg.seed);
    let records: Vec<_> = order.iter().map(|&i| &dataset.records[i]).collect();

    let severity_encoder = CategoryEncoder::fit(
        SEVERITY_FIELD,
        BASE_SEVERITIES
            .iter()
            .map(|s| s.to_string())
            .chain(records.iter().map(|r| r.severity.trim().to_lowercase())),
    );
    let body_part_encoder = CategoryEncoder::fit(
        BODY_PART_FIELD,
        records.iter().map(|r| normalize_body_part(&r.body_part)),
    );
    let vocabulary = dataset.vocabulary();
    let schema = FeatureSchema::new(feature_columns(&vocabulary));

    let ctx = FeatureContext {
        vocabulary: &vocabulary,
        body_parts: &body_part_encoder,
        severities: &severity_encoder,
    };

    let dropped = singleton_labels(records.iter().map(|r| r.disease.as_str()));
    if !dropped.is_empty() {
        tracing::warn!(labels = ?dropped, "dropping diseases with a single example");
    }
    let dropped_set: HashSet<&str> = dropped.iter().map(String::as_str).collect();
    let kept: Vec<_> = records
        .into_iter()
        .filter(|r| !dropped_set.contains(r.disease.as_str()))
        .collect();
    if kept.is_empty() {
        return Err(PredictError::training("every disease occurs only once"));
    }

    let label_decoder = CategoryEncoder::fit(DISEASE_FIELD, kept.iter().map(|r| r.disease.as_str()));
    let x: Vec<Vec<f64>> = kept
        .iter()
        .map(|r| schema.align(&derive(&r.report_fields(&dataset.symptoms, &vocabulary), ctx)))
        .collect();
    let y: Vec<usize> = kept
        .iter()
        .map(|r| label_decoder.encode(&r.disease).map(|c| c as usize))
        .collect::<PredictResult<_>>()?;
    let n_classes = label_decoder.len();

    let split = stratified_split(&y, cfg.test_fraction, cfg.seed);
    let x_train: Vec<Vec<f64>> = split.train.iter().map(|&r| x[r].clone()).collect();
    let y_train: Vec<usize> = split.train.iter().map(|&r| y[r]).collect();
    let x_test: Vec<Vec<f64>> = split.test.iter().map(|&r| x[r].clone()).collect();
    let y_test: Vec<usize> = split.test.iter().map(|&r| y[r]).collect();
    tracing::info!(
        train = y_train.len(),
        test = y_test.len(),
        classes = n_classes,
        features = schema.len(),
        "prepared training matrix"
    );

    let search = grid_search(trainer, &x_train, &y_train, n_classes, &cfg.grid, cfg.cv_folds)?;
    let best = search.best;
    let model = trainer.fit(&x_train, &y_train, n_classes, &best.params)?;
    let holdout = evaluate(&model, &x_test, &y_test, &label_decoder);
    tracing::info!(
        accuracy = holdout.accuracy,
        f1_micro = holdout.f1_micro,
        "holdout evaluation"
    );

    let bundle = ModelBundle {
        model,
        label_decoder,
        body_part_encoder,
        severity_encoder,
        vocabulary,
        feature_columns: schema,
        metadata: BundleMetadata {
            trained_at: chrono::Utc::now(),
            dataset_fingerprint: dataset.fingerprint.clone(),
            best_params: best.params.clone(),
            cv_f1_micro: best.mean_f1_micro,
            dropped_labels: dropped.clone(),
        },
    };
    bundle.validate()?;

    let report = TrainingReport {
        rows_total: dataset.len(),
        rows_train: y_train.len(),
        rows_test: y_test.len(),
        dropped_labels: dropped,
        best_params: best.params,
        cv_f1_micro: best.mean_f1_micro,
        holdout,
    };
    Ok((bundle, report))
}

/// Train the default classifier and persist the bundle through `repo`.
pub fn train_and_persist(
    dataset: &Dataset,
    cfg: &TrainConfig,
    repo: &dyn BundleRepo,
) -> PredictResult<TrainingReport> {
    let (bundle, report): (ModelBundle<GbdtModel>, _) = train(dataset, cfg)?;
    repo.put_bundle(&bundle)?;
    Ok(report)
}
