//! Train the disease classifier from the historical dataset and write the
//! model bundle.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use sympredict::common::{config::AppCfg, log};
use sympredict::data::service::{ingest_file, label_counts};
use sympredict::training::{service::train_and_persist, FsBundleRepo, TrainConfig};

#[derive(Parser, Debug)]
#[command(about = "Train the disease classifier and write bundle.json", version)]
struct Args {
    /// Historical CSV. Defaults to SYMPREDICT_DATASET.
    #[arg(long = "dataset", value_name = "FILE")]
    dataset: Option<PathBuf>,

    /// Output directory. Defaults to SYMPREDICT_BUNDLE_DIR.
    #[arg(long = "bundle-dir", value_name = "DIR")]
    bundle_dir: Option<PathBuf>,

    /// Training config JSON (seed, test_fraction, cv_folds, grid).
    #[arg(long = "config", value_name = "FILE")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let cfg = AppCfg::load();
    log::init(cfg.log_filter.as_deref(), "info");

    let dataset_path = args.dataset.unwrap_or(cfg.dataset_path);
    let bundle_dir = args.bundle_dir.unwrap_or(cfg.bundle_dir);
    let train_cfg = match &args.config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            TrainConfig::parse(&raw)
                .with_context(|| format!("Invalid training config {}", path.display()))?
        }
        None => TrainConfig::default(),
    };

    let dataset = ingest_file(&dataset_path)
        .with_context(|| format!("Failed to load {}", dataset_path.display()))?;
    tracing::debug!(labels = ?label_counts(&dataset), "label distribution");

    let repo = FsBundleRepo::new(&bundle_dir);
    let report = train_and_persist(&dataset, &train_cfg, &repo).context("Training failed")?;

    println!("Best parameters: {:?}", report.best_params);
    println!("CV micro F1: {:.4}", report.cv_f1_micro);
    if !report.dropped_labels.is_empty() {
        println!("Dropped rare diseases: {}", report.dropped_labels.join(", "));
    }
    println!(
        "Rows: {} total, {} train, {} test",
        report.rows_total, report.rows_train, report.rows_test
    );
    println!("Accuracy: {:.4}", report.holdout.accuracy);
    println!("F1 Score: {:.4}", report.holdout.f1_micro);
    println!("Classification Report:\n{}", report.holdout);
    println!("Bundle written to {}", repo.bundle_path().display());
    Ok(())
}
