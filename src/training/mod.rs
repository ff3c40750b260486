//! Training domain: classifier contracts, model selection and bundle lifecycle.

pub mod domain;
pub mod gbdt;
pub mod repo_fs;
pub mod search;
pub mod service;
pub mod split;

pub use domain::{
    BundleMetadata, BundleRepo, Classifier, HyperParams, ModelBundle, ParamGrid, TrainConfig,
    Trainer, TrainingReport,
};
pub use gbdt::{GbdtModel, GbdtTrainer};
pub use repo_fs::FsBundleRepo;
