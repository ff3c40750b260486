//! Data domain: loading and validation of historical symptom datasets.

pub mod domain;
pub mod repo_fs;
pub mod service;

pub use domain::{DataRepo, Dataset, HistoricalRecord};
