//! Feature pipeline shared by training and inference: category encoders,
//! symptom vocabulary, derivation and schema alignment.

pub mod derive;
pub mod encoder;
pub mod schema;
pub mod vocabulary;

pub use derive::{derive, feature_columns, FeatureContext, FeatureVector, ReportFields, Severity};
pub use encoder::{normalize_body_part, CategoryEncoder};
pub use schema::FeatureSchema;
pub use vocabulary::{SymptomFlags, SymptomVocabulary};
