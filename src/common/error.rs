//! Error handling primitives shared across the core.
//!
//! Inference callers only ever see the `Display` text of these errors inside
//! the `details` field of the error payload, never the debug form.

use std::io;

/// Stable error codes, useful for log correlation and exit status mapping.
#[repr(u32)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorCode {
    /// Success code used as a sentinel.
    Ok = 0,
    /// Category value was not seen when the encoder was fitted.
    UnseenCategory = 1,
    /// Request failed validation.
    MalformedInput = 2,
    /// Persisted bundle disagrees with itself.
    SchemaMismatch = 3,
    /// Requested bundle artefact was not available.
    BundleMissing = 4,
    /// Historical dataset could not be interpreted.
    Dataset = 5,
    /// Training could not produce a model.
    Training = 6,
    /// Catch-all for IO and serialisation failures.
    Internal = 7,
}

/// Canonical error type for the core.
#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    #[error("unseen {field} category '{value}'")]
    UnseenCategory { field: String, value: String },

    #[error("{0}")]
    MalformedInput(String),

    #[error("bundle schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("model bundle not found at {0}")]
    BundleMissing(String),

    #[error("dataset error: {0}")]
    Dataset(String),

    #[error("training failed: {0}")]
    Training(String),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result alias used throughout the crate.
pub type PredictResult<T> = Result<T, PredictError>;

impl PredictError {
    /// Validation helper.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedInput(msg.into())
    }

    /// Bundle consistency helper.
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::SchemaMismatch(msg.into())
    }

    /// Dataset helper.
    pub fn dataset(msg: impl Into<String>) -> Self {
        Self::Dataset(msg.into())
    }

    /// Training helper.
    pub fn training(msg: impl Into<String>) -> Self {
        Self::Training(msg.into())
    }

    /// Machine parsable code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::UnseenCategory { .. } => ErrorCode::UnseenCategory,
            Self::MalformedInput(_) => ErrorCode::MalformedInput,
            Self::SchemaMismatch(_) => ErrorCode::SchemaMismatch,
            Self::BundleMissing(_) => ErrorCode::BundleMissing,
            Self::Dataset(_) => ErrorCode::Dataset,
            Self::Training(_) => ErrorCode::Training,
            Self::Io(_) | Self::Serialization(_) => ErrorCode::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(ErrorCode::Ok as u32, 0);
        assert_eq!(ErrorCode::UnseenCategory as u32, 1);
        assert_eq!(ErrorCode::MalformedInput as u32, 2);
        assert_eq!(ErrorCode::SchemaMismatch as u32, 3);
        assert_eq!(ErrorCode::BundleMissing as u32, 4);
        assert_eq!(ErrorCode::Dataset as u32, 5);
        assert_eq!(ErrorCode::Training as u32, 6);
        assert_eq!(ErrorCode::Internal as u32, 7);
    }

    #[test]
    fn errors_map_to_codes() {
        let unseen = PredictError::UnseenCategory {
            field: "body part".into(),
            value: "Elbow".into(),
        };
        assert_eq!(unseen.code(), ErrorCode::UnseenCategory);
        assert_eq!(unseen.to_string(), "unseen body part category 'Elbow'");
        assert_eq!(
            PredictError::malformed("bad").code(),
            ErrorCode::MalformedInput
        );
        let io = PredictError::from(io::Error::new(io::ErrorKind::Other, "disk"));
        assert_eq!(io.code(), ErrorCode::Internal);
    }
}
