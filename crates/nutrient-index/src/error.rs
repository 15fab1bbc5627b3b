//! Error types for the nutrient similarity index.
//!
//! Every failure is local and synchronous: it points at a defect in the
//! caller's input or in the training data, never at a transient condition.
//! Unparseable cells are not errors; they are treated as missing values and
//! filled by the imputer.
//!
//! Errors serialize as `{ code, message }` so a service layer can forward
//! them unchanged.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for fitting and querying the index.
#[derive(Error, Debug)]
pub enum IndexError {
    /// A feature dimension has no usable training values.
    #[error("Feature '{feature}' has no usable values in the training data")]
    InsufficientData { feature: String },

    /// A feature dimension is constant across all training rows.
    #[error("Feature '{feature}' has zero variance and cannot be standardized")]
    DegenerateFeature { feature: String },

    /// A vector or row has the wrong number of feature dimensions.
    #[error("{context}: expected {expected} features, got {actual}")]
    SchemaMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    /// An argument is outside its valid domain (e.g. negative k).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A query was issued before any model was fitted.
    #[error("No fitted model available")]
    NotFitted,

    /// The training dataset contains no samples.
    #[error("Dataset is empty")]
    EmptyDataset,

    /// A required column was not found in the input table.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// A persisted model failed its consistency checks.
    #[error("Corrupt model: {0}")]
    CorruptModel(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<IndexError>,
    },
}

impl IndexError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        IndexError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Shorthand for a [`IndexError::SchemaMismatch`].
    pub fn schema_mismatch(context: impl Into<String>, expected: usize, actual: usize) -> Self {
        IndexError::SchemaMismatch {
            context: context.into(),
            expected,
            actual,
        }
    }

    /// Stable error code for callers that branch on the error kind.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InsufficientData { .. } => "INSUFFICIENT_DATA",
            Self::DegenerateFeature { .. } => "DEGENERATE_FEATURE",
            Self::SchemaMismatch { .. } => "SCHEMA_MISMATCH",
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::NotFitted => "NOT_FITTED",
            Self::EmptyDataset => "EMPTY_DATASET",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::CorruptModel(_) => "CORRUPT_MODEL",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Strip any [`IndexError::WithContext`] layers and return the root error.
    pub fn root(&self) -> &IndexError {
        match self {
            Self::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether the error was caused by a caller-supplied query rather than
    /// by the training data or the environment.
    pub fn is_query_error(&self) -> bool {
        matches!(
            self.root(),
            Self::SchemaMismatch { .. } | Self::InvalidArgument(_) | Self::NotFitted
        )
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for IndexError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("IndexError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for index operations.
pub type Result<T> = std::result::Result<T, IndexError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| IndexError::Polars(e).with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| IndexError::Io(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(IndexError::NotFitted.error_code(), "NOT_FITTED");
        assert_eq!(
            IndexError::DegenerateFeature {
                feature: "ASH".to_string()
            }
            .error_code(),
            "DEGENERATE_FEATURE"
        );
        assert_eq!(
            IndexError::schema_mismatch("query", 7, 6).error_code(),
            "SCHEMA_MISMATCH"
        );
    }

    #[test]
    fn test_schema_mismatch_message() {
        let error = IndexError::schema_mismatch("query vector", 7, 3);
        assert_eq!(error.to_string(), "query vector: expected 7 features, got 3");
    }

    #[test]
    fn test_is_query_error() {
        assert!(IndexError::NotFitted.is_query_error());
        assert!(IndexError::InvalidArgument("k".to_string()).is_query_error());
        assert!(
            !IndexError::InsufficientData {
                feature: "FIBINS".to_string()
            }
            .is_query_error()
        );
    }

    #[test]
    fn test_error_serialization() {
        let error = IndexError::ColumnNotFound("Food name".to_string());
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("COLUMN_NOT_FOUND"));
        assert!(json.contains("Food name"));
    }

    #[test]
    fn test_with_context() {
        let error = IndexError::NotFitted.with_context("While answering query");
        assert!(error.to_string().contains("While answering query"));
        // Preserves original code
        assert_eq!(error.error_code(), "NOT_FITTED");
        assert!(error.is_query_error());
    }
}
