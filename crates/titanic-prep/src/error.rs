//! Error types for the preprocessing stages.
//!
//! Every stage failure is fatal to the stage that raised it. Errors carry a
//! stable code so that the CLI's JSON output can be consumed by scripts.

use serde::Serialize;
use serde::ser::SerializeStruct;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the preprocessing stages.
#[derive(Error, Debug)]
pub enum PrepError {
    /// The source table does not exist.
    #[error("Input file not found: {}", .0.display())]
    MissingInput(PathBuf),

    /// The source table could not be parsed as CSV.
    #[error("Failed to parse '{}': {reason}", .path.display())]
    Parse { path: PathBuf, reason: String },

    /// An expected column is absent from the table.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// A column exists but has a dtype the stage cannot work with.
    #[error("Column '{column}' has type {actual}, expected {expected}")]
    WrongColumnType {
        column: String,
        expected: String,
        actual: String,
    },

    /// A column has no usable (non-null) values to fit on.
    #[error("Column '{0}' has no non-null values to fit on")]
    InsufficientData(String),

    /// A column is constant, so it cannot be rescaled.
    #[error("Column '{column}' has zero {statistic}; cannot rescale a constant column")]
    DegenerateDistribution { column: String, statistic: String },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A chart could not be drawn or saved.
    #[error("Failed to render plot '{}': {reason}", .path.display())]
    Plot { path: PathBuf, reason: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<PrepError>,
    },
}

impl PrepError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        PrepError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code, preserved through [`PrepError::with_context`].
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingInput(_) => "MISSING_INPUT",
            Self::Parse { .. } => "PARSE_ERROR",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::WrongColumnType { .. } => "WRONG_COLUMN_TYPE",
            Self::InsufficientData(_) => "INSUFFICIENT_DATA",
            Self::DegenerateDistribution { .. } => "DEGENERATE_DISTRIBUTION",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Plot { .. } => "PLOT_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error means the table does not have the expected shape.
    pub fn is_schema_error(&self) -> bool {
        match self {
            Self::ColumnNotFound(_) | Self::WrongColumnType { .. } => true,
            Self::WithContext { source, .. } => source.is_schema_error(),
            _ => false,
        }
    }
}

/// Errors are serialized as `{code, message}` for the CLI's JSON output.
impl Serialize for PrepError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("PrepError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for preprocessing operations.
pub type Result<T> = std::result::Result<T, PrepError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(
            PrepError::MissingInput(PathBuf::from("titanic.csv")).error_code(),
            "MISSING_INPUT"
        );
        assert_eq!(
            PrepError::InsufficientData("Sex".to_string()).error_code(),
            "INSUFFICIENT_DATA"
        );
    }

    #[test]
    fn test_is_schema_error() {
        assert!(PrepError::ColumnNotFound("Age".to_string()).is_schema_error());
        assert!(
            PrepError::WrongColumnType {
                column: "Age".to_string(),
                expected: "numeric".to_string(),
                actual: "str".to_string(),
            }
            .is_schema_error()
        );
        assert!(!PrepError::InsufficientData("Age".to_string()).is_schema_error());
    }

    #[test]
    fn test_error_serialization() {
        let error = PrepError::DegenerateDistribution {
            column: "Fare".to_string(),
            statistic: "standard deviation".to_string(),
        };
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("DEGENERATE_DISTRIBUTION"));
        assert!(json.contains("Fare"));
    }

    #[test]
    fn test_with_context() {
        let error = PrepError::ColumnNotFound("Sex".to_string()).with_context("During encoding");
        assert!(error.to_string().contains("During encoding"));
        assert_eq!(error.error_code(), "COLUMN_NOT_FOUND");
        assert!(error.is_schema_error());
    }
}
