//! Error handling for the inequality engine.

pub mod util;

use arrow::error::ArrowError;
use parquet::errors::ParquetError;
use thiserror::Error;

/// Specialized error type for the engine
#[derive(Debug, Error)]
pub enum DashboardError {
    /// A measure was requested for a variable it is undefined for
    #[error("measure '{measure}' is not available for variable '{variable}' in the {domain} domain")]
    InvalidFacetCombination {
        /// Domain key
        domain: String,
        /// Variable key
        variable: String,
        /// Measure key
        measure: String,
    },

    /// A selector key could not be parsed
    #[error("unknown {kind} key '{key}'")]
    UnknownKey {
        /// What kind of key was being parsed (variable, measure, gender, ...)
        kind: &'static str,
        /// The offending key
        key: String,
    },

    /// Malformed export request parameters
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Reference data (observation table or municipality lookup) is malformed
    #[error("reference data error: {0}")]
    ReferenceData(String),

    /// Observation table does not conform to the expected schema
    #[error("schema error: {0}")]
    Schema(String),

    /// Filter expression could not be evaluated
    #[error("filter error: {0}")]
    Filter(String),

    /// Export collaborator failed
    #[error("export error: {0}")]
    Export(String),

    /// Error opening or reading a file
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Error processing Arrow data
    #[error(transparent)]
    Arrow(#[from] ArrowError),

    /// Error processing Parquet data
    #[error(transparent)]
    Parquet(#[from] ParquetError),

    /// Error parsing JSON reference data
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Error converting between Arrow batches and rows
    #[error(transparent)]
    SerdeArrow(#[from] serde_arrow::Error),

    /// Error carrying additional context
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DashboardError {
    /// Create an unknown-key error
    pub fn unknown_key(kind: &'static str, key: impl Into<String>) -> Self {
        Self::UnknownKey {
            kind,
            key: key.into(),
        }
    }

    /// Create a filter error
    pub fn filter_error(message: impl Into<String>) -> Self {
        Self::Filter(message.into())
    }

    /// Create a schema error
    pub fn schema_error(message: impl Into<String>) -> Self {
        Self::Schema(message.into())
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, DashboardError>;
