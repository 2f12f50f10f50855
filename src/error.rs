//! Error types for the ridership forecasting pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for numeric and modelling operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors raised by the series and model layer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Dimension mismatch between data structures.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Date index is not strictly increasing.
    #[error("timestamp error: {0}")]
    TimestampError(String),

    /// Model has not been fitted yet.
    #[error("model must be fitted before prediction")]
    FitRequired,

    /// Missing values detected when not allowed.
    #[error("missing values detected in data")]
    MissingValues,

    /// Computation error (e.g., numerical issues).
    #[error("computation error: {0}")]
    ComputationError(String),
}

/// Result type alias for pipeline stages.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

/// Errors that halt a pipeline run.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Filesystem failure while reading, deleting or writing a path.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configured encoding label is not known.
    #[error("unknown text encoding: {0}")]
    UnknownEncoding(String),

    /// Input bytes are not valid in the configured encoding.
    #[error("{} is not valid {encoding} text", path.display())]
    Encoding { path: PathBuf, encoding: String },

    /// CSV tokenizing or writing failure.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Header width does not match the positional schema.
    #[error("column count mismatch: schema has {expected} columns, input has {got}")]
    SchemaMismatch { expected: usize, got: usize },

    /// A count column holds a non-numeric value.
    #[error("row {row}: column '{column}' has non-numeric value '{value}'")]
    InvalidCount {
        row: usize,
        column: String,
        value: String,
    },

    /// Configuration is inconsistent.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Configuration file is not valid TOML.
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Chart rendering failed.
    #[error("failed to render chart {}: {message}", path.display())]
    Chart { path: PathBuf, message: String },

    /// Series or model failure.
    #[error(transparent)]
    Forecast(#[from] ForecastError),
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
