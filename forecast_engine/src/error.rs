//! Error types for the forecast_engine crate

use forecast_math::MathError;
use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the forecast_engine crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Not enough periods for the requested lookback or holdout
    #[error("Insufficient history: {0}")]
    InsufficientHistory(String),

    /// One adapter could not produce stable parameters
    #[error("Convergence failure in {adapter}: {reason}")]
    ConvergenceFailure { adapter: String, reason: String },

    /// Every adapter in a competition was disqualified
    #[error("No viable model for '{metric}': {reasons}")]
    NoViableModel { metric: String, reasons: String },

    /// Too few holdout residuals to bootstrap confidence bands
    #[error("Insufficient residuals: need at least {required}, have {actual}")]
    InsufficientResiduals { required: usize, actual: usize },

    /// Scenario multipliers do not bracket 1.0
    #[error("Invalid scenario config: {0}")]
    InvalidScenarioConfig(String),

    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Error related to parameter validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Metric not present in the series store
    #[error("Unknown metric: {0}")]
    UnknownMetric(String),

    /// Error loading or parsing engine configuration
    #[error("Config error: {0}")]
    ConfigError(String),

    /// Error from mathematical operations
    #[error("Math error: {0}")]
    MathError(#[from] MathError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),
}

impl ForecastError {
    /// Failures that remove a single adapter from a competition without
    /// failing the competition itself.
    pub fn is_disqualification(&self) -> bool {
        matches!(
            self,
            ForecastError::ConvergenceFailure { .. }
                | ForecastError::InsufficientHistory(_)
                | ForecastError::MathError(_)
        )
    }

    pub(crate) fn convergence(adapter: &str, reason: impl Into<String>) -> Self {
        ForecastError::ConvergenceFailure {
            adapter: adapter.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        ForecastError::ConfigError(err.to_string())
    }
}
