//! # Forecast Math
//!
//! Numeric building blocks used by the forecasting engine.
//! This crate provides least-squares trend fitting, exponential smoothing
//! recurrences, descriptive statistics and forecast accuracy measures.

use thiserror::Error;

pub mod accuracy;
pub mod regression;
pub mod smoothing;
pub mod stats;

pub use accuracy::{forecast_accuracy, ForecastAccuracy};
pub use regression::LinearTrend;
pub use smoothing::{HoltState, HoltWintersState};

/// Errors that can occur in forecasting math
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for forecasting math operations
pub type Result<T> = std::result::Result<T, MathError>;
