//! # Fintech Forecaster
//!
//! Umbrella crate for the forecasting workspace.
//!
//! - [`forecast_math`]: trend regression, smoothing recurrences, statistics
//!   and accuracy measures
//! - [`forecast_engine`]: series store, model competition, confidence bands,
//!   scenarios and the orchestrator tying them together
//!
//! ## Example
//!
//! ```
//! use fintech_forecaster_workspace::forecast_math::LinearTrend;
//!
//! let trend = LinearTrend::fit(&[10.0, 20.0, 30.0]).unwrap();
//! assert!((trend.extrapolate(1)[0] - 40.0).abs() < 1e-9);
//! ```

pub use forecast_engine;
pub use forecast_math;

pub use forecast_engine::{
    CompetitionResult, EngineConfig, ForecastError, ForecastFrame, ForecastOrchestrator,
    Frequency, SeriesStore, TimeSeries,
};
