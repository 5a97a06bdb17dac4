//! # Forecast Engine
//!
//! Per-metric forecasting for financial and operational series.
//!
//! ## Features
//!
//! - Append-only, provenance-tracking store of metric columns (polars)
//! - Lag, rolling-window and seasonal feature engineering
//! - Three competing algorithms: trend + seasonal decomposition, exponential
//!   smoothing (Holt / Holt-Winters) and gradient-boosted regression trees
//! - Chronological holdout competition with deterministic tie-breaking
//! - Residual-bootstrap confidence bands and optimistic/pessimistic scenarios
//! - Direct or composed forecasts for derived metrics
//!
//! ## Quick Start
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use forecast_engine::config::EngineConfig;
//! use forecast_engine::data::Frequency;
//! use forecast_engine::orchestrator::ForecastOrchestrator;
//! use forecast_engine::store::{Derivation, SeriesStore};
//!
//! # fn main() -> forecast_engine::error::Result<()> {
//! let start = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
//! let dates: Vec<NaiveDate> = (0..36)
//!     .map(|m| Frequency::Monthly.advance(start, m).unwrap())
//!     .collect();
//!
//! let mut store = SeriesStore::new(dates, Frequency::Monthly)?;
//! store.insert_metric("FeeIncome", (0..36).map(|i| 100.0 + 2.0 * i as f64).collect())?;
//! store.insert_metric("InterestIncome", (0..36).map(|i| 50.0 + i as f64).collect())?;
//! store.derive("TotalRevenue", Derivation::sum(&["FeeIncome", "InterestIncome"]))?;
//!
//! let orchestrator = ForecastOrchestrator::new(&store, EngineConfig::default())?;
//! let frame = orchestrator.forecast("FeeIncome", 12)?;
//! println!("{:?}", frame.to_dataframe()?);
//!
//! let comparison = orchestrator.compare_composition("TotalRevenue", 12)?;
//! println!("direct ok: {}", comparison.direct.is_ok());
//! # Ok(())
//! # }
//! ```

pub mod competition;
pub mod config;
pub mod data;
pub mod error;
pub mod features;
pub mod frame;
pub mod models;
pub mod orchestrator;
pub mod scenario;
pub mod store;
pub mod uncertainty;

pub use competition::{CompetitionResult, CompetitionRunner, ScoringMetric};
pub use config::EngineConfig;
pub use data::{Frequency, TimeSeries};
pub use error::{ForecastError, Result};
pub use frame::ForecastFrame;
pub use models::{ModelAdapter, ModelCandidate};
pub use orchestrator::ForecastOrchestrator;
pub use store::{Derivation, SeriesStore};
