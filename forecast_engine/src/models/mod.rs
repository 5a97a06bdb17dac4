//! Candidate forecasting algorithms
//!
//! Each algorithm is a [`ModelAdapter`]: it fits a [`TimeSeries`] into an
//! opaque [`ModelCandidate`] and extrapolates that candidate forward. The
//! competition runner only ever talks to this trait.

use crate::config::EngineConfig;
use crate::data::{Frequency, TimeSeries};
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;

pub mod exponential_smoothing;
pub mod tree_ensemble;
pub mod trend_seasonal;

pub use exponential_smoothing::ExponentialSmoothingAdapter;
pub use tree_ensemble::TreeEnsembleAdapter;
pub use trend_seasonal::TrendSeasonalAdapter;

/// Fitted state of one algorithm, extrapolated from the end of its training window
pub trait FittedModel: Debug + Send + Sync {
    /// The next `horizon` values after the training window
    fn forecast(&self, horizon: usize) -> Result<Vec<f64>>;
}

/// Span of data a candidate was fitted on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub observations: usize,
    pub frequency: Frequency,
}

impl TrainingWindow {
    pub fn of(series: &TimeSeries) -> Self {
        Self {
            start: series.first_timestamp(),
            end: series.last_timestamp(),
            observations: series.len(),
            frequency: series.frequency(),
        }
    }
}

/// A fitted model ready to forecast
#[derive(Debug, Clone)]
pub struct ModelCandidate {
    pub algorithm: String,
    pub training_window: TrainingWindow,
    fitted: Arc<dyn FittedModel>,
}

impl ModelCandidate {
    pub fn new(algorithm: &str, series: &TimeSeries, fitted: Arc<dyn FittedModel>) -> Self {
        Self {
            algorithm: algorithm.to_string(),
            training_window: TrainingWindow::of(series),
            fitted,
        }
    }

    /// Forecast `horizon` periods, rejecting short or non-finite output
    pub fn forecast(&self, horizon: usize) -> Result<Vec<f64>> {
        let values = self.fitted.forecast(horizon)?;
        if values.len() != horizon {
            return Err(ForecastError::ValidationError(format!(
                "{} produced {} values for a horizon of {}",
                self.algorithm,
                values.len(),
                horizon
            )));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::convergence(
                &self.algorithm,
                "forecast contains non-finite values",
            ));
        }
        Ok(values)
    }
}

/// A forecasting algorithm that can take part in a competition
pub trait ModelAdapter: Send + Sync {
    /// Stable identifier, recorded as the winner in competition results
    fn name(&self) -> &'static str;

    /// Shortest series this adapter can fit at the given frequency
    fn min_observations(&self, frequency: Frequency) -> usize;

    fn fit(&self, series: &TimeSeries, horizon_hint: usize) -> Result<ModelCandidate>;

    fn predict(&self, candidate: &ModelCandidate, horizon: usize) -> Result<Vec<f64>> {
        if candidate.algorithm != self.name() {
            return Err(ForecastError::ValidationError(format!(
                "{} cannot predict from a {} candidate",
                self.name(),
                candidate.algorithm
            )));
        }
        candidate.forecast(horizon)
    }
}

/// The standard roster in tie-break priority order
pub fn default_roster(config: &EngineConfig) -> Vec<Box<dyn ModelAdapter>> {
    vec![
        Box::new(TreeEnsembleAdapter::new(
            config.tree_ensemble.clone(),
            config.features.clone(),
            config.seed,
        )),
        Box::new(TrendSeasonalAdapter::new()),
        Box::new(ExponentialSmoothingAdapter::new(config.smoothing.clone())),
    ]
}

pub(crate) fn ensure_history(adapter: &str, series: &TimeSeries, required: usize) -> Result<()> {
    if series.len() < required {
        return Err(ForecastError::InsufficientHistory(format!(
            "{} needs at least {} observations of '{}', have {}",
            adapter,
            required,
            series.name(),
            series.len()
        )));
    }
    Ok(())
}
