//! Holt and additive Holt-Winters smoothing with fitted parameters

use crate::config::SmoothingConfig;
use crate::data::{Frequency, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::{ensure_history, FittedModel, ModelAdapter, ModelCandidate};
use forecast_math::{HoltState, HoltWintersState};
use std::sync::Arc;

const NAME: &str = "exponential_smoothing";

/// Search grid for the initial parameter guess
const GRID: [f64; 5] = [0.1, 0.3, 0.5, 0.7, 0.9];
const INITIAL_STEP: f64 = 0.05;
const LOWER_BOUND: f64 = 0.001;
const UPPER_BOUND: f64 = 0.999;

/// Exponential smoothing adapter.
///
/// Uses Holt's linear trend method, or additive Holt-Winters once two full
/// seasons are available. Smoothing parameters minimize the one-step-ahead
/// sum of squared errors: a coarse grid picks the starting point, then
/// coordinate refinement halves its step until it drops below the tolerance.
#[derive(Debug, Clone)]
pub struct ExponentialSmoothingAdapter {
    config: SmoothingConfig,
}

impl Default for ExponentialSmoothingAdapter {
    fn default() -> Self {
        Self::new(SmoothingConfig::default())
    }
}

impl ExponentialSmoothingAdapter {
    pub fn new(config: SmoothingConfig) -> Self {
        Self { config }
    }
}

#[derive(Debug, Clone)]
enum SmoothingModel {
    Holt(HoltState),
    HoltWinters(HoltWintersState),
}

impl FittedModel for SmoothingModel {
    fn forecast(&self, horizon: usize) -> Result<Vec<f64>> {
        let values = match self {
            SmoothingModel::Holt(state) => (1..=horizon).map(|h| state.forecast(h)).collect(),
            SmoothingModel::HoltWinters(state) => {
                (1..=horizon).map(|h| state.forecast(h)).collect()
            }
        };
        Ok(values)
    }
}

impl ModelAdapter for ExponentialSmoothingAdapter {
    fn name(&self) -> &'static str {
        NAME
    }

    fn min_observations(&self, _frequency: Frequency) -> usize {
        4
    }

    fn fit(&self, series: &TimeSeries, _horizon_hint: usize) -> Result<ModelCandidate> {
        ensure_history(NAME, series, self.min_observations(series.frequency()))?;
        let values = series.values();
        let period = series.frequency().season_length();

        let model = if period > 1 && values.len() >= 2 * period {
            let sse = |p: &[f64]| {
                HoltWintersState::run(values, period, p[0], p[1], p[2])
                    .map(|(_, sse)| sse)
                    .unwrap_or(f64::INFINITY)
            };
            let params = self.optimize(3, sse)?;
            let (state, _) = HoltWintersState::run(values, period, params[0], params[1], params[2])?;
            log::debug!(
                "{}: holt-winters alpha={:.4} beta={:.4} gamma={:.4}",
                NAME,
                params[0],
                params[1],
                params[2]
            );
            SmoothingModel::HoltWinters(state)
        } else {
            let sse = |p: &[f64]| {
                HoltState::run(values, p[0], p[1])
                    .map(|(_, sse)| sse)
                    .unwrap_or(f64::INFINITY)
            };
            let params = self.optimize(2, sse)?;
            let (state, _) = HoltState::run(values, params[0], params[1])?;
            log::debug!(
                "{}: holt alpha={:.4} beta={:.4}",
                NAME,
                params[0],
                params[1]
            );
            SmoothingModel::Holt(state)
        };

        Ok(ModelCandidate::new(NAME, series, Arc::new(model)))
    }
}

impl ExponentialSmoothingAdapter {
    /// Minimize `objective` over `dims` parameters in (0, 1)
    fn optimize<F>(&self, dims: usize, objective: F) -> Result<Vec<f64>>
    where
        F: Fn(&[f64]) -> f64,
    {
        let (mut best, mut best_sse) = grid_search(dims, &objective);
        if !best_sse.is_finite() {
            return Err(ForecastError::convergence(
                NAME,
                "every starting point produced a non-finite error",
            ));
        }

        let mut step = INITIAL_STEP;
        let mut iterations = 0;
        while step >= self.config.tolerance {
            if iterations >= self.config.max_iterations {
                return Err(ForecastError::convergence(
                    NAME,
                    format!(
                        "parameter search did not settle within {} iterations",
                        self.config.max_iterations
                    ),
                ));
            }
            iterations += 1;

            let mut improved = false;
            for d in 0..dims {
                for direction in [-1.0, 1.0] {
                    let mut trial = best.clone();
                    trial[d] = (trial[d] + direction * step).clamp(LOWER_BOUND, UPPER_BOUND);
                    let sse = objective(&trial);
                    if sse.is_finite() && sse < best_sse * (1.0 - 1e-10) {
                        best = trial;
                        best_sse = sse;
                        improved = true;
                    }
                }
            }

            if !improved {
                step /= 2.0;
            }
        }

        log::debug!(
            "{}: parameter search finished after {} iterations (sse={:.6e})",
            NAME,
            iterations,
            best_sse
        );
        Ok(best)
    }
}

fn grid_search<F>(dims: usize, objective: &F) -> (Vec<f64>, f64)
where
    F: Fn(&[f64]) -> f64,
{
    let mut best = vec![GRID[GRID.len() / 2]; dims];
    let mut best_sse = f64::INFINITY;
    let mut point = vec![0.0; dims];
    let total = GRID.len().pow(dims as u32);

    for mut code in 0..total {
        for slot in point.iter_mut() {
            *slot = GRID[code % GRID.len()];
            code /= GRID.len();
        }
        let sse = objective(&point);
        if sse.is_finite() && sse < best_sse {
            best_sse = sse;
            best.copy_from_slice(&point);
        }
    }

    (best, best_sse)
}
