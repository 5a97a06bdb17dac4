//! Linear trend plus additive seasonal indices

use crate::data::{Frequency, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::{ensure_history, FittedModel, ModelAdapter, ModelCandidate};
use chrono::NaiveDate;
use forecast_math::{stats, LinearTrend};
use std::sync::Arc;

const NAME: &str = "trend_seasonal";

/// Least-squares trend on the period index, with per-season offsets of the
/// detrended series once two full seasons are observed
#[derive(Debug, Clone, Copy, Default)]
pub struct TrendSeasonalAdapter;

impl TrendSeasonalAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Debug, Clone)]
struct TrendSeasonalModel {
    trend: LinearTrend,
    /// Offset per season index, centered on zero
    seasonal: Option<Vec<f64>>,
    anchor: NaiveDate,
    observations: usize,
    frequency: Frequency,
}

impl FittedModel for TrendSeasonalModel {
    fn forecast(&self, horizon: usize) -> Result<Vec<f64>> {
        (self.observations..self.observations + horizon)
            .map(|k| {
                let mut value = self.trend.value_at(k as f64);
                if let Some(seasonal) = &self.seasonal {
                    let date = self.frequency.advance(self.anchor, k).ok_or_else(|| {
                        ForecastError::DataError("Date arithmetic overflow".to_string())
                    })?;
                    value += seasonal[self.frequency.season_index(date) % seasonal.len()];
                }
                Ok(value)
            })
            .collect()
    }
}

impl ModelAdapter for TrendSeasonalAdapter {
    fn name(&self) -> &'static str {
        NAME
    }

    fn min_observations(&self, _frequency: Frequency) -> usize {
        3
    }

    fn fit(&self, series: &TimeSeries, _horizon_hint: usize) -> Result<ModelCandidate> {
        ensure_history(NAME, series, self.min_observations(series.frequency()))?;
        let values = series.values();

        if stats::is_constant(values, 1e-12) {
            return Err(ForecastError::convergence(
                NAME,
                "constant series has no trend or seasonal structure to decompose",
            ));
        }

        let trend =
            LinearTrend::fit(values).map_err(|e| ForecastError::convergence(NAME, e.to_string()))?;

        let frequency = series.frequency();
        let season = frequency.season_length();
        let seasonal = if season > 1 && values.len() >= 2 * season {
            Some(seasonal_indices(series, &trend, season))
        } else {
            None
        };

        if let Some(offsets) = &seasonal {
            if offsets.iter().any(|v| !v.is_finite()) {
                return Err(ForecastError::convergence(
                    NAME,
                    "seasonal indices are not finite",
                ));
            }
        }

        log::debug!(
            "{}: slope {:.6}, intercept {:.6}, seasonal={}",
            NAME,
            trend.slope(),
            trend.intercept(),
            seasonal.is_some()
        );

        let model = TrendSeasonalModel {
            trend,
            seasonal,
            anchor: series.first_timestamp(),
            observations: series.len(),
            frequency,
        };
        Ok(ModelCandidate::new(NAME, series, Arc::new(model)))
    }
}

fn seasonal_indices(series: &TimeSeries, trend: &LinearTrend, season: usize) -> Vec<f64> {
    let frequency = series.frequency();
    let mut sums = vec![0.0; season];
    let mut counts = vec![0usize; season];

    for (i, (date, value)) in series
        .timestamps()
        .iter()
        .zip(series.values())
        .enumerate()
    {
        let slot = frequency.season_index(*date) % season;
        sums[slot] += value - trend.value_at(i as f64);
        counts[slot] += 1;
    }

    let means: Vec<f64> = sums
        .iter()
        .zip(&counts)
        .map(|(sum, &count)| if count > 0 { sum / count as f64 } else { 0.0 })
        .collect();
    let center = stats::mean(&means);
    means.into_iter().map(|m| m - center).collect()
}
