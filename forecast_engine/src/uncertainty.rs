//! Confidence bands from holdout residuals

use crate::error::{ForecastError, Result};
use crate::models::ModelCandidate;
use forecast_math::stats;
use rand::Rng;
use rand::SeedableRng;
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};

/// Residuals needed before a bootstrap is attempted
pub const MIN_RESIDUALS: usize = 2;

/// How a band was produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BandMethod {
    Bootstrap { resamples: usize },
    /// Fixed relative half-width around the point forecast
    Proportional { band: f64 },
    /// Recombined from component bands with interval arithmetic
    Composed,
}

/// Point forecast with lower and upper bounds per period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalForecast {
    pub point: Vec<f64>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
    pub method: BandMethod,
}

/// Residual bootstrap around a candidate's forecast
#[derive(Debug, Clone)]
pub struct UncertaintyEstimator {
    seed: u64,
    fallback_band: f64,
}

impl UncertaintyEstimator {
    pub fn new(seed: u64, fallback_band: f64) -> Self {
        Self {
            seed,
            fallback_band,
        }
    }

    pub fn estimate(
        &self,
        candidate: &ModelCandidate,
        holdout_residuals: &[f64],
        horizon: usize,
        n_resamples: usize,
        confidence_level: f64,
    ) -> Result<IntervalForecast> {
        validate(n_resamples, confidence_level)?;
        let point = candidate.forecast(horizon)?;

        match self.bootstrap(&point, holdout_residuals, n_resamples, confidence_level) {
            Ok((lower, upper)) => Ok(IntervalForecast {
                point,
                lower,
                upper,
                method: BandMethod::Bootstrap {
                    resamples: n_resamples,
                },
            }),
            Err(e @ ForecastError::InsufficientResiduals { .. }) => {
                log::warn!(
                    "{}: {}; falling back to a ±{:.0}% band",
                    candidate.algorithm,
                    e,
                    self.fallback_band * 100.0
                );
                Ok(self.proportional(point))
            }
            Err(e) => Err(e),
        }
    }

    /// Per-period quantiles of `point + r` over resampled residuals `r`.
    ///
    /// Non-finite residuals are ignored. Bounds always contain the point.
    pub fn bootstrap(
        &self,
        point: &[f64],
        residuals: &[f64],
        n_resamples: usize,
        confidence_level: f64,
    ) -> Result<(Vec<f64>, Vec<f64>)> {
        validate(n_resamples, confidence_level)?;

        let usable: Vec<f64> = residuals.iter().copied().filter(|r| r.is_finite()).collect();
        if usable.len() < MIN_RESIDUALS {
            return Err(ForecastError::InsufficientResiduals {
                required: MIN_RESIDUALS,
                actual: usable.len(),
            });
        }

        let tail = (1.0 - confidence_level) / 2.0;
        let mut rng = Pcg64::seed_from_u64(self.seed);
        let mut lower = Vec::with_capacity(point.len());
        let mut upper = Vec::with_capacity(point.len());
        let mut draws = vec![0.0; n_resamples];

        for &p in point {
            for draw in draws.iter_mut() {
                *draw = p + usable[rng.gen_range(0..usable.len())];
            }
            let lo = stats::quantile(&draws, tail)?;
            let hi = stats::quantile(&draws, 1.0 - tail)?;
            lower.push(lo.min(p));
            upper.push(hi.max(p));
        }

        Ok((lower, upper))
    }

    /// Band of ±`fallback_band` relative to each point
    pub fn proportional(&self, point: Vec<f64>) -> IntervalForecast {
        let half_widths: Vec<f64> = point.iter().map(|p| self.fallback_band * p.abs()).collect();
        IntervalForecast {
            lower: point.iter().zip(&half_widths).map(|(p, w)| p - w).collect(),
            upper: point.iter().zip(&half_widths).map(|(p, w)| p + w).collect(),
            point,
            method: BandMethod::Proportional {
                band: self.fallback_band,
            },
        }
    }
}

fn validate(n_resamples: usize, confidence_level: f64) -> Result<()> {
    if n_resamples == 0 {
        return Err(ForecastError::InvalidParameter(
            "n_resamples must be positive".to_string(),
        ));
    }
    if !(confidence_level > 0.0 && confidence_level < 1.0) {
        return Err(ForecastError::InvalidParameter(format!(
            "Confidence level must be in (0, 1), got {}",
            confidence_level
        )));
    }
    Ok(())
}
