//! Forecast output records

use crate::competition::CompetitionResult;
use crate::data::date_to_millis;
use crate::error::Result;
use crate::store::{Derivation, DATE_COLUMN};
use crate::uncertainty::{BandMethod, IntervalForecast};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Competition(s) a forecast came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ForecastOrigin {
    Direct {
        competition: CompetitionResult,
    },
    /// Recombined from component forecasts
    Composed {
        derivation: Derivation,
        components: Vec<CompetitionResult>,
    },
}

/// Forecast for one metric: point path, confidence band and scenarios.
///
/// Only built from a competition outcome, so every frame can be traced back
/// to the model(s) that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastFrame {
    metric: String,
    timestamps: Vec<NaiveDate>,
    forecast: Vec<f64>,
    lower: Vec<f64>,
    upper: Vec<f64>,
    optimistic: Vec<f64>,
    pessimistic: Vec<f64>,
    confidence_level: f64,
    band_method: BandMethod,
    origin: ForecastOrigin,
}

impl ForecastFrame {
    pub(crate) fn new(
        metric: &str,
        timestamps: Vec<NaiveDate>,
        interval: IntervalForecast,
        scenarios: (Vec<f64>, Vec<f64>),
        confidence_level: f64,
        origin: ForecastOrigin,
    ) -> Self {
        let (optimistic, pessimistic) = scenarios;
        Self {
            metric: metric.to_string(),
            timestamps,
            forecast: interval.point,
            lower: interval.lower,
            upper: interval.upper,
            optimistic,
            pessimistic,
            confidence_level,
            band_method: interval.method,
            origin,
        }
    }

    pub fn metric(&self) -> &str {
        &self.metric
    }

    pub fn timestamps(&self) -> &[NaiveDate] {
        &self.timestamps
    }

    pub fn forecast(&self) -> &[f64] {
        &self.forecast
    }

    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    pub fn optimistic(&self) -> &[f64] {
        &self.optimistic
    }

    pub fn pessimistic(&self) -> &[f64] {
        &self.pessimistic
    }

    pub fn confidence_level(&self) -> f64 {
        self.confidence_level
    }

    pub fn band_method(&self) -> &BandMethod {
        &self.band_method
    }

    pub fn origin(&self) -> &ForecastOrigin {
        &self.origin
    }

    pub fn horizon(&self) -> usize {
        self.forecast.len()
    }

    /// The competition behind a direct forecast
    pub fn competition(&self) -> Option<&CompetitionResult> {
        match &self.origin {
            ForecastOrigin::Direct { competition } => Some(competition),
            ForecastOrigin::Composed { .. } => None,
        }
    }

    /// Output table: `date` plus `{metric}_Forecast`, `_Lower`, `_Upper`,
    /// `_Optimistic` and `_Pessimistic`
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let millis: Vec<i64> = self.timestamps.iter().map(|d| date_to_millis(*d)).collect();
        let column = |suffix: &str, values: &[f64]| {
            Series::new(&format!("{}_{}", self.metric, suffix), values.to_vec())
        };

        Ok(DataFrame::new(vec![
            Series::new(DATE_COLUMN, millis),
            column("Forecast", &self.forecast),
            column("Lower", &self.lower),
            column("Upper", &self.upper),
            column("Optimistic", &self.optimistic),
            column("Pessimistic", &self.pessimistic),
        ])?)
    }
}
