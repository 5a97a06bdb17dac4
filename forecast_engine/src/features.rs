//! Feature engineering for the tree ensemble
//!
//! Every feature at row `t` looks only at observations strictly before `t`,
//! so the same [`FeatureConfig::row`] serves both training frames and
//! recursive forecasting.

use crate::data::{date_to_millis, Frequency, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::store::DATE_COLUMN;
use chrono::NaiveDate;
use forecast_math::stats;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Which engineered columns to produce
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Lag orders, each at least 1
    pub lags: Vec<usize>,
    /// Rolling mean/std window lengths, each at least 2
    pub rolling_windows: Vec<usize>,
    /// One-hot seasonal position indicators
    pub seasonal_dummies: bool,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            lags: vec![1, 2, 3],
            rolling_windows: vec![3],
            seasonal_dummies: false,
        }
    }
}

impl FeatureConfig {
    pub fn new(lags: Vec<usize>, rolling_windows: Vec<usize>) -> Self {
        Self {
            lags,
            rolling_windows,
            seasonal_dummies: false,
        }
    }

    pub fn with_seasonal_dummies(mut self, enabled: bool) -> Self {
        self.seasonal_dummies = enabled;
        self
    }

    /// Default roster for a frequency: short lags plus one full season
    pub fn for_frequency(frequency: Frequency) -> Self {
        let season = frequency.season_length();

        let mut lags = vec![1, 2, 3, season];
        lags.sort_unstable();
        lags.dedup();

        let mut rolling_windows = vec![3];
        if season >= 2 {
            rolling_windows.push(season);
        }
        rolling_windows.sort_unstable();
        rolling_windows.dedup();

        Self {
            lags,
            rolling_windows,
            seasonal_dummies: season > 1,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.lags.contains(&0) {
            return Err(ForecastError::InvalidParameter(
                "Lag orders must be at least 1".to_string(),
            ));
        }
        if let Some(w) = self.rolling_windows.iter().find(|w| **w < 2) {
            return Err(ForecastError::InvalidParameter(format!(
                "Rolling windows must span at least 2 periods, got {}",
                w
            )));
        }
        if self.lags.is_empty() && self.rolling_windows.is_empty() && !self.seasonal_dummies {
            return Err(ForecastError::InvalidParameter(
                "Feature configuration produces no columns".to_string(),
            ));
        }
        Ok(())
    }

    pub fn max_lag(&self) -> usize {
        self.lags.iter().copied().max().unwrap_or(0)
    }

    /// Periods of history needed before a row has no missing features
    pub fn max_lookback(&self) -> usize {
        let window = self.rolling_windows.iter().copied().max().unwrap_or(0);
        self.max_lag().max(window)
    }

    /// Column names in the order `row` fills them
    pub fn feature_names(&self, frequency: Frequency) -> Vec<String> {
        let mut names: Vec<String> = self.lags.iter().map(|k| format!("lag_{}", k)).collect();
        for w in &self.rolling_windows {
            names.push(format!("rolling_mean_{}", w));
            names.push(format!("rolling_std_{}", w));
        }
        if self.seasonal_dummies {
            let season = frequency.season_length();
            if season > 1 {
                names.extend((0..season).map(|k| format!("season_{}", k)));
            }
        }
        names
    }

    /// Feature vector for the period dated `date` that follows `history`.
    /// Lookbacks longer than the history are NaN.
    pub fn row(&self, history: &[f64], date: NaiveDate, frequency: Frequency) -> Vec<f64> {
        let len = history.len();
        let mut row = Vec::with_capacity(self.lags.len() + 2 * self.rolling_windows.len());

        for &k in &self.lags {
            row.push(if len >= k { history[len - k] } else { f64::NAN });
        }

        for &w in &self.rolling_windows {
            if len >= w {
                let window = &history[len - w..];
                row.push(stats::mean(window));
                row.push(stats::sample_std_dev(window));
            } else {
                row.push(f64::NAN);
                row.push(f64::NAN);
            }
        }

        if self.seasonal_dummies {
            let season = frequency.season_length();
            if season > 1 {
                let position = frequency.season_index(date) % season;
                row.extend((0..season).map(|k| if k == position { 1.0 } else { 0.0 }));
            }
        }

        row
    }
}

/// Engineered features keyed by the series' timestamps
#[derive(Debug, Clone)]
pub struct FeatureFrame {
    frame: DataFrame,
    timestamps: Vec<NaiveDate>,
    feature_names: Vec<String>,
    rows: Vec<Vec<f64>>,
    targets: Vec<f64>,
}

impl FeatureFrame {
    /// The frame with a `date` column followed by the feature columns
    pub fn dataframe(&self) -> &DataFrame {
        &self.frame
    }

    pub fn timestamps(&self) -> &[NaiveDate] {
        &self.timestamps
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Values of one feature column, NaN where lookback is missing
    pub fn column(&self, name: &str) -> Result<Vec<f64>> {
        let series = self.frame.column(name)?;
        Ok(series
            .f64()?
            .into_iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect())
    }

    /// Rows whose features are all finite, with the observed value at each
    pub fn complete_rows(&self) -> (Vec<Vec<f64>>, Vec<f64>) {
        self.rows
            .iter()
            .zip(&self.targets)
            .filter(|(row, _)| row.iter().all(|v| v.is_finite()))
            .map(|(row, target)| (row.clone(), *target))
            .unzip()
    }
}

/// Builds feature frames from a single metric series
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureBuilder;

impl FeatureBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Lag and rolling-window features for `series`
    pub fn build(
        &self,
        series: &TimeSeries,
        lag_orders: &[usize],
        rolling_windows: &[usize],
    ) -> Result<FeatureFrame> {
        let config = FeatureConfig::new(lag_orders.to_vec(), rolling_windows.to_vec());
        self.build_with(series, &config)
    }

    pub fn build_with(&self, series: &TimeSeries, config: &FeatureConfig) -> Result<FeatureFrame> {
        config.validate()?;

        let max_lag = config.max_lag();
        if series.len() < max_lag + 1 {
            return Err(ForecastError::InsufficientHistory(format!(
                "'{}' has {} observations; lag {} needs at least {}",
                series.name(),
                series.len(),
                max_lag,
                max_lag + 1
            )));
        }

        let frequency = series.frequency();
        let values = series.values();
        let timestamps = series.timestamps();
        let feature_names = config.feature_names(frequency);

        let rows: Vec<Vec<f64>> = (0..values.len())
            .map(|t| config.row(&values[..t], timestamps[t], frequency))
            .collect();

        let mut columns = Vec::with_capacity(feature_names.len() + 1);
        let millis: Vec<i64> = timestamps.iter().map(|d| date_to_millis(*d)).collect();
        columns.push(Series::new(DATE_COLUMN, millis));
        for (j, name) in feature_names.iter().enumerate() {
            let column: Vec<f64> = rows.iter().map(|row| row[j]).collect();
            columns.push(Series::new(name, column));
        }
        let frame = DataFrame::new(columns)?;

        log::debug!(
            "built {} feature columns over {} rows for '{}'",
            feature_names.len(),
            rows.len(),
            series.name()
        );

        Ok(FeatureFrame {
            frame,
            timestamps: timestamps.to_vec(),
            feature_names,
            rows,
            targets: values.to_vec(),
        })
    }
}
