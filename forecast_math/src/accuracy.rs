//! Forecast accuracy measures

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

/// Calculate accuracy metrics for a forecast vs actual values
pub fn forecast_accuracy(forecast: &[f64], actual: &[f64]) -> Result<ForecastAccuracy> {
    if forecast.len() != actual.len() || forecast.is_empty() {
        return Err(MathError::InvalidInput(
            "Forecast and actual values must have the same non-zero length".to_string(),
        ));
    }

    Ok(ForecastAccuracy {
        mae: mae(forecast, actual),
        mse: mse(forecast, actual),
        rmse: mse(forecast, actual).sqrt(),
        mape: mape(forecast, actual).ok(),
        smape: smape(forecast, actual),
    })
}

/// Mean Absolute Error
pub fn mae(forecast: &[f64], actual: &[f64]) -> f64 {
    let n = forecast.len() as f64;
    forecast
        .iter()
        .zip(actual.iter())
        .map(|(&f, &a)| (a - f).abs())
        .sum::<f64>()
        / n
}

/// Mean Squared Error
pub fn mse(forecast: &[f64], actual: &[f64]) -> f64 {
    let n = forecast.len() as f64;
    forecast
        .iter()
        .zip(actual.iter())
        .map(|(&f, &a)| (a - f).powi(2))
        .sum::<f64>()
        / n
}

/// Mean Absolute Percentage Error, in percent.
///
/// Undefined when any actual value is zero.
pub fn mape(forecast: &[f64], actual: &[f64]) -> Result<f64> {
    if let Some(position) = actual.iter().position(|&a| a == 0.0) {
        return Err(MathError::InvalidInput(format!(
            "MAPE is undefined: actual value at position {} is zero",
            position
        )));
    }
    let n = forecast.len() as f64;
    Ok(actual
        .iter()
        .zip(forecast.iter())
        .map(|(&a, &f)| ((a - f).abs() / a.abs()) * 100.0)
        .sum::<f64>()
        / n)
}

/// Symmetric Mean Absolute Percentage Error, in percent
pub fn smape(forecast: &[f64], actual: &[f64]) -> f64 {
    let n = forecast.len() as f64;
    actual
        .iter()
        .zip(forecast.iter())
        .map(|(&a, &f)| {
            let denominator = a.abs() + f.abs();
            if denominator == 0.0 {
                0.0
            } else {
                200.0 * (a - f).abs() / denominator
            }
        })
        .sum::<f64>()
        / n
}

/// Forecast accuracy metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastAccuracy {
    /// Mean Absolute Error
    pub mae: f64,
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error, `None` when an actual value is zero
    pub mape: Option<f64>,
    /// Symmetric Mean Absolute Percentage Error
    pub smape: f64,
}

impl std::fmt::Display for ForecastAccuracy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Forecast Accuracy Metrics:")?;
        writeln!(f, "  MAE:   {:.4}", self.mae)?;
        writeln!(f, "  MSE:   {:.4}", self.mse)?;
        writeln!(f, "  RMSE:  {:.4}", self.rmse)?;
        match self.mape {
            Some(mape) => writeln!(f, "  MAPE:  {:.4}%", mape)?,
            None => writeln!(f, "  MAPE:  undefined")?,
        }
        writeln!(f, "  SMAPE: {:.4}%", self.smape)?;
        Ok(())
    }
}
