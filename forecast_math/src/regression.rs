//! Least-squares trend fitting
//!
//! The trend is fitted against the observation index `0..n`, so a value at
//! index `x` (possibly beyond the fitted range) is `intercept + slope * x`.

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

/// Ordinary least squares line fitted on the observation index
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearTrend {
    slope: f64,
    intercept: f64,
    observations: usize,
}

impl LinearTrend {
    /// Fit a trend line through `values`, using the position as the regressor
    pub fn fit(values: &[f64]) -> Result<Self> {
        if values.len() < 2 {
            return Err(MathError::InsufficientData(format!(
                "Need at least 2 points for a trend line, have {}",
                values.len()
            )));
        }

        let n = values.len() as f64;
        let x_mean = (n - 1.0) / 2.0;
        let y_mean = values.iter().sum::<f64>() / n;

        let mut numerator = 0.0;
        let mut denominator = 0.0;

        for (i, &y) in values.iter().enumerate() {
            let x = i as f64;
            numerator += (x - x_mean) * (y - y_mean);
            denominator += (x - x_mean) * (x - x_mean);
        }

        if denominator.abs() < 1e-10 {
            return Err(MathError::CalculationError(
                "Cannot calculate slope: x values are too similar".to_string(),
            ));
        }

        let slope = numerator / denominator;
        let intercept = y_mean - slope * x_mean;

        if !slope.is_finite() || !intercept.is_finite() {
            return Err(MathError::CalculationError(format!(
                "Non-finite trend coefficients (slope={}, intercept={})",
                slope, intercept
            )));
        }

        Ok(Self {
            slope,
            intercept,
            observations: values.len(),
        })
    }

    /// Trend value at index `x`
    pub fn value_at(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }

    /// Trend values for the fitted range `0..observations`
    pub fn fitted(&self) -> Vec<f64> {
        (0..self.observations)
            .map(|i| self.value_at(i as f64))
            .collect()
    }

    /// Extrapolate `horizon` values past the fitted range
    pub fn extrapolate(&self, horizon: usize) -> Vec<f64> {
        (0..horizon)
            .map(|h| self.value_at((self.observations + h) as f64))
            .collect()
    }

    pub fn slope(&self) -> f64 {
        self.slope
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn observations(&self) -> usize {
        self.observations
    }

    /// Coefficient of determination against the values the line was fitted on
    pub fn r_squared(&self, values: &[f64]) -> Result<f64> {
        if values.len() != self.observations {
            return Err(MathError::InvalidInput(format!(
                "Expected {} values, got {}",
                self.observations,
                values.len()
            )));
        }

        let y_mean = values.iter().sum::<f64>() / values.len() as f64;
        let mut ss_total = 0.0;
        let mut ss_residual = 0.0;

        for (i, &y) in values.iter().enumerate() {
            ss_total += (y - y_mean).powi(2);
            ss_residual += (y - self.value_at(i as f64)).powi(2);
        }

        if ss_total.abs() < 1e-10 {
            return Err(MathError::CalculationError(
                "Cannot calculate R-squared: total sum of squares is too small".to_string(),
            ));
        }

        Ok(1.0 - (ss_residual / ss_total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_line() {
        let trend = LinearTrend::fit(&[10.0, 20.0, 30.0]).unwrap();

        assert!((trend.slope() - 10.0).abs() < 1e-9);
        assert!((trend.intercept() - 10.0).abs() < 1e-9);
        assert!((trend.extrapolate(1)[0] - 40.0).abs() < 1e-9);
        assert!(trend.r_squared(&[10.0, 20.0, 30.0]).unwrap() > 0.999);
    }

    #[test]
    fn test_flat_series_has_zero_slope() {
        let trend = LinearTrend::fit(&[5.0, 5.0, 5.0, 5.0]).unwrap();
        assert_eq!(trend.slope(), 0.0);
        assert_eq!(trend.fitted(), vec![5.0; 4]);
    }

    #[test]
    fn test_single_point_rejected() {
        assert!(matches!(
            LinearTrend::fit(&[1.0]),
            Err(MathError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_non_finite_input_rejected() {
        assert!(LinearTrend::fit(&[1.0, f64::NAN, 3.0]).is_err());
    }
}
