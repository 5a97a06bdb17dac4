//! Descriptive statistics over slices of observations

use crate::{MathError, Result};
use statrs::statistics::{Data, OrderStatistics, Statistics};

/// Arithmetic mean, NaN for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    values.iter().mean()
}

/// Sample standard deviation (n - 1 denominator), NaN for fewer than 2 values
pub fn sample_std_dev(values: &[f64]) -> f64 {
    values.iter().std_dev()
}

/// Population variance (n denominator)
pub fn population_variance(values: &[f64]) -> f64 {
    values.iter().population_variance()
}

/// Whether every value is identical up to `tolerance` relative to the scale of the data
pub fn is_constant(values: &[f64], tolerance: f64) -> bool {
    let Some(&first) = values.first() else {
        return true;
    };
    let scale = values.iter().fold(1.0_f64, |acc, v| acc.max(v.abs()));
    values.iter().all(|v| (v - first).abs() <= tolerance * scale)
}

/// Empirical quantile of `values` at probability `tau`
pub fn quantile(values: &[f64], tau: f64) -> Result<f64> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot take a quantile of an empty sample".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&tau) {
        return Err(MathError::InvalidInput(format!(
            "Quantile probability must be within [0, 1], got {}",
            tau
        )));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(MathError::InvalidInput(
            "Quantile sample contains non-finite values".to_string(),
        ));
    }

    let mut data = Data::new(values.to_vec());
    Ok(data.quantile(tau))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_std() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((mean(&values) - 5.0).abs() < 1e-12);
        assert!((population_variance(&values) - 4.0).abs() < 1e-12);
        assert!((sample_std_dev(&values) - (32.0_f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_std_of_single_value_is_nan() {
        assert!(sample_std_dev(&[3.0]).is_nan());
    }

    #[test]
    fn test_quantile_extremes() {
        let values = [5.0, 1.0, 3.0, 2.0, 4.0];
        assert_eq!(quantile(&values, 0.0).unwrap(), 1.0);
        assert_eq!(quantile(&values, 1.0).unwrap(), 5.0);
        let median = quantile(&values, 0.5).unwrap();
        assert!((median - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_quantile_rejects_bad_input() {
        assert!(quantile(&[], 0.5).is_err());
        assert!(quantile(&[1.0, 2.0], 1.5).is_err());
        assert!(quantile(&[1.0, f64::NAN], 0.5).is_err());
    }

    #[test]
    fn test_is_constant() {
        assert!(is_constant(&[4.0, 4.0, 4.0], 1e-12));
        assert!(!is_constant(&[4.0, 4.5, 4.0], 1e-12));
        assert!(is_constant(&[], 1e-12));
    }
}
