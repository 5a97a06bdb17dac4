use chrono::NaiveDate;
use forecast_engine::data::{Frequency, TimeSeries};
use forecast_engine::error::ForecastError;
use forecast_engine::models::{ModelAdapter, ModelCandidate, TrendSeasonalAdapter};
use forecast_engine::uncertainty::{BandMethod, UncertaintyEstimator};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn ramp_candidate() -> ModelCandidate {
    let start = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
    let dates = (0..12)
        .map(|k| Frequency::Monthly.advance(start, k).unwrap())
        .collect();
    let values = (0..12).map(|i| 100.0 + 10.0 * i as f64).collect();
    let series = TimeSeries::new("Revenue", dates, values, Frequency::Monthly).unwrap();
    TrendSeasonalAdapter::new().fit(&series, 4).unwrap()
}

fn assert_bracketed(lower: &[f64], point: &[f64], upper: &[f64]) {
    for ((lo, p), hi) in lower.iter().zip(point).zip(upper) {
        assert!(lo <= p && p <= hi, "{} <= {} <= {}", lo, p, hi);
    }
}

#[test]
fn test_bootstrap_band() {
    let candidate = ramp_candidate();
    let estimator = UncertaintyEstimator::new(42, 0.1);

    let interval = estimator
        .estimate(&candidate, &[-2.0, 2.0], 4, 1000, 0.95)
        .unwrap();

    assert_eq!(interval.method, BandMethod::Bootstrap { resamples: 1000 });
    assert_eq!(interval.point.len(), 4);
    for ((lo, p), hi) in interval.lower.iter().zip(&interval.point).zip(&interval.upper) {
        assert!((lo - (p - 2.0)).abs() < 1e-9);
        assert!((hi - (p + 2.0)).abs() < 1e-9);
    }
}

#[test]
fn test_bootstrap_is_seeded() {
    let candidate = ramp_candidate();
    let residuals = [-3.0, -1.0, 0.5, 2.0, 4.0, -0.5];

    let a = UncertaintyEstimator::new(7, 0.1)
        .estimate(&candidate, &residuals, 4, 500, 0.8)
        .unwrap();
    let b = UncertaintyEstimator::new(7, 0.1)
        .estimate(&candidate, &residuals, 4, 500, 0.8)
        .unwrap();

    assert_eq!(a, b);
    assert_bracketed(&a.lower, &a.point, &a.upper);
}

#[test]
fn test_band_always_contains_point() {
    let candidate = ramp_candidate();
    // One-sided residuals push both quantiles above the point
    let interval = UncertaintyEstimator::new(1, 0.1)
        .estimate(&candidate, &[1.0, 2.0, 3.0], 3, 200, 0.9)
        .unwrap();

    assert_eq!(interval.lower, interval.point);
    assert_bracketed(&interval.lower, &interval.point, &interval.upper);
}

#[rstest]
#[case(vec![])]
#[case(vec![1.5])]
#[case(vec![f64::NAN, 1.5, f64::INFINITY])]
fn test_fallback_band(#[case] residuals: Vec<f64>) {
    let candidate = ramp_candidate();
    let interval = UncertaintyEstimator::new(42, 0.1)
        .estimate(&candidate, &residuals, 2, 1000, 0.95)
        .unwrap();

    assert_eq!(interval.method, BandMethod::Proportional { band: 0.1 });
    for ((lo, p), hi) in interval.lower.iter().zip(&interval.point).zip(&interval.upper) {
        assert!((lo - 0.9 * p).abs() < 1e-9);
        assert!((hi - 1.1 * p).abs() < 1e-9);
    }
}

#[test]
fn test_insufficient_residuals_error() {
    let estimator = UncertaintyEstimator::new(42, 0.1);
    let result = estimator.bootstrap(&[10.0, 11.0], &[0.5], 100, 0.95);

    assert!(matches!(
        result,
        Err(ForecastError::InsufficientResiduals {
            required: 2,
            actual: 1
        })
    ));
}

#[rstest]
#[case(0, 0.95)]
#[case(100, 1.0)]
#[case(100, 0.0)]
fn test_invalid_estimate_parameters(#[case] n_resamples: usize, #[case] confidence: f64) {
    let candidate = ramp_candidate();
    let result = UncertaintyEstimator::new(42, 0.1).estimate(
        &candidate,
        &[1.0, -1.0],
        3,
        n_resamples,
        confidence,
    );
    assert!(matches!(result, Err(ForecastError::InvalidParameter(_))));
}

#[test]
fn test_proportional_band_for_negative_values() {
    let interval = UncertaintyEstimator::new(0, 0.2).proportional(vec![-50.0, 0.0, 50.0]);

    assert_eq!(interval.lower, vec![-60.0, 0.0, 40.0]);
    assert_eq!(interval.upper, vec![-40.0, 0.0, 60.0]);
}
