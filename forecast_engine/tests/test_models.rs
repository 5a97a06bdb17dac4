use chrono::NaiveDate;
use forecast_engine::config::{EngineConfig, SmoothingConfig, TreeEnsembleConfig};
use forecast_engine::data::{Frequency, TimeSeries};
use forecast_engine::error::ForecastError;
use forecast_engine::features::FeatureConfig;
use forecast_engine::models::{
    default_roster, ExponentialSmoothingAdapter, ModelAdapter, TreeEnsembleAdapter,
    TrendSeasonalAdapter,
};
use pretty_assertions::assert_eq;

/// Pattern with zero mean and no correlation with the period index
const PATTERN: [f64; 12] = [3.0, -3.0, -3.0, 3.0, 3.0, -3.0, -3.0, 3.0, 3.0, -3.0, -3.0, 3.0];

fn monthly_series(values: Vec<f64>) -> TimeSeries {
    let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    let dates = (0..values.len())
        .map(|k| Frequency::Monthly.advance(start, k).unwrap())
        .collect();
    TimeSeries::new("Metric", dates, values, Frequency::Monthly).unwrap()
}

fn seasonal_value(i: usize) -> f64 {
    200.0 + 2.0 * i as f64 + PATTERN[i % 12]
}

fn assert_close(actual: &[f64], expected: &[f64], tolerance: f64) {
    assert_eq!(actual.len(), expected.len());
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() < tolerance, "{} vs {}", a, e);
    }
}

#[test]
fn test_default_roster_order() {
    let roster = default_roster(&EngineConfig::default());
    let names: Vec<&str> = roster.iter().map(|a| a.name()).collect();
    assert_eq!(
        names,
        vec!["tree_ensemble", "trend_seasonal", "exponential_smoothing"]
    );
}

#[test]
fn test_trend_seasonal_on_linear_series() {
    let series = monthly_series((0..24).map(|i| 100.0 + 3.0 * i as f64).collect());
    let adapter = TrendSeasonalAdapter::new();

    let candidate = adapter.fit(&series, 3).unwrap();
    assert_eq!(candidate.algorithm, "trend_seasonal");
    assert_eq!(candidate.training_window.observations, 24);
    assert_eq!(candidate.training_window.end, series.last_timestamp());

    let forecast = adapter.predict(&candidate, 3).unwrap();
    assert_close(&forecast, &[172.0, 175.0, 178.0], 1e-6);
}

#[test]
fn test_trend_seasonal_recovers_seasonality() {
    let series = monthly_series((0..36).map(seasonal_value).collect());
    let adapter = TrendSeasonalAdapter::new();

    let candidate = adapter.fit(&series, 12).unwrap();
    let forecast = adapter.predict(&candidate, 12).unwrap();
    let expected: Vec<f64> = (36..48).map(seasonal_value).collect();
    assert_close(&forecast, &expected, 1e-6);
}

#[test]
fn test_trend_seasonal_rejects_constant_series() {
    let series = monthly_series(vec![50.0; 12]);
    let result = TrendSeasonalAdapter::new().fit(&series, 3);

    match result {
        Err(e @ ForecastError::ConvergenceFailure { .. }) => assert!(e.is_disqualification()),
        other => panic!("expected convergence failure, got {:?}", other),
    }
}

#[test]
fn test_minimum_history() {
    let short = monthly_series(vec![1.0, 2.0]);
    assert!(matches!(
        TrendSeasonalAdapter::new().fit(&short, 1),
        Err(ForecastError::InsufficientHistory(_))
    ));

    let three = monthly_series(vec![1.0, 2.0, 4.0]);
    assert!(matches!(
        ExponentialSmoothingAdapter::default().fit(&three, 1),
        Err(ForecastError::InsufficientHistory(_))
    ));

    let fifteen = monthly_series((0..15).map(|i| i as f64).collect());
    assert!(matches!(
        TreeEnsembleAdapter::default().fit(&fifteen, 1),
        Err(ForecastError::InsufficientHistory(_))
    ));
}

#[test]
fn test_exponential_smoothing_linear_series() {
    let series = monthly_series((0..10).map(|i| 100.0 + 5.0 * i as f64).collect());
    let adapter = ExponentialSmoothingAdapter::default();

    let candidate = adapter.fit(&series, 4).unwrap();
    let forecast = adapter.predict(&candidate, 4).unwrap();
    assert_close(&forecast, &[150.0, 155.0, 160.0, 165.0], 1e-6);
}

#[test]
fn test_exponential_smoothing_seasonal_series() {
    let series = monthly_series((0..36).map(seasonal_value).collect());
    let adapter = ExponentialSmoothingAdapter::default();

    let candidate = adapter.fit(&series, 6).unwrap();
    let forecast = adapter.predict(&candidate, 6).unwrap();
    let expected: Vec<f64> = (36..42).map(seasonal_value).collect();
    assert_close(&forecast, &expected, 1e-6);
}

#[test]
fn test_exponential_smoothing_iteration_cap() {
    let values: Vec<f64> = (0..20)
        .map(|i| 100.0 + ((i * 7) % 5) as f64 * 3.0)
        .collect();
    let series = monthly_series(values);
    let adapter = ExponentialSmoothingAdapter::new(SmoothingConfig {
        max_iterations: 1,
        tolerance: 1e-4,
    });

    assert!(matches!(
        adapter.fit(&series, 3),
        Err(ForecastError::ConvergenceFailure { .. })
    ));
}

#[test]
fn test_tree_ensemble_min_observations() {
    let adapter = TreeEnsembleAdapter::default();
    assert_eq!(adapter.min_observations(Frequency::Monthly), 20);
    assert_eq!(adapter.min_observations(Frequency::Quarterly), 12);

    let custom = TreeEnsembleAdapter::new(
        TreeEnsembleConfig::default(),
        Some(FeatureConfig::new(vec![1, 2], vec![])),
        7,
    );
    assert_eq!(custom.min_observations(Frequency::Monthly), 10);
}

#[test]
fn test_tree_ensemble_forecast_is_deterministic() {
    let series = monthly_series((0..40).map(seasonal_value).collect());
    let adapter = TreeEnsembleAdapter::default();

    let first = adapter.fit(&series, 6).unwrap();
    let second = adapter.fit(&series, 6).unwrap();
    let a = adapter.predict(&first, 6).unwrap();
    let b = adapter.predict(&second, 6).unwrap();

    assert_eq!(a.len(), 6);
    assert!(a.iter().all(|v| v.is_finite()));
    assert_eq!(a, b);
}

#[test]
fn test_tree_ensemble_tracks_level() {
    // Flat series with a small repeating wiggle
    let values: Vec<f64> = (0..48).map(|i| 500.0 + PATTERN[i % 12]).collect();
    let series = monthly_series(values);
    let adapter = TreeEnsembleAdapter::default();

    let candidate = adapter.fit(&series, 12).unwrap();
    let forecast = adapter.predict(&candidate, 12).unwrap();
    for value in forecast {
        assert!((value - 500.0).abs() < 10.0, "forecast {} drifted", value);
    }
}

#[test]
fn test_predict_rejects_foreign_candidate() {
    let series = monthly_series((0..12).map(|i| 10.0 + i as f64).collect());
    let candidate = TrendSeasonalAdapter::new().fit(&series, 2).unwrap();

    let result = ExponentialSmoothingAdapter::default().predict(&candidate, 2);
    assert!(matches!(result, Err(ForecastError::ValidationError(_))));
}
