use forecast_engine::competition::ScoringMetric;
use forecast_engine::config::EngineConfig;
use forecast_engine::error::ForecastError;
use forecast_engine::scenario::ScenarioShape;
use pretty_assertions::assert_eq;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_defaults() {
    let config = EngineConfig::default();

    assert_eq!(config.holdout_fraction, 0.2);
    assert_eq!(config.scoring, ScoringMetric::Mape);
    assert_eq!(config.seed, 42);
    assert_eq!(config.uncertainty.n_resamples, 1000);
    assert_eq!(config.uncertainty.confidence_level, 0.95);
    assert_eq!(config.uncertainty.fallback_band, 0.10);
    assert_eq!(config.scenario.optimistic_multiplier, 1.1);
    assert_eq!(config.scenario.pessimistic_multiplier, 0.9);
    assert_eq!(config.scenario.shape, ScenarioShape::Constant);
    assert_eq!(config.scenario.magnitude_floor, 1.0);
    assert!(config.features.is_none());
    assert!(config.validate().is_ok());
}

#[test]
fn test_partial_json_keeps_defaults() {
    let config = EngineConfig::from_json_str(
        r#"{
            "seed": 7,
            "scoring": "smape",
            "uncertainty": { "n_resamples": 200 },
            "scenario": { "shape": "ramp" }
        }"#,
    )
    .unwrap();

    assert_eq!(config.seed, 7);
    assert_eq!(config.scoring, ScoringMetric::Smape);
    assert_eq!(config.uncertainty.n_resamples, 200);
    assert_eq!(config.uncertainty.confidence_level, 0.95);
    assert_eq!(config.scenario.shape, ScenarioShape::Ramp);
    assert_eq!(config.scenario.optimistic_multiplier, 1.1);
}

#[test]
fn test_json_round_trip() {
    let config = EngineConfig {
        seed: 99,
        parallel: false,
        ..EngineConfig::default()
    };
    let json = config.to_json_string().unwrap();
    assert_eq!(EngineConfig::from_json_str(&json).unwrap(), config);
}

#[test]
fn test_load_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, r#"{{ "holdout_fraction": 0.3, "parallel": false }}"#).unwrap();

    let config = EngineConfig::from_json_file(file.path()).unwrap();
    assert_eq!(config.holdout_fraction, 0.3);
    assert!(!config.parallel);
}

#[test]
fn test_missing_file() {
    let result = EngineConfig::from_json_file("no_such_config.json");
    assert!(matches!(result, Err(ForecastError::IoError(_))));
}

#[test]
fn test_malformed_json() {
    let result = EngineConfig::from_json_str("{ not json");
    assert!(matches!(result, Err(ForecastError::ConfigError(_))));
}

#[test]
fn test_invalid_values_rejected() {
    assert!(matches!(
        EngineConfig::from_json_str(r#"{ "holdout_fraction": 1.5 }"#),
        Err(ForecastError::ConfigError(_))
    ));
    assert!(matches!(
        EngineConfig::from_json_str(r#"{ "uncertainty": { "confidence_level": 1.0 } }"#),
        Err(ForecastError::ConfigError(_))
    ));
    assert!(matches!(
        EngineConfig::from_json_str(
            r#"{ "scenario": { "optimistic_multiplier": 0.9, "pessimistic_multiplier": 1.1 } }"#
        ),
        Err(ForecastError::InvalidScenarioConfig(_))
    ));
    assert!(matches!(
        EngineConfig::from_json_str(r#"{ "scenario": { "magnitude_floor": 0.0 } }"#),
        Err(ForecastError::InvalidScenarioConfig(_))
    ));
    assert!(matches!(
        EngineConfig::from_json_str(r#"{ "features": { "lags": [0, 1] } }"#),
        Err(ForecastError::InvalidParameter(_))
    ));
}
