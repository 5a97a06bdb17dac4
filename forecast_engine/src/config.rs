//! Engine configuration
//!
//! Loaded from JSON; every field has a default so partial documents work.

use crate::competition::ScoringMetric;
use crate::error::{ForecastError, Result};
use crate::features::FeatureConfig;
use crate::scenario::{ScenarioShape, DEFAULT_MAGNITUDE_FLOOR};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration for a forecasting run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Share of the series held out for scoring, in (0, 1)
    pub holdout_fraction: f64,
    pub scoring: ScoringMetric,
    /// Seed for every stochastic step (tree subsampling, bootstrap)
    pub seed: u64,
    /// Fit adapters and batch metrics on the rayon pool
    pub parallel: bool,
    /// Tree ensemble features; derived from the series frequency when absent
    pub features: Option<FeatureConfig>,
    pub uncertainty: UncertaintyConfig,
    pub scenario: ScenarioConfig,
    pub tree_ensemble: TreeEnsembleConfig,
    pub smoothing: SmoothingConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            holdout_fraction: 0.2,
            scoring: ScoringMetric::Mape,
            seed: 42,
            parallel: true,
            features: None,
            uncertainty: UncertaintyConfig::default(),
            scenario: ScenarioConfig::default(),
            tree_ensemble: TreeEnsembleConfig::default(),
            smoothing: SmoothingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UncertaintyConfig {
    pub n_resamples: usize,
    pub confidence_level: f64,
    /// Relative half-width used when residuals cannot be bootstrapped
    pub fallback_band: f64,
}

impl Default for UncertaintyConfig {
    fn default() -> Self {
        Self {
            n_resamples: 1000,
            confidence_level: 0.95,
            fallback_band: 0.10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub optimistic_multiplier: f64,
    pub pessimistic_multiplier: f64,
    pub shape: ScenarioShape,
    /// Multipliers act on at least this magnitude, so zero points still spread
    pub magnitude_floor: f64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            optimistic_multiplier: 1.1,
            pessimistic_multiplier: 0.9,
            shape: ScenarioShape::Constant,
            magnitude_floor: DEFAULT_MAGNITUDE_FLOOR,
        }
    }
}

/// Gradient boosting hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeEnsembleConfig {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    /// Fraction of training rows sampled for each tree, in (0, 1]
    pub subsample: f64,
    /// Complete feature rows needed before the ensemble is trained
    pub min_training_rows: usize,
}

impl Default for TreeEnsembleConfig {
    fn default() -> Self {
        Self {
            n_estimators: 50,
            learning_rate: 0.1,
            max_depth: 3,
            min_samples_leaf: 2,
            subsample: 0.8,
            min_training_rows: 8,
        }
    }
}

/// Parameter search limits for exponential smoothing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    pub max_iterations: usize,
    /// Refinement stops once the step size falls below this
    pub tolerance: f64,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            tolerance: 1e-4,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.holdout_fraction > 0.0 && self.holdout_fraction < 1.0) {
            return Err(invalid(format!(
                "holdout_fraction must be in (0, 1), got {}",
                self.holdout_fraction
            )));
        }

        let u = &self.uncertainty;
        if u.n_resamples == 0 {
            return Err(invalid("n_resamples must be positive".to_string()));
        }
        if !(u.confidence_level > 0.0 && u.confidence_level < 1.0) {
            return Err(invalid(format!(
                "confidence_level must be in (0, 1), got {}",
                u.confidence_level
            )));
        }
        if !(u.fallback_band.is_finite() && u.fallback_band >= 0.0) {
            return Err(invalid(format!(
                "fallback_band must be a non-negative number, got {}",
                u.fallback_band
            )));
        }

        let s = &self.scenario;
        let bracketed = s.optimistic_multiplier.is_finite()
            && s.pessimistic_multiplier.is_finite()
            && s.optimistic_multiplier > 1.0
            && s.pessimistic_multiplier < 1.0;
        if !bracketed {
            return Err(ForecastError::InvalidScenarioConfig(format!(
                "optimistic multiplier {} and pessimistic multiplier {} must bracket 1.0",
                s.optimistic_multiplier, s.pessimistic_multiplier
            )));
        }
        if !(s.magnitude_floor.is_finite() && s.magnitude_floor > 0.0) {
            return Err(ForecastError::InvalidScenarioConfig(format!(
                "magnitude_floor must be finite and positive, got {}",
                s.magnitude_floor
            )));
        }

        let t = &self.tree_ensemble;
        if t.n_estimators == 0 || t.max_depth == 0 || t.min_samples_leaf == 0 {
            return Err(invalid(
                "n_estimators, max_depth and min_samples_leaf must be positive".to_string(),
            ));
        }
        if !(t.learning_rate > 0.0 && t.learning_rate <= 1.0) {
            return Err(invalid(format!(
                "learning_rate must be in (0, 1], got {}",
                t.learning_rate
            )));
        }
        if !(t.subsample > 0.0 && t.subsample <= 1.0) {
            return Err(invalid(format!(
                "subsample must be in (0, 1], got {}",
                t.subsample
            )));
        }
        if t.min_training_rows < 2 {
            return Err(invalid("min_training_rows must be at least 2".to_string()));
        }

        if self.smoothing.max_iterations == 0 || !(self.smoothing.tolerance > 0.0) {
            return Err(invalid(
                "smoothing max_iterations and tolerance must be positive".to_string(),
            ));
        }

        if let Some(features) = &self.features {
            features.validate()?;
        }

        Ok(())
    }
}

fn invalid(message: String) -> ForecastError {
    ForecastError::ConfigError(message)
}
