//! Optimistic and pessimistic scenario paths

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};

/// How a multiplier is applied across the horizon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioShape {
    /// The full multiplier from the first period
    #[default]
    Constant,
    /// Phased in linearly, reaching the full multiplier at the last period
    Ramp,
}

/// Smallest magnitude a multiplier is applied to, in units of the metric
pub const DEFAULT_MAGNITUDE_FLOOR: f64 = 1.0;

#[derive(Debug, Clone, Copy)]
pub struct ScenarioProjector {
    shape: ScenarioShape,
    magnitude_floor: f64,
}

impl Default for ScenarioProjector {
    fn default() -> Self {
        Self::new(ScenarioShape::default())
    }
}

impl ScenarioProjector {
    pub fn new(shape: ScenarioShape) -> Self {
        Self {
            shape,
            magnitude_floor: DEFAULT_MAGNITUDE_FLOOR,
        }
    }

    /// Replace the magnitude floor; it must be finite and positive
    pub fn with_magnitude_floor(mut self, floor: f64) -> Result<Self> {
        if !(floor.is_finite() && floor > 0.0) {
            return Err(ForecastError::InvalidScenarioConfig(format!(
                "magnitude floor must be finite and positive, got {}",
                floor
            )));
        }
        self.magnitude_floor = floor;
        Ok(self)
    }

    pub fn shape(&self) -> ScenarioShape {
        self.shape
    }

    pub fn magnitude_floor(&self) -> f64 {
        self.magnitude_floor
    }

    /// Returns `(optimistic, pessimistic)` paths.
    ///
    /// A multiplier `m` moves each value `p` to `p + (m - 1) * max(|p|, floor)`,
    /// so `optimistic > point > pessimistic` holds strictly for every period,
    /// including negative and zero points.
    pub fn project(
        &self,
        path: &[f64],
        optimistic_multiplier: f64,
        pessimistic_multiplier: f64,
    ) -> Result<(Vec<f64>, Vec<f64>)> {
        if !optimistic_multiplier.is_finite() || !pessimistic_multiplier.is_finite() {
            return Err(ForecastError::InvalidScenarioConfig(format!(
                "multipliers must be finite, got {} and {}",
                optimistic_multiplier, pessimistic_multiplier
            )));
        }
        if !(optimistic_multiplier > 1.0 && pessimistic_multiplier < 1.0) {
            return Err(ForecastError::InvalidScenarioConfig(format!(
                "need optimistic > 1.0 > pessimistic, got {} and {}",
                optimistic_multiplier, pessimistic_multiplier
            )));
        }

        let horizon = path.len();
        let scale = |multiplier: f64| -> Vec<f64> {
            path.iter()
                .enumerate()
                .map(|(t, &p)| {
                    let effective = match self.shape {
                        ScenarioShape::Constant => multiplier,
                        ScenarioShape::Ramp => {
                            1.0 + (multiplier - 1.0) * (t + 1) as f64 / horizon as f64
                        }
                    };
                    p + (effective - 1.0) * p.abs().max(self.magnitude_floor)
                })
                .collect()
        };

        Ok((scale(optimistic_multiplier), scale(pessimistic_multiplier)))
    }
}
