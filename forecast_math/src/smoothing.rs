//! Exponential smoothing recurrences
//!
//! Contains the state machines for:
//! - Holt's linear trend method (level + trend)
//! - Additive Holt-Winters (level + trend + seasonal)
//!
//! Parameter search lives with the callers; these types only apply the
//! update equations and extrapolate.

use crate::{MathError, Result};

fn validate_smoothing(value: f64, name: &str) -> Result<()> {
    if !(value > 0.0 && value < 1.0) {
        return Err(MathError::InvalidInput(format!(
            "{} must be between 0 and 1 (exclusive), got {}",
            name, value
        )));
    }
    Ok(())
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Holt's linear trend method
#[derive(Debug, Clone, PartialEq)]
pub struct HoltState {
    alpha: f64,
    beta: f64,
    level: f64,
    trend: f64,
}

impl HoltState {
    /// Initialise from the first two observations (level = y0, trend = y1 - y0)
    pub fn initialize(values: &[f64], alpha: f64, beta: f64) -> Result<Self> {
        validate_smoothing(alpha, "Alpha")?;
        validate_smoothing(beta, "Beta")?;
        if values.len() < 2 {
            return Err(MathError::InsufficientData(
                "Holt's method needs at least 2 observations".to_string(),
            ));
        }

        Ok(Self {
            alpha,
            beta,
            level: values[0],
            trend: values[1] - values[0],
        })
    }

    /// Forecast for the next observation
    pub fn one_step(&self) -> f64 {
        self.level + self.trend
    }

    /// Apply the level and trend update for a new observation
    pub fn update(&mut self, value: f64) {
        let new_level = self.alpha * value + (1.0 - self.alpha) * (self.level + self.trend);
        let new_trend = self.beta * (new_level - self.level) + (1.0 - self.beta) * self.trend;

        self.level = new_level;
        self.trend = new_trend;
    }

    /// Forecast `h` steps ahead (h >= 1)
    pub fn forecast(&self, h: usize) -> f64 {
        self.level + (h as f64) * self.trend
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    pub fn trend(&self) -> f64 {
        self.trend
    }

    /// Run the recurrence over `values` and return the state after the last
    /// observation together with the one-step-ahead sum of squared errors.
    pub fn run(values: &[f64], alpha: f64, beta: f64) -> Result<(Self, f64)> {
        let mut state = Self::initialize(values, alpha, beta)?;
        let mut sse = 0.0;

        for &value in &values[1..] {
            let error = value - state.one_step();
            sse += error * error;
            state.update(value);
        }

        Ok((state, sse))
    }
}

/// Additive Holt-Winters method
#[derive(Debug, Clone, PartialEq)]
pub struct HoltWintersState {
    alpha: f64,
    beta: f64,
    gamma: f64,
    level: f64,
    trend: f64,
    seasonal: Vec<f64>,
    /// Index of the next observation to be absorbed
    position: usize,
}

impl HoltWintersState {
    /// Initialise from the first two full seasons.
    ///
    /// The trend is the difference of the two season means divided by the
    /// period; the level is anchored at the last index of the first season
    /// and the seasonal indices are the first-season deviations from that
    /// trend line.
    pub fn initialize(
        values: &[f64],
        period: usize,
        alpha: f64,
        beta: f64,
        gamma: f64,
    ) -> Result<Self> {
        validate_smoothing(alpha, "Alpha")?;
        validate_smoothing(beta, "Beta")?;
        validate_smoothing(gamma, "Gamma")?;
        if period < 2 {
            return Err(MathError::InvalidInput(format!(
                "Seasonal period must be at least 2, got {}",
                period
            )));
        }
        if values.len() < 2 * period {
            return Err(MathError::InsufficientData(format!(
                "Holt-Winters needs two full seasons ({} observations), have {}",
                2 * period,
                values.len()
            )));
        }

        let first_mean = mean(&values[..period]);
        let second_mean = mean(&values[period..2 * period]);
        let trend = (second_mean - first_mean) / period as f64;
        let center = (period as f64 - 1.0) / 2.0;

        let seasonal = values[..period]
            .iter()
            .enumerate()
            .map(|(i, &y)| y - (first_mean + trend * (i as f64 - center)))
            .collect();

        Ok(Self {
            alpha,
            beta,
            gamma,
            level: first_mean + trend * center,
            trend,
            seasonal,
            position: period,
        })
    }

    pub fn period(&self) -> usize {
        self.seasonal.len()
    }

    /// Forecast for the next observation
    pub fn one_step(&self) -> f64 {
        self.level + self.trend + self.seasonal[self.position % self.period()]
    }

    /// Apply the level, trend and seasonal updates for a new observation
    pub fn update(&mut self, value: f64) {
        let slot = self.position % self.period();
        let season = self.seasonal[slot];

        let new_level = self.alpha * (value - season) + (1.0 - self.alpha) * (self.level + self.trend);
        let new_trend = self.beta * (new_level - self.level) + (1.0 - self.beta) * self.trend;

        self.seasonal[slot] = self.gamma * (value - new_level) + (1.0 - self.gamma) * season;
        self.level = new_level;
        self.trend = new_trend;
        self.position += 1;
    }

    /// Forecast `h` steps ahead (h >= 1)
    pub fn forecast(&self, h: usize) -> f64 {
        let slot = (self.position + h - 1) % self.period();
        self.level + (h as f64) * self.trend + self.seasonal[slot]
    }

    pub fn seasonal(&self) -> &[f64] {
        &self.seasonal
    }

    /// Run the recurrence over `values` and return the final state together
    /// with the one-step-ahead sum of squared errors after initialisation.
    pub fn run(
        values: &[f64],
        period: usize,
        alpha: f64,
        beta: f64,
        gamma: f64,
    ) -> Result<(Self, f64)> {
        let mut state = Self::initialize(values, period, alpha, beta, gamma)?;
        let mut sse = 0.0;

        for &value in &values[period..] {
            let error = value - state.one_step();
            sse += error * error;
            state.update(value);
        }

        Ok((state, sse))
    }
}
