//! End-to-end forecasting pipeline over a series store

use crate::competition::{CompetitionResult, CompetitionRunner};
use crate::config::EngineConfig;
use crate::error::{ForecastError, Result};
use crate::frame::{ForecastFrame, ForecastOrigin};
use crate::scenario::ScenarioProjector;
use crate::store::{Derivation, SeriesStore};
use crate::uncertainty::{BandMethod, IntervalForecast, UncertaintyEstimator};
use rayon::prelude::*;

/// Direct and composed forecasts of the same derived metric, side by side
#[derive(Debug)]
pub struct CompositionComparison {
    pub direct: Result<ForecastFrame>,
    pub composed: Result<ForecastFrame>,
}

/// Outcome of forecasting several metrics independently
#[derive(Debug, Default)]
pub struct BatchReport {
    pub frames: Vec<ForecastFrame>,
    pub failures: Vec<(String, ForecastError)>,
}

impl BatchReport {
    pub fn frame(&self, metric: &str) -> Option<&ForecastFrame> {
        self.frames.iter().find(|f| f.metric() == metric)
    }

    pub fn failure(&self, metric: &str) -> Option<&ForecastError> {
        self.failures
            .iter()
            .find(|(name, _)| name == metric)
            .map(|(_, e)| e)
    }
}

/// Runs competition, banding and scenarios for metrics in a read-only store
#[derive(Debug)]
pub struct ForecastOrchestrator<'a> {
    store: &'a SeriesStore,
    config: EngineConfig,
    runner: CompetitionRunner,
    estimator: UncertaintyEstimator,
    projector: ScenarioProjector,
}

impl<'a> ForecastOrchestrator<'a> {
    pub fn new(store: &'a SeriesStore, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let runner = CompetitionRunner::from_config(&config)?;
        Self::with_runner(store, config, runner)
    }

    /// Use a custom adapter roster
    pub fn with_runner(
        store: &'a SeriesStore,
        config: EngineConfig,
        runner: CompetitionRunner,
    ) -> Result<Self> {
        config.validate()?;
        let estimator = UncertaintyEstimator::new(config.seed, config.uncertainty.fallback_band);
        let projector = ScenarioProjector::new(config.scenario.shape)
            .with_magnitude_floor(config.scenario.magnitude_floor)?;
        Ok(Self {
            store,
            config,
            runner,
            estimator,
            projector,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn runner(&self) -> &CompetitionRunner {
        &self.runner
    }

    pub fn store(&self) -> &SeriesStore {
        self.store
    }

    pub fn compete(&self, metric: &str) -> Result<CompetitionResult> {
        let series = self.store.series(metric)?;
        self.runner.run(&series, self.config.holdout_fraction)
    }

    /// Compete, refit the winner on the full history, then band and project
    pub fn forecast(&self, metric: &str, horizon: usize) -> Result<ForecastFrame> {
        check_horizon(horizon)?;
        let competition = self.compete(metric)?;
        self.forecast_from_result(metric, horizon, &competition)
    }

    /// Forecast with the winner of an earlier competition, skipping the rerun
    pub fn forecast_from_result(
        &self,
        metric: &str,
        horizon: usize,
        competition: &CompetitionResult,
    ) -> Result<ForecastFrame> {
        check_horizon(horizon)?;
        if competition.metric != metric {
            return Err(ForecastError::ValidationError(format!(
                "Competition result is for '{}', not '{}'",
                competition.metric, metric
            )));
        }

        let series = self.store.series(metric)?;
        let adapter = self.runner.adapter(&competition.winner).ok_or_else(|| {
            ForecastError::ValidationError(format!(
                "Winner '{}' is not in the current roster",
                competition.winner
            ))
        })?;

        let candidate = adapter.fit(&series, horizon)?;
        let uncertainty = &self.config.uncertainty;
        let interval = self.estimator.estimate(
            &candidate,
            &competition.holdout_residuals,
            horizon,
            uncertainty.n_resamples,
            uncertainty.confidence_level,
        )?;
        let scenarios = self.project(&interval.point)?;
        let timestamps = series.future_timestamps(horizon)?;

        log::info!(
            "forecast '{}' for {} periods with {}",
            metric,
            horizon,
            competition.winner
        );

        Ok(ForecastFrame::new(
            metric,
            timestamps,
            interval,
            scenarios,
            uncertainty.confidence_level,
            ForecastOrigin::Direct {
                competition: competition.clone(),
            },
        ))
    }

    /// Forecast a derived metric by forecasting its components and
    /// recombining them with the stored derivation
    pub fn forecast_composed(&self, metric: &str, horizon: usize) -> Result<ForecastFrame> {
        check_horizon(horizon)?;
        let derivation = self.derivation_of(metric)?.clone();

        let components = derivation
            .components()
            .into_iter()
            .map(|component| self.forecast(component, horizon))
            .collect::<Result<Vec<_>>>()?;

        let points: Vec<&[f64]> = components.iter().map(|f| f.forecast()).collect();
        let point = derivation.combine(&points)?;
        let (mut lower, mut upper) = combine_bands(&derivation, &components)?;
        for ((lo, hi), p) in lower.iter_mut().zip(upper.iter_mut()).zip(&point) {
            *lo = lo.min(*p);
            *hi = hi.max(*p);
        }

        let scenarios = self.project(&point)?;
        let timestamps = self.store.series(metric)?.future_timestamps(horizon)?;
        let competitions = components
            .iter()
            .filter_map(|f| f.competition().cloned())
            .collect();

        log::info!("composed forecast '{}' from {}", metric, derivation);

        Ok(ForecastFrame::new(
            metric,
            timestamps,
            IntervalForecast {
                point,
                lower,
                upper,
                method: BandMethod::Composed,
            },
            scenarios,
            self.config.uncertainty.confidence_level,
            ForecastOrigin::Composed {
                derivation,
                components: competitions,
            },
        ))
    }

    /// Both the direct and the composed forecast of a derived metric
    pub fn compare_composition(
        &self,
        metric: &str,
        horizon: usize,
    ) -> Result<CompositionComparison> {
        check_horizon(horizon)?;
        self.derivation_of(metric)?;
        Ok(CompositionComparison {
            direct: self.forecast(metric, horizon),
            composed: self.forecast_composed(metric, horizon),
        })
    }

    /// Forecast each metric independently; failures are collected per metric
    pub fn forecast_batch(&self, metrics: &[&str], horizon: usize) -> BatchReport {
        let run = |metric: &&str| (metric.to_string(), self.forecast(metric, horizon));
        let outcomes: Vec<(String, Result<ForecastFrame>)> = if self.config.parallel {
            metrics.par_iter().map(run).collect()
        } else {
            metrics.iter().map(run).collect()
        };

        let mut report = BatchReport::default();
        for (metric, outcome) in outcomes {
            match outcome {
                Ok(frame) => report.frames.push(frame),
                Err(e) => {
                    log::warn!("forecast for '{}' failed: {}", metric, e);
                    report.failures.push((metric, e));
                }
            }
        }
        report
    }

    fn derivation_of(&self, metric: &str) -> Result<&Derivation> {
        if !self.store.contains(metric) {
            return Err(ForecastError::UnknownMetric(metric.to_string()));
        }
        self.store.derivation(metric).ok_or_else(|| {
            ForecastError::ValidationError(format!("'{}' is a base metric, not derived", metric))
        })
    }

    fn project(&self, path: &[f64]) -> Result<(Vec<f64>, Vec<f64>)> {
        let scenario = &self.config.scenario;
        self.projector.project(
            path,
            scenario.optimistic_multiplier,
            scenario.pessimistic_multiplier,
        )
    }
}

fn check_horizon(horizon: usize) -> Result<()> {
    if horizon == 0 {
        return Err(ForecastError::InvalidParameter(
            "Horizon must be at least one period".to_string(),
        ));
    }
    Ok(())
}

/// Interval arithmetic over component bands
fn combine_bands(
    derivation: &Derivation,
    components: &[ForecastFrame],
) -> Result<(Vec<f64>, Vec<f64>)> {
    let horizon = components.first().map_or(0, |f| f.horizon());

    match derivation {
        Derivation::Sum(_) => {
            let lower = (0..horizon)
                .map(|t| components.iter().map(|f| f.lower()[t]).sum())
                .collect();
            let upper = (0..horizon)
                .map(|t| components.iter().map(|f| f.upper()[t]).sum())
                .collect();
            Ok((lower, upper))
        }
        Derivation::Difference { .. } => {
            let (a, b) = pair(components)?;
            let lower = (0..horizon).map(|t| a.lower()[t] - b.upper()[t]).collect();
            let upper = (0..horizon).map(|t| a.upper()[t] - b.lower()[t]).collect();
            Ok((lower, upper))
        }
        Derivation::Ratio { denominator, .. } => {
            let (a, b) = pair(components)?;
            let mut lower = Vec::with_capacity(horizon);
            let mut upper = Vec::with_capacity(horizon);
            for t in 0..horizon {
                let (b_lo, b_hi) = (b.lower()[t], b.upper()[t]);
                if b_lo <= 0.0 && b_hi >= 0.0 {
                    return Err(ForecastError::DataError(format!(
                        "Band of denominator '{}' spans zero at period {}",
                        denominator,
                        t + 1
                    )));
                }
                let quotients = [
                    a.lower()[t] / b_lo,
                    a.lower()[t] / b_hi,
                    a.upper()[t] / b_lo,
                    a.upper()[t] / b_hi,
                ];
                lower.push(quotients.iter().copied().fold(f64::INFINITY, f64::min));
                upper.push(quotients.iter().copied().fold(f64::NEG_INFINITY, f64::max));
            }
            Ok((lower, upper))
        }
    }
}

fn pair(components: &[ForecastFrame]) -> Result<(&ForecastFrame, &ForecastFrame)> {
    match components {
        [a, b] => Ok((a, b)),
        _ => Err(ForecastError::ValidationError(format!(
            "Expected two component forecasts, got {}",
            components.len()
        ))),
    }
}
