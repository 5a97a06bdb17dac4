//! Holdout competition between model adapters

use crate::config::EngineConfig;
use crate::data::TimeSeries;
use crate::error::{ForecastError, Result};
use crate::models::{default_roster, ModelAdapter};
use forecast_math::{forecast_accuracy, ForecastAccuracy, MathError};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scores closer than this to the best are treated as ties
pub const SCORE_TIE_TOLERANCE: f64 = 1e-9;

/// Holdout error measure used to rank candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMetric {
    /// Mean absolute percentage error, in percent
    #[default]
    Mape,
    /// Symmetric MAPE, in percent
    Smape,
    Mae,
    Rmse,
}

impl ScoringMetric {
    pub fn score(self, forecast: &[f64], actual: &[f64]) -> Result<f64> {
        self.select(&forecast_accuracy(forecast, actual)?)
    }

    /// Fails when the metric is undefined for this holdout (MAPE over a zero actual)
    pub fn select(self, accuracy: &ForecastAccuracy) -> Result<f64> {
        match self {
            ScoringMetric::Mape => accuracy.mape.ok_or_else(|| {
                MathError::InvalidInput("MAPE is undefined for a zero actual value".to_string())
                    .into()
            }),
            ScoringMetric::Smape => Ok(accuracy.smape),
            ScoringMetric::Mae => Ok(accuracy.mae),
            ScoringMetric::Rmse => Ok(accuracy.rmse),
        }
    }
}

impl fmt::Display for ScoringMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScoringMetric::Mape => "MAPE",
            ScoringMetric::Smape => "SMAPE",
            ScoringMetric::Mae => "MAE",
            ScoringMetric::Rmse => "RMSE",
        };
        f.write_str(name)
    }
}

/// How one adapter fared in a competition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CandidateOutcome {
    Scored { score: f64 },
    Disqualified { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    pub algorithm: String,
    pub outcome: CandidateOutcome,
}

impl CandidateScore {
    pub fn score(&self) -> Option<f64> {
        match self.outcome {
            CandidateOutcome::Scored { score } => Some(score),
            CandidateOutcome::Disqualified { .. } => None,
        }
    }
}

/// Outcome of one competition, safe to cache and reuse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitionResult {
    pub metric: String,
    pub winner: String,
    pub score: f64,
    pub scoring: ScoringMetric,
    pub holdout_size: usize,
    /// Winner's holdout errors, actual minus predicted
    pub holdout_residuals: Vec<f64>,
    /// Every roster member in roster order
    pub candidates: Vec<CandidateScore>,
    pub seed: u64,
}

impl CompetitionResult {
    pub fn candidate(&self, algorithm: &str) -> Option<&CandidateScore> {
        self.candidates.iter().find(|c| c.algorithm == algorithm)
    }
}

/// Fits every adapter on a chronological prefix, scores it on the held-out
/// tail and picks the lowest score
pub struct CompetitionRunner {
    adapters: Vec<Box<dyn ModelAdapter>>,
    scoring: ScoringMetric,
    seed: u64,
    parallel: bool,
}

impl fmt::Debug for CompetitionRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompetitionRunner")
            .field("adapters", &self.adapter_names())
            .field("scoring", &self.scoring)
            .field("seed", &self.seed)
            .field("parallel", &self.parallel)
            .finish()
    }
}

struct Evaluation {
    algorithm: &'static str,
    outcome: Result<(f64, Vec<f64>)>,
}

impl CompetitionRunner {
    /// Runner over `adapters`; their order is the tie-break priority
    pub fn new(
        adapters: Vec<Box<dyn ModelAdapter>>,
        scoring: ScoringMetric,
        seed: u64,
        parallel: bool,
    ) -> Result<Self> {
        if adapters.is_empty() {
            return Err(ForecastError::ValidationError(
                "A competition needs at least one adapter".to_string(),
            ));
        }
        for (i, adapter) in adapters.iter().enumerate() {
            if adapters[..i].iter().any(|a| a.name() == adapter.name()) {
                return Err(ForecastError::ValidationError(format!(
                    "Adapter '{}' appears twice in the roster",
                    adapter.name()
                )));
            }
        }

        Ok(Self {
            adapters,
            scoring,
            seed,
            parallel,
        })
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        Self::new(
            default_roster(config),
            config.scoring,
            config.seed,
            config.parallel,
        )
    }

    pub fn adapter(&self, name: &str) -> Option<&dyn ModelAdapter> {
        self.adapters
            .iter()
            .find(|a| a.name() == name)
            .map(|a| a.as_ref())
    }

    pub fn adapter_names(&self) -> Vec<&'static str> {
        self.adapters.iter().map(|a| a.name()).collect()
    }

    pub fn scoring(&self) -> ScoringMetric {
        self.scoring
    }

    /// Number of trailing periods held out from `series`.
    ///
    /// Short series shrink the fraction so the most demanding adapter keeps
    /// as much training data as possible, but the holdout never drops below
    /// two periods and never eats into the least demanding adapter's minimum.
    pub fn holdout_size(&self, series: &TimeSeries, holdout_fraction: f64) -> Result<usize> {
        if !(holdout_fraction > 0.0 && holdout_fraction < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "Holdout fraction must be in (0, 1), got {}",
                holdout_fraction
            )));
        }

        let frequency = series.frequency();
        let minimums: Vec<usize> = self
            .adapters
            .iter()
            .map(|a| a.min_observations(frequency))
            .collect();
        let most = minimums.iter().copied().max().unwrap_or(0);
        let least = minimums.iter().copied().min().unwrap_or(0);

        let n = series.len();
        if n < least + 2 {
            return Err(ForecastError::InsufficientHistory(format!(
                "'{}' has {} observations; a holdout competition needs at least {}",
                series.name(),
                n,
                least + 2
            )));
        }

        let mut fraction = holdout_fraction;
        if n < 2 * most {
            fraction *= n as f64 / (2 * most) as f64;
        }
        let size = (n as f64 * fraction).round() as usize;
        Ok(size.clamp(2, n - least))
    }

    pub fn run(&self, series: &TimeSeries, holdout_fraction: f64) -> Result<CompetitionResult> {
        let holdout = self.holdout_size(series, holdout_fraction)?;
        let (train, test) = series.split_at(series.len() - holdout)?;
        let actual = test.values();

        log::info!(
            "competition for '{}': {} adapters, {} training / {} holdout periods",
            series.name(),
            self.adapters.len(),
            train.len(),
            holdout
        );

        let evaluate = |adapter: &Box<dyn ModelAdapter>| Evaluation {
            algorithm: adapter.name(),
            outcome: self.evaluate(adapter.as_ref(), &train, actual),
        };
        let evaluations: Vec<Evaluation> = if self.parallel {
            self.adapters.par_iter().map(evaluate).collect()
        } else {
            self.adapters.iter().map(evaluate).collect()
        };

        let mut candidates = Vec::with_capacity(evaluations.len());
        let mut best: Option<(usize, f64)> = None;
        for (i, evaluation) in evaluations.iter().enumerate() {
            let outcome = match &evaluation.outcome {
                Ok((score, _)) => {
                    log::debug!("{}: {} = {:.6}", evaluation.algorithm, self.scoring, score);
                    if best.map_or(true, |(_, b)| *score < b) {
                        best = Some((i, *score));
                    }
                    CandidateOutcome::Scored { score: *score }
                }
                Err(e) => {
                    if e.is_disqualification() {
                        log::warn!("{} disqualified for '{}': {}", evaluation.algorithm, series.name(), e);
                    } else {
                        log::error!("{} failed on '{}': {}", evaluation.algorithm, series.name(), e);
                    }
                    CandidateOutcome::Disqualified {
                        reason: e.to_string(),
                    }
                }
            };
            candidates.push(CandidateScore {
                algorithm: evaluation.algorithm.to_string(),
                outcome,
            });
        }

        let Some((_, best_score)) = best else {
            let reasons = candidates
                .iter()
                .filter_map(|c| match &c.outcome {
                    CandidateOutcome::Disqualified { reason } => {
                        Some(format!("{}: {}", c.algorithm, reason))
                    }
                    CandidateOutcome::Scored { .. } => None,
                })
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ForecastError::NoViableModel {
                metric: series.name().to_string(),
                reasons,
            });
        };

        // First in roster order among the scores tied with the best
        let winner = evaluations
            .iter()
            .position(|e| {
                matches!(&e.outcome, Ok((score, _)) if *score - best_score <= SCORE_TIE_TOLERANCE)
            })
            .unwrap_or(0);
        let (score, residuals) = match &evaluations[winner].outcome {
            Ok((score, residuals)) => (*score, residuals.clone()),
            Err(_) => (best_score, Vec::new()),
        };

        log::info!(
            "'{}' won by {} with {} {:.6}",
            series.name(),
            evaluations[winner].algorithm,
            self.scoring,
            score
        );

        Ok(CompetitionResult {
            metric: series.name().to_string(),
            winner: evaluations[winner].algorithm.to_string(),
            score,
            scoring: self.scoring,
            holdout_size: holdout,
            holdout_residuals: residuals,
            candidates,
            seed: self.seed,
        })
    }

    fn evaluate(
        &self,
        adapter: &dyn ModelAdapter,
        train: &TimeSeries,
        actual: &[f64],
    ) -> Result<(f64, Vec<f64>)> {
        let candidate = adapter.fit(train, actual.len())?;
        let predicted = adapter.predict(&candidate, actual.len())?;
        let accuracy = forecast_accuracy(&predicted, actual)?;
        log::debug!("{} holdout accuracy:\n{}", adapter.name(), accuracy);
        let score = self.scoring.select(&accuracy)?;
        if !score.is_finite() {
            return Err(ForecastError::convergence(
                adapter.name(),
                format!("holdout {} is not finite", self.scoring),
            ));
        }
        let residuals = actual.iter().zip(&predicted).map(|(a, p)| a - p).collect();
        Ok((score, residuals))
    }
}
