//! Stochastic gradient-boosted regression trees over engineered features
//!
//! Trees are CART regressors with squared loss. Each boosting round fits a
//! tree to the current residuals on a seeded row subsample. Forecasts are
//! recursive: each prediction is appended to the history before the next
//! feature row is computed.

use crate::config::TreeEnsembleConfig;
use crate::data::{Frequency, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::features::{FeatureBuilder, FeatureConfig};
use crate::models::{ensure_history, FittedModel, ModelAdapter, ModelCandidate};
use chrono::NaiveDate;
use forecast_math::stats;
use rand::seq::index;
use rand::SeedableRng;
use rand_pcg::Pcg64;
use std::sync::Arc;

const NAME: &str = "tree_ensemble";

/// Minimum variance reduction for a split to be kept
const MIN_GAIN: f64 = 1e-12;

#[derive(Debug, Clone)]
pub struct TreeEnsembleAdapter {
    config: TreeEnsembleConfig,
    features: Option<FeatureConfig>,
    seed: u64,
}

impl Default for TreeEnsembleAdapter {
    fn default() -> Self {
        Self::new(TreeEnsembleConfig::default(), None, 42)
    }
}

impl TreeEnsembleAdapter {
    /// `features` of `None` picks the default roster for each series' frequency
    pub fn new(config: TreeEnsembleConfig, features: Option<FeatureConfig>, seed: u64) -> Self {
        Self {
            config,
            features,
            seed,
        }
    }

    fn feature_config(&self, frequency: Frequency) -> FeatureConfig {
        self.features
            .clone()
            .unwrap_or_else(|| FeatureConfig::for_frequency(frequency))
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf(f64),
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn predict(&self, row: &[f64]) -> f64 {
        match self {
            Node::Leaf(value) => *value,
            Node::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if row[*feature] <= *threshold {
                    left.predict(row)
                } else {
                    right.predict(row)
                }
            }
        }
    }
}

struct TreeBuilder<'a> {
    rows: &'a [Vec<f64>],
    targets: &'a [f64],
    max_depth: usize,
    min_samples_leaf: usize,
}

impl TreeBuilder<'_> {
    fn build(&self, indices: Vec<usize>, depth: usize) -> Node {
        let leaf_value = indices.iter().map(|&i| self.targets[i]).sum::<f64>() / indices.len() as f64;
        if depth >= self.max_depth || indices.len() < 2 * self.min_samples_leaf {
            return Node::Leaf(leaf_value);
        }

        let Some((feature, threshold)) = self.best_split(&indices) else {
            return Node::Leaf(leaf_value);
        };

        let (left, right): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| self.rows[i][feature] <= threshold);

        Node::Split {
            feature,
            threshold,
            left: Box::new(self.build(left, depth + 1)),
            right: Box::new(self.build(right, depth + 1)),
        }
    }

    fn best_split(&self, indices: &[usize]) -> Option<(usize, f64)> {
        let n = indices.len();
        let total: f64 = indices.iter().map(|&i| self.targets[i]).sum();
        let parent_score = total * total / n as f64;
        let features = self.rows[indices[0]].len();

        let mut best: Option<(usize, f64)> = None;
        let mut best_gain = MIN_GAIN;
        let mut sorted = indices.to_vec();

        for feature in 0..features {
            sorted.sort_by(|&a, &b| self.rows[a][feature].total_cmp(&self.rows[b][feature]));

            let mut left_sum = 0.0;
            for split in 1..n {
                left_sum += self.targets[sorted[split - 1]];
                if split < self.min_samples_leaf || n - split < self.min_samples_leaf {
                    continue;
                }
                let below = self.rows[sorted[split - 1]][feature];
                let above = self.rows[sorted[split]][feature];
                if below >= above {
                    continue;
                }

                let right_sum = total - left_sum;
                let score = left_sum * left_sum / split as f64
                    + right_sum * right_sum / (n - split) as f64;
                let gain = score - parent_score;
                if gain > best_gain {
                    best_gain = gain;
                    best = Some((feature, (below + above) / 2.0));
                }
            }
        }

        best
    }
}

#[derive(Debug, Clone)]
struct BoostedTrees {
    base: f64,
    learning_rate: f64,
    trees: Vec<Node>,
    features: FeatureConfig,
    history: Vec<f64>,
    anchor: NaiveDate,
    frequency: Frequency,
}

impl BoostedTrees {
    fn predict_row(&self, row: &[f64]) -> f64 {
        self.base
            + self.learning_rate * self.trees.iter().map(|tree| tree.predict(row)).sum::<f64>()
    }
}

impl FittedModel for BoostedTrees {
    fn forecast(&self, horizon: usize) -> Result<Vec<f64>> {
        let mut history = self.history.clone();
        let observed = history.len();
        let mut output = Vec::with_capacity(horizon);

        for k in observed..observed + horizon {
            let date = self
                .frequency
                .advance(self.anchor, k)
                .ok_or_else(|| ForecastError::DataError("Date arithmetic overflow".to_string()))?;
            let row = self.features.row(&history, date, self.frequency);
            let value = self.predict_row(&row);
            history.push(value);
            output.push(value);
        }

        Ok(output)
    }
}

impl ModelAdapter for TreeEnsembleAdapter {
    fn name(&self) -> &'static str {
        NAME
    }

    fn min_observations(&self, frequency: Frequency) -> usize {
        self.feature_config(frequency).max_lookback() + self.config.min_training_rows
    }

    fn fit(&self, series: &TimeSeries, _horizon_hint: usize) -> Result<ModelCandidate> {
        ensure_history(NAME, series, self.min_observations(series.frequency()))?;

        let features = self.feature_config(series.frequency());
        let frame = FeatureBuilder::new().build_with(series, &features)?;
        let (rows, targets) = frame.complete_rows();
        if rows.len() < self.config.min_training_rows {
            return Err(ForecastError::InsufficientHistory(format!(
                "{} has {} complete feature rows for '{}', needs {}",
                NAME,
                rows.len(),
                series.name(),
                self.config.min_training_rows
            )));
        }

        let n = rows.len();
        let sample_size = ((self.config.subsample * n as f64).round() as usize).clamp(1, n);
        let base = stats::mean(&targets);
        let mut fitted = vec![base; n];
        let mut residuals = vec![0.0; n];
        let mut trees = Vec::with_capacity(self.config.n_estimators);
        let mut rng = Pcg64::seed_from_u64(self.seed);

        for round in 0..self.config.n_estimators {
            for i in 0..n {
                residuals[i] = targets[i] - fitted[i];
            }

            let sampled = if sample_size < n {
                index::sample(&mut rng, n, sample_size).into_vec()
            } else {
                (0..n).collect()
            };

            let builder = TreeBuilder {
                rows: &rows,
                targets: &residuals,
                max_depth: self.config.max_depth,
                min_samples_leaf: self.config.min_samples_leaf,
            };
            let tree = builder.build(sampled, 0);

            for (i, row) in rows.iter().enumerate() {
                fitted[i] += self.config.learning_rate * tree.predict(row);
            }
            trees.push(tree);

            let loss = targets
                .iter()
                .zip(&fitted)
                .map(|(y, f)| (y - f).powi(2))
                .sum::<f64>()
                / n as f64;
            if !loss.is_finite() {
                return Err(ForecastError::convergence(
                    NAME,
                    format!("training loss became non-finite at round {}", round + 1),
                ));
            }
            if round + 1 == self.config.n_estimators {
                log::debug!(
                    "{}: {} trees on {} rows, training mse {:.6e}",
                    NAME,
                    trees.len(),
                    n,
                    loss
                );
            }
        }

        let model = BoostedTrees {
            base,
            learning_rate: self.config.learning_rate,
            trees,
            features,
            history: series.values().to_vec(),
            anchor: series.first_timestamp(),
            frequency: series.frequency(),
        };
        Ok(ModelCandidate::new(NAME, series, Arc::new(model)))
    }
}
