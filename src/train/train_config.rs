use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

use crate::metrics::roc_auc::DEFAULT_NUM_THRESHOLDS;
use crate::optim::Sgd;

/// Configuration for a `train_loop` run.
///
/// # Fields
/// - `epochs`: total number of full passes over the training data
/// - `batch_size`: samples per mini-batch; use `1` for online SGD
/// - `learning_rate`, `momentum`, `nesterov`: SGD update rule
/// - `validation_steps`: how many validation batches to score per epoch;
///   `None` scores the whole validation set
/// - `shuffle`: reshuffle the training order every epoch
/// - `drop_remainder`: skip the final short training batch
/// - `report_every`: print the epoch lines every n epochs (the last
///   epoch is always printed)
/// - `auc_thresholds`: threshold count of the ROC-AUC metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub momentum: f64,
    pub nesterov: bool,
    pub validation_steps: Option<usize>,
    pub shuffle: bool,
    pub drop_remainder: bool,
    pub report_every: usize,
    pub auc_thresholds: usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            epochs: 10,
            batch_size: 32,
            learning_rate: 0.005,
            momentum: 0.9,
            nesterov: false,
            validation_steps: None,
            shuffle: true,
            drop_remainder: false,
            report_every: 1,
            auc_thresholds: DEFAULT_NUM_THRESHOLDS,
        }
    }
}

impl TrainConfig {
    /// Creates a config with the given loop sizes and default optimiser settings.
    pub fn new(epochs: usize, batch_size: usize) -> Self {
        TrainConfig { epochs, batch_size, ..TrainConfig::default() }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.epochs > 0, "epochs must be at least 1");
        ensure!(self.batch_size > 0, "batch_size must be at least 1");
        ensure!(
            self.learning_rate.is_finite() && self.learning_rate >= 0.0,
            "learning_rate must be a non-negative number, got {}", self.learning_rate
        );
        ensure!(
            (0.0..1.0).contains(&self.momentum),
            "momentum must lie in [0, 1), got {}", self.momentum
        );
        ensure!(self.report_every > 0, "report_every must be at least 1");
        ensure!(self.auc_thresholds >= 2, "auc_thresholds must be at least 2");
        if let Some(steps) = self.validation_steps {
            ensure!(steps > 0, "validation_steps must be at least 1 when set");
        }
        Ok(())
    }

    /// The optimiser this config describes, with empty velocities.
    pub fn optimizer(&self) -> Sgd {
        Sgd::with_momentum(self.learning_rate, self.momentum, self.nesterov)
    }
}
