use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Per-epoch statistics emitted by `train_loop`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    /// 0-based epoch index, as printed in the report lines.
    pub epoch: usize,
    /// Total epochs requested for this run.
    pub total_epochs: usize,
    /// Mean training loss over all samples seen in this epoch.
    pub train_loss: f64,
    /// Training ROC-AUC as a fraction in [0, 1].
    pub train_auc: f64,
    pub train_accuracy: f64,
    /// Validation metrics, if a validation set was provided.
    pub val_loss: Option<f64>,
    pub val_auc: Option<f64>,
    pub val_accuracy: Option<f64>,
    /// Wall-clock duration of this single epoch in milliseconds.
    pub elapsed_ms: u64,
}

/// Every epoch of a run, in order. Written as JSON for external plotting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    pub epochs: Vec<EpochStats>,
}

impl History {
    pub fn new() -> History {
        History::default()
    }

    pub fn push(&mut self, stats: EpochStats) {
        self.epochs.push(stats);
    }

    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    pub fn last(&self) -> Option<&EpochStats> {
        self.epochs.last()
    }

    pub fn train_losses(&self) -> Vec<f64> {
        self.epochs.iter().map(|e| e.train_loss).collect()
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("cannot serialise history")?;
        std::fs::write(path, json)
            .with_context(|| format!("cannot write history to {}", path.display()))
    }

    pub fn load_json(path: &Path) -> Result<History> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read history {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("{} is not a valid history file", path.display()))
    }
}
