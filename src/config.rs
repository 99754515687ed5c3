use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::activation::ActivationFunction;
use crate::data::images::ColorMode;
use crate::data::synthetic::SyntheticSequences;
use crate::data::CorpusOptions;
use crate::network::SequenceSpec;
use crate::train::TrainConfig;

/// Everything a training run needs apart from the data paths.
///
/// Serialisable so a run can be described in one JSON file; fields missing
/// from the file take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub seed: u64,
    /// Share of the shuffled data held out for the final test evaluation.
    pub test_fraction: f64,
    /// Leading training samples held out for per-epoch validation; a fifth
    /// of the training data when `None`. The `sequence` command fills an
    /// unset value with its Reuters default of 1000.
    pub validation_size: Option<usize>,
    pub train: TrainConfig,
    pub corpus: CorpusOptions,
    pub sequence: SequenceSpec,
    pub synthetic: SyntheticSequences,
    pub dense: DenseOptions,
}

/// Dense-classifier settings; the input width comes from the data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DenseOptions {
    pub hidden: Vec<usize>,
    pub hidden_activation: ActivationFunction,
    pub image_width: u32,
    pub image_height: u32,
    pub color: ColorMode,
}

impl Default for DenseOptions {
    fn default() -> Self {
        DenseOptions {
            hidden: vec![64, 64],
            hidden_activation: ActivationFunction::ReLU,
            image_width: 32,
            image_height: 32,
            color: ColorMode::Grayscale,
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            seed: 42,
            test_fraction: 0.2,
            validation_size: None,
            train: TrainConfig::default(),
            corpus: CorpusOptions::default(),
            sequence: SequenceSpec::default(),
            synthetic: SyntheticSequences::default(),
            dense: DenseOptions::default(),
        }
    }
}

impl RunConfig {
    pub fn load_json(path: &Path) -> Result<RunConfig> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("{} is not a valid run config", path.display()))
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("cannot serialise run config")?;
        std::fs::write(path, json)
            .with_context(|| format!("cannot write config to {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        self.train.validate()?;
        self.sequence.validate()?;
        ensure!(
            (0.0..1.0).contains(&self.test_fraction),
            "test_fraction must lie in [0, 1), got {}", self.test_fraction
        );
        ensure!(
            self.dense.image_width > 0 && self.dense.image_height > 0,
            "image size must be non-zero"
        );
        Ok(())
    }
}
