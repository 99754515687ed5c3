use std::path::Path;

use anyhow::{bail, ensure, Context, Result};
use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::network::params::ParamSet;

/// Architecture of a `SequenceClassifier`:
/// Embedding(vocab_size, embedding_dim) → GRU(first_units, full sequence)
/// → GRU(second_units, last state) → Dense(num_classes, Softmax).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceSpec {
    pub vocab_size: usize,
    pub embedding_dim: usize,
    pub first_units: usize,
    pub second_units: usize,
    pub num_classes: usize,
}

impl Default for SequenceSpec {
    /// Reuters newswire topics: 10 000 most frequent words, 46 classes.
    fn default() -> Self {
        SequenceSpec {
            vocab_size: 10_000,
            embedding_dim: 64,
            first_units: 64,
            second_units: 32,
            num_classes: 46,
        }
    }
}

impl SequenceSpec {
    pub fn validate(&self) -> Result<()> {
        ensure!(self.vocab_size > 0, "vocab_size must be at least 1");
        ensure!(self.embedding_dim > 0, "embedding_dim must be at least 1");
        ensure!(self.first_units > 0 && self.second_units > 0, "recurrent layers need at least 1 unit");
        ensure!(self.num_classes >= 2, "num_classes must be at least 2, got {}", self.num_classes);
        Ok(())
    }
}

/// Architecture of a `DenseClassifier`: one Dense layer per entry of
/// `hidden` (with `hidden_activation`), then Dense(num_classes, Softmax).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseSpec {
    pub input_size: usize,
    pub hidden: Vec<usize>,
    pub num_classes: usize,
    #[serde(default = "default_hidden_activation")]
    pub hidden_activation: ActivationFunction,
}

fn default_hidden_activation() -> ActivationFunction {
    ActivationFunction::ReLU
}

impl DenseSpec {
    pub fn validate(&self) -> Result<()> {
        ensure!(self.input_size > 0, "input_size must be at least 1");
        ensure!(self.hidden.iter().all(|&h| h > 0), "hidden layers need at least 1 unit each");
        ensure!(self.num_classes >= 2, "num_classes must be at least 2, got {}", self.num_classes);
        if self.hidden_activation == ActivationFunction::Softmax {
            bail!("softmax is reserved for the output layer");
        }
        Ok(())
    }
}

/// A trained model as stored on disk: architecture plus named weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SavedModel {
    Sequence { spec: SequenceSpec, params: ParamSet },
    Dense { spec: DenseSpec, params: ParamSet },
}

impl SavedModel {
    /// Serializes the model to a pretty-printed JSON file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .with_context(|| format!("cannot create model file {}", path.display()))?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .with_context(|| format!("cannot write model file {}", path.display()))
    }

    /// Deserializes a model from a JSON file previously written by `save_json`.
    pub fn load_json(path: &Path) -> Result<SavedModel> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("cannot open model file {}", path.display()))?;
        let reader = std::io::BufReader::new(file);
        serde_json::from_reader(reader)
            .with_context(|| format!("{} is not a valid model file", path.display()))
    }
}

/// Checks that `params` holds exactly the expected names with matching shapes.
pub(crate) fn check_params(params: &ParamSet, expected: &[(String, (usize, usize))]) -> Result<()> {
    for (name, shape) in expected {
        ensure!(params.contains(name), "missing parameter '{}'", name);
        let actual = params.get(name).shape();
        ensure!(
            actual == *shape,
            "parameter '{}' has shape {:?}, expected {:?}", name, actual, shape
        );
    }
    ensure!(
        params.len() == expected.len(),
        "model file has {} parameters, architecture expects {}", params.len(), expected.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sequence_spec_is_valid() {
        assert!(SequenceSpec::default().validate().is_ok());
    }

    #[test]
    fn single_class_is_rejected() {
        let spec = SequenceSpec { num_classes: 1, ..SequenceSpec::default() };
        assert!(spec.validate().is_err());
    }

    #[test]
    fn dense_spec_defaults_hidden_activation() {
        let spec: DenseSpec =
            serde_json::from_str(r#"{"input_size": 4, "hidden": [8], "num_classes": 3}"#).unwrap();
        assert_eq!(spec.hidden_activation, ActivationFunction::ReLU);
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn softmax_hidden_activation_is_rejected() {
        let spec = DenseSpec {
            input_size: 4,
            hidden: vec![8],
            num_classes: 3,
            hidden_activation: ActivationFunction::Softmax,
        };
        assert!(spec.validate().is_err());
    }
}
