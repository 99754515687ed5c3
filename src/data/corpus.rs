//! Tokenized text corpora (Reuters newswire style) stored as JSON:
//!
//! ```text
//! {
//!   "sequences":   [[1, 245, 273, ...], [1, 3267, 699, ...], ...],
//!   "labels":      [3, 4, ...],
//!   "num_classes": 46            (optional, defaults to max label + 1)
//! }
//! ```
//!
//! Each sequence is a list of word ids; each label is a topic index.

use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::dataset::Dataset;
use crate::data::sequence::{limit_vocabulary, pad_sequences, Padding, Truncating};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Corpus {
    pub sequences: Vec<Vec<u32>>,
    pub labels: Vec<usize>,
    #[serde(default)]
    pub num_classes: Option<usize>,
}

/// How raw corpus sequences become fixed-length model inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusOptions {
    /// Fixed sequence length after padding/truncation.
    pub maxlen: usize,
    /// Keep only ids below this bound; others become `oov_token`.
    #[serde(default)]
    pub num_words: Option<u32>,
    #[serde(default = "default_oov_token")]
    pub oov_token: u32,
    #[serde(default)]
    pub padding: Padding,
    #[serde(default)]
    pub truncating: Truncating,
    #[serde(default)]
    pub pad_value: u32,
}

fn default_oov_token() -> u32 {
    2
}

impl Default for CorpusOptions {
    fn default() -> Self {
        CorpusOptions {
            maxlen: 80,
            num_words: Some(10_000),
            oov_token: default_oov_token(),
            padding: Padding::Pre,
            truncating: Truncating::Pre,
            pad_value: 0,
        }
    }
}

impl Corpus {
    pub fn load_json(path: &Path) -> Result<Corpus> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("cannot open corpus {}", path.display()))?;
        let reader = std::io::BufReader::new(file);
        serde_json::from_reader(reader)
            .with_context(|| format!("{} is not a valid corpus file", path.display()))
    }

    pub fn from_json_str(text: &str) -> Result<Corpus> {
        serde_json::from_str(text).context("invalid corpus JSON")
    }

    /// Number of classes: the declared count, or the largest label plus one.
    pub fn num_classes(&self) -> usize {
        self.num_classes
            .unwrap_or_else(|| self.labels.iter().max().map_or(0, |&m| m + 1))
    }

    /// Applies the vocabulary limit and padding, then validates labels.
    pub fn into_dataset(self, options: &CorpusOptions) -> Result<Dataset<Vec<u32>>> {
        ensure!(options.maxlen > 0, "maxlen must be at least 1");
        let num_classes = self.num_classes();
        let mut sequences = self.sequences;
        if let Some(num_words) = options.num_words {
            ensure!(
                options.oov_token < num_words,
                "oov_token {} must be below num_words {}", options.oov_token, num_words
            );
            limit_vocabulary(&mut sequences, num_words, options.oov_token);
        }
        let padded = pad_sequences(
            &sequences,
            Some(options.maxlen),
            options.padding,
            options.truncating,
            options.pad_value,
        );
        Dataset::new(padded, self.labels, num_classes)
    }
}
