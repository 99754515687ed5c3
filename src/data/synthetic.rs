use anyhow::{ensure, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::data::dataset::Dataset;
use crate::data::sequence::{pad_sequence, Padding, Truncating};

/// Ids below this are reserved: 0 = padding, 1 = start, 2 = out-of-vocabulary.
pub const FIRST_WORD_ID: u32 = 3;
pub const START_TOKEN: u32 = 1;

/// Token-sequence generator used when no corpus is at hand.
///
/// Every class owns a contiguous band of the vocabulary. A sequence draws
/// each token from its class band with probability `signal`, otherwise from
/// the whole vocabulary, so the label is learnable from token identity alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticSequences {
    pub samples: usize,
    pub num_classes: usize,
    pub vocab_size: u32,
    pub maxlen: usize,
    pub signal: f64,
}

impl Default for SyntheticSequences {
    fn default() -> Self {
        SyntheticSequences {
            samples: 2_000,
            num_classes: 46,
            vocab_size: 10_000,
            maxlen: 80,
            signal: 0.7,
        }
    }
}

impl SyntheticSequences {
    pub fn generate<R: Rng>(&self, rng: &mut R) -> Result<Dataset<Vec<u32>>> {
        ensure!(self.num_classes >= 2, "need at least 2 classes, got {}", self.num_classes);
        ensure!(self.maxlen >= 2, "maxlen must be at least 2, got {}", self.maxlen);
        ensure!((0.0..=1.0).contains(&self.signal), "signal must lie in [0, 1], got {}", self.signal);
        let words = self.vocab_size.saturating_sub(FIRST_WORD_ID);
        let band = words / self.num_classes as u32;
        ensure!(
            band >= 1,
            "vocab_size {} is too small for {} classes", self.vocab_size, self.num_classes
        );

        let mut inputs = Vec::with_capacity(self.samples);
        let mut labels = Vec::with_capacity(self.samples);
        for i in 0..self.samples {
            let class = i % self.num_classes;
            let band_start = FIRST_WORD_ID + class as u32 * band;
            let len = rng.gen_range(self.maxlen / 2..=self.maxlen);
            let mut seq = Vec::with_capacity(len);
            seq.push(START_TOKEN);
            for _ in 1..len {
                let id = if rng.gen_bool(self.signal) {
                    rng.gen_range(band_start..band_start + band)
                } else {
                    rng.gen_range(FIRST_WORD_ID..self.vocab_size)
                };
                seq.push(id);
            }
            inputs.push(pad_sequence(&seq, self.maxlen, Padding::Pre, Truncating::Pre, 0));
            labels.push(class);
        }
        Dataset::new(inputs, labels, self.num_classes)
    }
}

/// Gaussian-ish blobs in `[0, 1]^dim`, one per class, for the dense classifier.
pub fn blobs<R: Rng>(samples: usize, num_classes: usize, dim: usize, rng: &mut R) -> Result<Dataset<Vec<f64>>> {
    ensure!(num_classes >= 2, "need at least 2 classes, got {}", num_classes);
    ensure!(dim >= 1, "blobs need at least one feature");
    let centers: Vec<Vec<f64>> = (0..num_classes)
        .map(|_| (0..dim).map(|_| rng.gen_range(0.2..0.8)).collect())
        .collect();

    let mut inputs = Vec::with_capacity(samples);
    let mut labels = Vec::with_capacity(samples);
    for i in 0..samples {
        let class = i % num_classes;
        let point = centers[class]
            .iter()
            .map(|&c| {
                // Sum of three uniforms: a cheap bell-shaped spread.
                let noise: f64 = (0..3).map(|_| rng.gen_range(-0.04..0.04)).sum();
                (c + noise).clamp(0.0, 1.0)
            })
            .collect();
        inputs.push(point);
        labels.push(class);
    }
    Dataset::new(inputs, labels, num_classes)
}
