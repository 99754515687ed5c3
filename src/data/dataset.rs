use anyhow::{ensure, Result};
use rand::seq::SliceRandom;
use rand::Rng;

/// Inputs paired with integer class labels from a fixed label set.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset<I> {
    inputs: Vec<I>,
    labels: Vec<usize>,
    num_classes: usize,
}

/// One mini-batch, borrowed from a `Dataset`.
#[derive(Debug)]
pub struct Batch<'a, I> {
    pub inputs: Vec<&'a I>,
    pub labels: Vec<usize>,
}

impl<I> Batch<'_, I> {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl<I> Dataset<I> {
    /// # Errors
    /// Fails when lengths differ or a label is `>= num_classes`.
    pub fn new(inputs: Vec<I>, labels: Vec<usize>, num_classes: usize) -> Result<Dataset<I>> {
        ensure!(
            inputs.len() == labels.len(),
            "dataset has {} inputs but {} labels", inputs.len(), labels.len()
        );
        if let Some((i, &label)) = labels.iter().enumerate().find(|&(_, &l)| l >= num_classes) {
            anyhow::bail!("sample {}: label {} is out of range for {} classes", i, label, num_classes);
        }
        Ok(Dataset { inputs, labels, num_classes })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    pub fn inputs(&self) -> &[I] {
        &self.inputs
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    pub fn iter(&self) -> impl Iterator<Item = (&I, usize)> {
        self.inputs.iter().zip(self.labels.iter().copied())
    }

    /// Sample order `0..len`.
    pub fn sequential_order(&self) -> Vec<usize> {
        (0..self.len()).collect()
    }

    /// A fresh random permutation of `0..len`.
    pub fn shuffled_order<R: Rng>(&self, rng: &mut R) -> Vec<usize> {
        let mut order = self.sequential_order();
        order.shuffle(rng);
        order
    }

    /// Groups the samples named by `order` into batches of `batch_size`.
    /// The last batch is shorter unless `drop_remainder` is set.
    ///
    /// # Panics
    /// Panics if `batch_size == 0`.
    pub fn batches<'a>(
        &'a self,
        order: &'a [usize],
        batch_size: usize,
        drop_remainder: bool,
    ) -> impl Iterator<Item = Batch<'a, I>> + 'a {
        assert!(batch_size > 0, "batch_size must be at least 1");
        order
            .chunks(batch_size)
            .filter(move |chunk| !drop_remainder || chunk.len() == batch_size)
            .map(move |chunk| Batch {
                inputs: chunk.iter().map(|&i| &self.inputs[i]).collect(),
                labels: chunk.iter().map(|&i| self.labels[i]).collect(),
            })
    }

    /// Number of batches `batches` yields for `len` samples.
    pub fn batch_count(&self, batch_size: usize, drop_remainder: bool) -> usize {
        if drop_remainder {
            self.len() / batch_size
        } else {
            self.len().div_ceil(batch_size)
        }
    }

    /// First `n` samples and the rest (`n` is clamped to `len`).
    pub fn split_at(self, n: usize) -> (Dataset<I>, Dataset<I>) {
        let n = n.min(self.len());
        let Dataset { mut inputs, mut labels, num_classes } = self;
        let rest_inputs = inputs.split_off(n);
        let rest_labels = labels.split_off(n);
        (
            Dataset { inputs, labels, num_classes },
            Dataset { inputs: rest_inputs, labels: rest_labels, num_classes },
        )
    }

    /// Splits at `round(len * fraction)`; `fraction` is clamped to [0, 1].
    pub fn split_fraction(self, fraction: f64) -> (Dataset<I>, Dataset<I>) {
        let n = (self.len() as f64 * fraction.clamp(0.0, 1.0)).round() as usize;
        self.split_at(n)
    }

    /// The same samples in a random order.
    pub fn shuffled<R: Rng>(self, rng: &mut R) -> Dataset<I> {
        let order = self.shuffled_order(rng);
        let Dataset { inputs, labels, num_classes } = self;
        let mut slots: Vec<Option<(I, usize)>> = inputs.into_iter().zip(labels).map(Some).collect();
        let (inputs, labels) = order
            .into_iter()
            .filter_map(|i| slots[i].take())
            .unzip();
        Dataset { inputs, labels, num_classes }
    }
}
