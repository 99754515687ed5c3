use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::math::matrix::Matrix;

/// Named trainable parameters, e.g. `gru_1/w_z -> Matrix`.
///
/// Layers never own their weights; they look them up here by name so that a
/// single optimizer can walk every parameter of a model uniformly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamSet {
    params: BTreeMap<String, Matrix>,
}

impl ParamSet {
    pub fn new() -> ParamSet {
        ParamSet::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Matrix) {
        self.params.insert(name.into(), value);
    }

    /// Looks up a parameter that a layer registered itself.
    ///
    /// # Panics
    /// Panics if `name` was never inserted.
    pub fn get(&self, name: &str) -> &Matrix {
        self.params
            .get(name)
            .unwrap_or_else(|| panic!("unknown parameter '{}'", name))
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Matrix> {
        self.params.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Matrix)> {
        self.params.iter()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Total number of scalar weights across all parameters.
    pub fn scalar_count(&self) -> usize {
        self.params.values().map(|m| m.rows * m.cols).sum()
    }
}

/// Gradients keyed by the same names as the `ParamSet` they belong to.
///
/// Entries are created lazily on first accumulation, so a batch only
/// carries gradients for parameters that were actually touched.
#[derive(Debug, Clone, Default)]
pub struct Gradients {
    grads: BTreeMap<String, Matrix>,
}

impl Gradients {
    pub fn new() -> Gradients {
        Gradients::default()
    }

    /// Mutable access to the gradient for `name`, zero-initialised to
    /// `rows x cols` when absent.
    pub fn entry(&mut self, name: &str, rows: usize, cols: usize) -> &mut Matrix {
        let grad = self
            .grads
            .entry(name.to_owned())
            .or_insert_with(|| Matrix::zeros(rows, cols));
        assert_eq!(grad.shape(), (rows, cols), "gradient shape mismatch for '{}'", name);
        grad
    }

    /// Adds `grad` into the stored gradient for `name`.
    pub fn accumulate(&mut self, name: &str, grad: &Matrix) {
        self.entry(name, grad.rows, grad.cols).add_assign(grad);
    }

    pub fn get(&self, name: &str) -> Option<&Matrix> {
        self.grads.get(name)
    }

    pub fn scale(&mut self, factor: f64) {
        for grad in self.grads.values_mut() {
            grad.scale(factor);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Matrix)> {
        self.grads.iter()
    }

    pub fn len(&self) -> usize {
        self.grads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grads.is_empty()
    }
}
