use serde::{Serialize, Deserialize};
use std::f64::consts::E;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationFunction {
    Sigmoid,
    ReLU,
    Identity,
    /// Softmax is a vector-valued activation; it is applied at the layer level
    /// (not element-wise) by `Dense::forward()`.  The element-wise `function()`
    /// is therefore not used for this variant.
    Softmax,
    Tanh,
}

impl ActivationFunction {
    /// Element-wise activation.  For `Softmax`, call `apply()` which
    /// normalizes the full row.
    pub fn function(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => sigmoid(x),
            ActivationFunction::ReLU => if x > 0.0 { x } else { 0.0 },
            ActivationFunction::Identity => x,
            ActivationFunction::Softmax => {
                panic!("ActivationFunction::Softmax::function() must not be called directly; \
                        use ActivationFunction::apply() which applies the full-vector softmax.")
            }
            ActivationFunction::Tanh => x.tanh(),
        }
    }

    /// Element-wise derivative of the activation, evaluated at the
    /// pre-activation value `x`.
    ///
    /// For `Softmax`, the output layer is paired with cross-entropy and the
    /// combined gradient `predicted - expected` is already with respect to
    /// the logits.  Returning `1.0` here passes that delta through unchanged.
    pub fn derivative(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => {
                let fx = sigmoid(x);
                fx * (1.0 - fx)
            },
            ActivationFunction::ReLU => if x > 0.0 { 1.0 } else { 0.0 },
            ActivationFunction::Identity => 1.0,
            ActivationFunction::Softmax => 1.0,
            ActivationFunction::Tanh => {
                let t = x.tanh();
                1.0 - t * t
            }
        }
    }

    /// Applies the activation to a whole row of pre-activations.
    pub fn apply(&self, z: &[f64]) -> Vec<f64> {
        match self {
            ActivationFunction::Softmax => softmax(z),
            other => z.iter().map(|&x| other.function(x)).collect(),
        }
    }
}

pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + E.powf(-x))
}

/// Numerically stable softmax (max-shifted).
pub fn softmax(z: &[f64]) -> Vec<f64> {
    let max = z.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = z.iter().map(|&x| (x - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}
