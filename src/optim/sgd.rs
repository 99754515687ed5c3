use std::collections::BTreeMap;

use crate::math::matrix::Matrix;
use crate::network::params::{Gradients, ParamSet};

/// Stochastic gradient descent with optional (Nesterov) momentum.
///
/// Velocities are kept per parameter name:
/// ```text
/// v = momentum·v − lr·g
/// w = w + v                      (classic)
/// w = w + momentum·v − lr·g      (nesterov)
/// ```
/// With `momentum == 0` this is plain `w -= lr·g` and no velocity is stored.
#[derive(Debug, Clone)]
pub struct Sgd {
    pub learning_rate: f64,
    pub momentum: f64,
    pub nesterov: bool,
    velocities: BTreeMap<String, Matrix>,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Sgd {
        Sgd::with_momentum(learning_rate, 0.0, false)
    }

    pub fn with_momentum(learning_rate: f64, momentum: f64, nesterov: bool) -> Sgd {
        Sgd { learning_rate, momentum, nesterov, velocities: BTreeMap::new() }
    }

    /// Applies one update to every parameter that has a gradient.
    ///
    /// # Panics
    /// Panics if `grads` names a parameter missing from `params`.
    pub fn step(&mut self, params: &mut ParamSet, grads: &Gradients) {
        for (name, grad) in grads.iter() {
            let param = params
                .get_mut(name)
                .unwrap_or_else(|| panic!("gradient for unknown parameter '{}'", name));

            if self.momentum == 0.0 {
                param.add_scaled(grad, -self.learning_rate);
                continue;
            }

            let velocity = self
                .velocities
                .entry(name.clone())
                .or_insert_with(|| Matrix::zeros(grad.rows, grad.cols));
            velocity.scale(self.momentum);
            velocity.add_scaled(grad, -self.learning_rate);

            if self.nesterov {
                param.add_scaled(velocity, self.momentum);
                param.add_scaled(grad, -self.learning_rate);
            } else {
                param.add_assign(velocity);
            }
        }
    }

    pub fn velocity(&self, name: &str) -> Option<&Matrix> {
        self.velocities.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(value: f64) -> (ParamSet, Gradients) {
        let mut params = ParamSet::new();
        params.insert("w", Matrix::row_vector(vec![value]));
        let mut grads = Gradients::new();
        grads.accumulate("w", &Matrix::row_vector(vec![1.0]));
        (params, grads)
    }

    fn w(params: &ParamSet) -> f64 {
        params.get("w").data[0][0]
    }

    #[test]
    fn plain_sgd_steps_against_gradient() {
        let (mut params, grads) = single(1.0);
        let mut opt = Sgd::new(0.1);
        opt.step(&mut params, &grads);
        assert!((w(&params) - 0.9).abs() < 1e-12);
        assert!(opt.velocity("w").is_none());
    }

    #[test]
    fn momentum_follows_velocity_recurrence() {
        let (mut params, grads) = single(0.0);
        let mut opt = Sgd::with_momentum(0.1, 0.9, false);
        // v1 = -0.1, w1 = -0.1; v2 = -0.19, w2 = -0.29; v3 = -0.271, w3 = -0.561
        for expected in [-0.1, -0.29, -0.561] {
            opt.step(&mut params, &grads);
            assert!((w(&params) - expected).abs() < 1e-12, "{} != {}", w(&params), expected);
        }
    }

    #[test]
    fn nesterov_looks_ahead() {
        let (mut params, grads) = single(0.0);
        let mut opt = Sgd::with_momentum(0.1, 0.9, true);
        // v1 = -0.1, w1 = 0.9·(-0.1) - 0.1 = -0.19
        opt.step(&mut params, &grads);
        assert!((w(&params) + 0.19).abs() < 1e-12);
    }

    #[test]
    #[should_panic(expected = "unknown parameter")]
    fn gradient_without_parameter_panics() {
        let (_, grads) = single(0.0);
        Sgd::new(0.1).step(&mut ParamSet::new(), &grads);
    }
}
