use rand::Rng;

use crate::{activation::activation::ActivationFunction, math::matrix::Matrix};
use crate::network::params::{Gradients, ParamSet};

/// Fully-connected layer: `a = activation(x·W + b)`.
#[derive(Debug, Clone)]
pub struct Dense {
    pub name: String,
    pub input_size: usize,
    pub size: usize,
    pub activator: ActivationFunction,
}

/// Input and pre-activation of one forward pass, needed for the derivative.
#[derive(Debug, Clone)]
pub struct DenseTrace {
    input: Vec<f64>,
    pre_neurons: Vec<f64>,
}

impl Dense {
    pub fn new(
        name: impl Into<String>,
        input_size: usize,
        size: usize,
        activation: ActivationFunction,
    ) -> Dense {
        Dense { name: name.into(), input_size, size, activator: activation }
    }

    pub fn kernel_name(&self) -> String {
        format!("{}/kernel", self.name)
    }

    pub fn bias_name(&self) -> String {
        format!("{}/bias", self.name)
    }

    /// He-normal kernels before ReLU, Glorot-uniform otherwise; zero biases.
    pub fn init_params<R: Rng>(&self, params: &mut ParamSet, rng: &mut R) {
        let kernel = match self.activator {
            ActivationFunction::ReLU => Matrix::he(self.input_size, self.size, rng),
            _ => Matrix::glorot_uniform(self.input_size, self.size, rng),
        };
        params.insert(self.kernel_name(), kernel);
        params.insert(self.bias_name(), Matrix::zeros(1, self.size));
    }

    pub fn param_shapes(&self) -> Vec<(String, (usize, usize))> {
        vec![
            (self.kernel_name(), (self.input_size, self.size)),
            (self.bias_name(), (1, self.size)),
        ]
    }

    pub fn forward(&self, params: &ParamSet, input: &[f64]) -> (Vec<f64>, DenseTrace) {
        let kernel = params.get(&self.kernel_name());
        let bias = params.get(&self.bias_name());

        let z: Vec<f64> = kernel
            .vec_mul(input)
            .into_iter()
            .zip(bias.row(0).iter())
            .map(|(x, b)| x + b)
            .collect();
        let a = self.activator.apply(&z);

        (a, DenseTrace { input: input.to_vec(), pre_neurons: z })
    }

    /// `d_out` is ∂L/∂a for this layer (for a Softmax layer: ∂L/∂z, see
    /// `ActivationFunction::derivative`). Accumulates kernel and bias
    /// gradients and returns ∂L/∂x.
    pub fn backward(
        &self,
        params: &ParamSet,
        trace: &DenseTrace,
        d_out: &[f64],
        grads: &mut Gradients,
    ) -> Vec<f64> {
        // δ = error ⊙ σ'(z)
        let delta: Vec<f64> = d_out
            .iter()
            .zip(trace.pre_neurons.iter())
            .map(|(e, &z)| e * self.activator.derivative(z))
            .collect();

        grads
            .entry(&self.kernel_name(), self.input_size, self.size)
            .add_outer(&trace.input, &delta);
        grads
            .entry(&self.bias_name(), 1, self.size)
            .add_to_row(0, &delta);

        params.get(&self.kernel_name()).vec_mul_transposed(&delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn forward_computes_affine_then_activation() {
        let layer = Dense::new("d", 2, 2, ActivationFunction::ReLU);
        let mut params = ParamSet::new();
        params.insert(layer.kernel_name(), Matrix::from_data(vec![vec![1.0, -1.0], vec![2.0, 0.5]]));
        params.insert(layer.bias_name(), Matrix::row_vector(vec![0.5, -3.0]));
        let (out, _) = layer.forward(&params, &[1.0, 1.0]);
        assert_eq!(out, vec![3.5, 0.0]);
    }

    #[test]
    fn softmax_output_is_a_distribution() {
        let layer = Dense::new("out", 3, 5, ActivationFunction::Softmax);
        let mut params = ParamSet::new();
        layer.init_params(&mut params, &mut StdRng::seed_from_u64(3));
        let (out, _) = layer.forward(&params, &[0.2, -0.4, 1.0]);
        assert!((out.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(out.iter().all(|&p| p > 0.0));
    }

    #[test]
    fn gradients_match_finite_differences() {
        let mut rng = StdRng::seed_from_u64(5);
        let layer = Dense::new("d", 3, 2, ActivationFunction::Tanh);
        let mut params = ParamSet::new();
        layer.init_params(&mut params, &mut rng);
        params.insert(layer.bias_name(), Matrix::uniform(1, 2, 0.5, &mut rng));
        let input = vec![0.3, -0.7, 0.9];
        let weights = [1.5, -0.5];
        let objective = |p: &ParamSet, x: &[f64]| -> f64 {
            layer.forward(p, x).0.iter().zip(weights.iter()).map(|(a, w)| a * w).sum()
        };

        let (_, trace) = layer.forward(&params, &input);
        let mut grads = Gradients::new();
        let d_input = layer.backward(&params, &trace, &weights, &mut grads);

        let eps = 1e-6;
        for (name, (rows, cols)) in layer.param_shapes() {
            for i in 0..rows {
                for j in 0..cols {
                    let mut plus = params.clone();
                    plus.get_mut(&name).unwrap().data[i][j] += eps;
                    let mut minus = params.clone();
                    minus.get_mut(&name).unwrap().data[i][j] -= eps;
                    let numeric = (objective(&plus, &input) - objective(&minus, &input)) / (2.0 * eps);
                    let analytic = grads.get(&name).unwrap().data[i][j];
                    assert!((numeric - analytic).abs() < 1e-6, "{} [{}][{}]", name, i, j);
                }
            }
        }
        for k in 0..input.len() {
            let mut plus = input.clone();
            plus[k] += eps;
            let mut minus = input.clone();
            minus[k] -= eps;
            let numeric = (objective(&params, &plus) - objective(&params, &minus)) / (2.0 * eps);
            assert!((numeric - d_input[k]).abs() < 1e-6);
        }
    }
}
