use rand::Rng;

use crate::activation::activation::sigmoid;
use crate::math::matrix::Matrix;
use crate::network::params::{Gradients, ParamSet};

/// Gated recurrent unit.
///
/// Per time step, with `x` the input row and `h` the previous state:
/// ```text
/// z  = σ(x·Wz + h·Uz + bz)          update gate
/// r  = σ(x·Wr + h·Ur + br)          reset gate
/// c  = tanh(x·Wh + (r⊙h)·Uh + bh)   candidate state
/// h' = z⊙h + (1 − z)⊙c
/// ```
/// The initial state is zero. With `return_sequences` the layer emits every
/// hidden state (`T x units`), otherwise only the last one (`1 x units`).
#[derive(Debug, Clone)]
pub struct Gru {
    pub name: String,
    pub input_dim: usize,
    pub units: usize,
    pub return_sequences: bool,
}

/// Values saved by `Gru::forward` for backpropagation through time.
#[derive(Debug, Clone)]
pub struct GruTrace {
    inputs: Matrix,
    steps: Vec<GruStep>,
}

#[derive(Debug, Clone)]
struct GruStep {
    h_prev: Vec<f64>,
    z: Vec<f64>,
    r: Vec<f64>,
    reset_state: Vec<f64>,
    candidate: Vec<f64>,
}

struct GateNames {
    w: [String; 3],
    u: [String; 3],
    b: [String; 3],
}

const Z: usize = 0;
const R: usize = 1;
const H: usize = 2;

impl Gru {
    pub fn new(
        name: impl Into<String>,
        input_dim: usize,
        units: usize,
        return_sequences: bool,
    ) -> Gru {
        Gru { name: name.into(), input_dim, units, return_sequences }
    }

    fn names(&self) -> GateNames {
        let gate = |prefix: &str| {
            ["z", "r", "h"].map(|g| format!("{}/{}_{}", self.name, prefix, g))
        };
        GateNames { w: gate("w"), u: gate("u"), b: gate("b") }
    }

    /// Registers the nine gate parameters: Glorot-uniform kernels, zero biases.
    pub fn init_params<R2: Rng>(&self, params: &mut ParamSet, rng: &mut R2) {
        let names = self.names();
        for g in 0..3 {
            params.insert(names.w[g].clone(), Matrix::glorot_uniform(self.input_dim, self.units, rng));
            params.insert(names.u[g].clone(), Matrix::glorot_uniform(self.units, self.units, rng));
            params.insert(names.b[g].clone(), Matrix::zeros(1, self.units));
        }
    }

    /// Parameter names and expected shapes, used to validate loaded models.
    pub fn param_shapes(&self) -> Vec<(String, (usize, usize))> {
        let names = self.names();
        (0..3)
            .flat_map(|g| {
                vec![
                    (names.w[g].clone(), (self.input_dim, self.units)),
                    (names.u[g].clone(), (self.units, self.units)),
                    (names.b[g].clone(), (1, self.units)),
                ]
            })
            .collect()
    }

    pub fn forward(&self, params: &ParamSet, inputs: &Matrix) -> (Matrix, GruTrace) {
        assert!(
            inputs.rows == 0 || inputs.cols == self.input_dim,
            "GRU '{}' expects {} input features, got {}",
            self.name, self.input_dim, inputs.cols
        );
        let names = self.names();
        let w = names.w.each_ref().map(|n| params.get(n));
        let u = names.u.each_ref().map(|n| params.get(n));
        let b = names.b.each_ref().map(|n| params.get(n));

        let mut h = vec![0.0; self.units];
        let mut steps = Vec::with_capacity(inputs.rows);
        let mut outputs = Vec::with_capacity(inputs.rows);

        for t in 0..inputs.rows {
            let x = inputs.row(t);

            let z = gate(&[w[Z].vec_mul(x), u[Z].vec_mul(&h)], b[Z].row(0), sigmoid);
            let r = gate(&[w[R].vec_mul(x), u[R].vec_mul(&h)], b[R].row(0), sigmoid);
            let reset_state: Vec<f64> = r.iter().zip(h.iter()).map(|(r, h)| r * h).collect();
            let candidate = gate(
                &[w[H].vec_mul(x), u[H].vec_mul(&reset_state)],
                b[H].row(0),
                f64::tanh,
            );

            let h_next: Vec<f64> = (0..self.units)
                .map(|j| z[j] * h[j] + (1.0 - z[j]) * candidate[j])
                .collect();

            steps.push(GruStep { h_prev: h, z, r, reset_state, candidate });
            if self.return_sequences {
                outputs.push(h_next.clone());
            }
            h = h_next;
        }

        let output = if self.return_sequences {
            Matrix { rows: outputs.len(), cols: self.units, data: outputs }
        } else {
            Matrix::row_vector(h)
        };

        (output, GruTrace { inputs: inputs.clone(), steps })
    }

    /// Backpropagation through time.
    ///
    /// `d_out` has the shape of the forward output. Gradients for all gate
    /// parameters are accumulated into `grads`; the returned matrix is the
    /// gradient with respect to the inputs (`T x input_dim`).
    pub fn backward(
        &self,
        params: &ParamSet,
        trace: &GruTrace,
        d_out: &Matrix,
        grads: &mut Gradients,
    ) -> Matrix {
        let names = self.names();
        let w = names.w.each_ref().map(|n| params.get(n));
        let u = names.u.each_ref().map(|n| params.get(n));

        let mut dw: [Matrix; 3] = std::array::from_fn(|_| Matrix::zeros(self.input_dim, self.units));
        let mut du: [Matrix; 3] = std::array::from_fn(|_| Matrix::zeros(self.units, self.units));
        let mut db: [Matrix; 3] = std::array::from_fn(|_| Matrix::zeros(1, self.units));

        let n_steps = trace.steps.len();
        let mut d_inputs = vec![vec![0.0; self.input_dim]; n_steps];
        let mut dh_next = vec![0.0; self.units];

        for t in (0..n_steps).rev() {
            let step = &trace.steps[t];
            let x = trace.inputs.row(t);

            let mut dh = dh_next.clone();
            let upstream = if self.return_sequences {
                Some(d_out.row(t))
            } else if t == n_steps - 1 {
                Some(d_out.row(0))
            } else {
                None
            };
            if let Some(row) = upstream {
                for (a, b) in dh.iter_mut().zip(row.iter()) {
                    *a += b;
                }
            }

            // h' = z⊙h + (1 − z)⊙c
            let mut dh_prev: Vec<f64> = (0..self.units).map(|j| dh[j] * step.z[j]).collect();
            let da_z: Vec<f64> = (0..self.units)
                .map(|j| {
                    let z = step.z[j];
                    dh[j] * (step.h_prev[j] - step.candidate[j]) * z * (1.0 - z)
                })
                .collect();
            let da_h: Vec<f64> = (0..self.units)
                .map(|j| {
                    let c = step.candidate[j];
                    dh[j] * (1.0 - step.z[j]) * (1.0 - c * c)
                })
                .collect();

            // c = tanh(x·Wh + (r⊙h)·Uh + bh)
            let d_reset_state = u[H].vec_mul_transposed(&da_h);
            let da_r: Vec<f64> = (0..self.units)
                .map(|j| {
                    let r = step.r[j];
                    d_reset_state[j] * step.h_prev[j] * r * (1.0 - r)
                })
                .collect();
            for j in 0..self.units {
                dh_prev[j] += d_reset_state[j] * step.r[j];
            }

            dw[H].add_outer(x, &da_h);
            du[H].add_outer(&step.reset_state, &da_h);
            db[H].add_to_row(0, &da_h);

            for (g, da) in [(Z, &da_z), (R, &da_r)] {
                dw[g].add_outer(x, da);
                du[g].add_outer(&step.h_prev, da);
                db[g].add_to_row(0, da);
                for (acc, v) in dh_prev.iter_mut().zip(u[g].vec_mul_transposed(da)) {
                    *acc += v;
                }
            }

            let dx = &mut d_inputs[t];
            for (g, da) in [(Z, &da_z), (R, &da_r), (H, &da_h)] {
                for (acc, v) in dx.iter_mut().zip(w[g].vec_mul_transposed(da)) {
                    *acc += v;
                }
            }

            dh_next = dh_prev;
        }

        for g in 0..3 {
            grads.accumulate(&names.w[g], &dw[g]);
            grads.accumulate(&names.u[g], &du[g]);
            grads.accumulate(&names.b[g], &db[g]);
        }

        Matrix { rows: n_steps, cols: self.input_dim, data: d_inputs }
    }
}

/// `activation(sum(parts) + bias)`, element-wise.
fn gate(parts: &[Vec<f64>], bias: &[f64], activation: fn(f64) -> f64) -> Vec<f64> {
    bias.iter()
        .enumerate()
        .map(|(j, b)| activation(parts.iter().map(|p| p[j]).sum::<f64>() + b))
        .collect()
}
