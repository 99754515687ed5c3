use rand::Rng;
use serde::{Serialize, Deserialize};
use std::f64::consts::PI;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix{
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Vec<f64>>
}

impl Matrix{
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix{
            rows,
            cols,
            data: vec![vec![0.0; cols]; rows]
        }
    }

    /// Samples every entry from U(-limit, limit).
    pub fn uniform<R: Rng>(rows: usize, cols: usize, limit: f64, rng: &mut R) -> Matrix {
        let mut res = Matrix::zeros(rows, cols);

        for i in 0..rows {
            for j in 0..cols {
                res.data[i][j] = rng.gen_range(-limit..=limit);
            }
        }

        res
    }

    /// Samples a single value from N(0, 1) using the Box-Muller transform.
    /// Both u1 and u2 must be uniform on (0, 1].
    fn sample_standard_normal<R: Rng>(rng: &mut R) -> f64 {
        let u1: f64 = 1.0 - rng.gen::<f64>();
        let u2: f64 = 1.0 - rng.gen::<f64>();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }

    /// He initialization: samples from N(0, sqrt(2 / rows)).
    ///
    /// Recommended before ReLU layers. The variance 2/fan_in accounts for
    /// the fact that ReLU zeroes half of its inputs on average.
    ///
    /// Shape: (rows, cols). Kernels are stored input-major, so `rows` is the
    /// fan-in.
    pub fn he<R: Rng>(rows: usize, cols: usize, rng: &mut R) -> Matrix {
        let std_dev = (2.0 / rows as f64).sqrt();
        let mut res = Matrix::zeros(rows, cols);
        for i in 0..rows {
            for j in 0..cols {
                res.data[i][j] = Matrix::sample_standard_normal(rng) * std_dev;
            }
        }
        res
    }

    /// Glorot (Xavier) uniform initialization: U(-l, l) with
    /// l = sqrt(6 / (fan_in + fan_out)).
    ///
    /// Used for Sigmoid/Tanh/Softmax kernels and the recurrent gates.
    pub fn glorot_uniform<R: Rng>(rows: usize, cols: usize, rng: &mut R) -> Matrix {
        let limit = (6.0 / (rows + cols) as f64).sqrt();
        Matrix::uniform(rows, cols, limit, rng)
    }

    pub fn row_vector(values: Vec<f64>) -> Matrix {
        Matrix { rows: 1, cols: values.len(), data: vec![values] }
    }

    pub fn from_data(data: Vec<Vec<f64>>) -> Matrix {
        let cols = data.first().map_or(0, |row| row.len());
        assert!(
            data.iter().all(|row| row.len() == cols),
            "Matrix rows must all have the same length"
        );
        Matrix {
            rows: data.len(),
            cols,
            data
        }
    }

    /// `self += rhs`, in place.
    pub fn add_assign(&mut self, rhs: &Matrix) {
        self.add_scaled(rhs, 1.0);
    }

    /// `self += scale * rhs`, in place.
    pub fn add_scaled(&mut self, rhs: &Matrix, scale: f64) {
        self.assert_same_shape(rhs);
        for (row_a, row_b) in self.data.iter_mut().zip(rhs.data.iter()) {
            for (a, b) in row_a.iter_mut().zip(row_b.iter()) {
                *a += scale * b;
            }
        }
    }

    pub fn scale(&mut self, factor: f64) {
        for row in self.data.iter_mut() {
            for x in row.iter_mut() {
                *x *= factor;
            }
        }
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i]
    }

    /// Adds `values` into row `i`.
    pub fn add_to_row(&mut self, i: usize, values: &[f64]) {
        assert_eq!(values.len(), self.cols, "row length mismatch");
        for (a, b) in self.data[i].iter_mut().zip(values.iter()) {
            *a += b;
        }
    }

    /// Row vector times matrix: `v · self`, with `v.len() == rows`.
    pub fn vec_mul(&self, v: &[f64]) -> Vec<f64> {
        assert_eq!(v.len(), self.rows, "vector length does not match matrix rows");
        let mut out = vec![0.0; self.cols];
        for (k, &a) in v.iter().enumerate() {
            if a == 0.0 {
                continue;
            }
            for (o, w) in out.iter_mut().zip(self.data[k].iter()) {
                *o += a * w;
            }
        }
        out
    }

    /// Row vector times the transpose: `v · selfᵀ`, with `v.len() == cols`.
    pub fn vec_mul_transposed(&self, v: &[f64]) -> Vec<f64> {
        assert_eq!(v.len(), self.cols, "vector length does not match matrix cols");
        self.data
            .iter()
            .map(|row| row.iter().zip(v.iter()).map(|(w, x)| w * x).sum())
            .collect()
    }

    /// `self += aᵀ · b` (outer product), with `a.len() == rows`, `b.len() == cols`.
    pub fn add_outer(&mut self, a: &[f64], b: &[f64]) {
        assert_eq!(a.len(), self.rows, "outer product row mismatch");
        assert_eq!(b.len(), self.cols, "outer product col mismatch");
        for (row, &x) in self.data.iter_mut().zip(a.iter()) {
            if x == 0.0 {
                continue;
            }
            for (cell, &y) in row.iter_mut().zip(b.iter()) {
                *cell += x * y;
            }
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    fn assert_same_shape(&self, rhs: &Matrix) {
        if self.rows != rhs.rows || self.cols != rhs.cols {
            panic!(
                "Matrices are of incorrect sizes: {}x{} vs {}x{}",
                self.rows, self.cols, rhs.rows, rhs.cols
            )
        }
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix { rows: 0, cols: 0, data: vec![] }
    }
}
