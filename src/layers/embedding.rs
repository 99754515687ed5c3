use rand::Rng;

use crate::math::matrix::Matrix;
use crate::network::params::{Gradients, ParamSet};

/// Token-id lookup table: id `i` maps to row `i` of a `vocab_size x dim`
/// matrix registered as `<name>/embeddings`.
#[derive(Debug, Clone)]
pub struct Embedding {
    pub name: String,
    pub vocab_size: usize,
    pub dim: usize,
}

impl Embedding {
    pub fn new(name: impl Into<String>, vocab_size: usize, dim: usize) -> Embedding {
        Embedding { name: name.into(), vocab_size, dim }
    }

    pub fn weights_name(&self) -> String {
        format!("{}/embeddings", self.name)
    }

    /// Registers the table in `params`, sampled from U(-0.05, 0.05).
    pub fn init_params<R: Rng>(&self, params: &mut ParamSet, rng: &mut R) {
        params.insert(
            self.weights_name(),
            Matrix::uniform(self.vocab_size, self.dim, 0.05, rng),
        );
    }

    /// Looks up every id; returns a `len(ids) x dim` matrix.
    ///
    /// # Panics
    /// Panics on an id outside the vocabulary. Datasets are validated against
    /// `vocab_size` before training starts.
    pub fn forward(&self, params: &ParamSet, ids: &[u32]) -> Matrix {
        let table = params.get(&self.weights_name());
        let data = ids
            .iter()
            .map(|&id| {
                let id = id as usize;
                assert!(id < self.vocab_size, "token id {} outside vocabulary of {}", id, self.vocab_size);
                table.row(id).to_vec()
            })
            .collect();
        Matrix { rows: ids.len(), cols: self.dim, data }
    }

    /// Scatter-adds `d_out` (one row per looked-up id) into the table gradient.
    pub fn backward(&self, ids: &[u32], d_out: &Matrix, grads: &mut Gradients) {
        assert_eq!(d_out.rows, ids.len(), "embedding gradient has wrong number of rows");
        let grad = grads.entry(&self.weights_name(), self.vocab_size, self.dim);
        for (t, &id) in ids.iter().enumerate() {
            grad.add_to_row(id as usize, d_out.row(t));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn forward_returns_table_rows() {
        let layer = Embedding::new("emb", 3, 2);
        let mut params = ParamSet::new();
        params.insert(
            layer.weights_name(),
            Matrix::from_data(vec![vec![0.0, 0.1], vec![1.0, 1.1], vec![2.0, 2.1]]),
        );
        let out = layer.forward(&params, &[2, 0, 2]);
        assert_eq!(out.data, vec![vec![2.0, 2.1], vec![0.0, 0.1], vec![2.0, 2.1]]);
    }

    #[test]
    fn repeated_ids_accumulate_gradient() {
        let layer = Embedding::new("emb", 4, 2);
        let mut grads = Gradients::new();
        let d_out = Matrix::from_data(vec![vec![1.0, 2.0], vec![0.5, 0.5], vec![1.0, 1.0]]);
        layer.backward(&[3, 1, 3], &d_out, &mut grads);
        let g = grads.get("emb/embeddings").map(|m| m.data.clone()).unwrap_or_default();
        assert_eq!(g[3], vec![2.0, 3.0]);
        assert_eq!(g[1], vec![0.5, 0.5]);
        assert_eq!(g[0], vec![0.0, 0.0]);
    }

    #[test]
    fn init_is_small_uniform() {
        let layer = Embedding::new("emb", 10, 4);
        let mut params = ParamSet::new();
        layer.init_params(&mut params, &mut StdRng::seed_from_u64(1));
        let table = params.get("emb/embeddings");
        assert_eq!(table.shape(), (10, 4));
        assert!(table.data.iter().flatten().all(|x| x.abs() <= 0.05));
    }

    #[test]
    #[should_panic(expected = "outside vocabulary")]
    fn out_of_vocabulary_id_panics() {
        let layer = Embedding::new("emb", 2, 1);
        let mut params = ParamSet::new();
        params.insert(layer.weights_name(), Matrix::zeros(2, 1));
        layer.forward(&params, &[5]);
    }
}
