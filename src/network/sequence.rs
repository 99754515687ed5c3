use std::path::Path;

use anyhow::{bail, Result};
use rand::Rng;

use crate::activation::activation::ActivationFunction;
use crate::layers::{Dense, DenseTrace, Embedding, Gru, GruTrace};
use crate::math::matrix::Matrix;
use crate::network::params::{Gradients, ParamSet};
use crate::network::spec::{check_params, SavedModel, SequenceSpec};
use crate::network::Model;

/// Embedding → GRU (full sequence) → GRU (last state) → Dense softmax.
#[derive(Debug, Clone)]
pub struct SequenceClassifier {
    spec: SequenceSpec,
    embedding: Embedding,
    encoder: Gru,
    summarizer: Gru,
    head: Dense,
    params: ParamSet,
}

pub struct SequenceTrace {
    ids: Vec<u32>,
    encoder: GruTrace,
    summarizer: GruTrace,
    head: DenseTrace,
}

impl SequenceClassifier {
    pub fn new<R: Rng>(spec: SequenceSpec, rng: &mut R) -> Result<SequenceClassifier> {
        spec.validate()?;
        let mut model = SequenceClassifier::with_params(spec, ParamSet::new());
        model.embedding.init_params(&mut model.params, rng);
        model.encoder.init_params(&mut model.params, rng);
        model.summarizer.init_params(&mut model.params, rng);
        model.head.init_params(&mut model.params, rng);
        Ok(model)
    }

    /// Rebuilds a classifier from saved weights, checking every shape.
    pub fn from_parts(spec: SequenceSpec, params: ParamSet) -> Result<SequenceClassifier> {
        spec.validate()?;
        let model = SequenceClassifier::with_params(spec, params);
        check_params(&model.params, &model.param_shapes())?;
        Ok(model)
    }

    fn with_params(spec: SequenceSpec, params: ParamSet) -> SequenceClassifier {
        SequenceClassifier {
            embedding: Embedding::new("embedding", spec.vocab_size, spec.embedding_dim),
            encoder: Gru::new("gru_1", spec.embedding_dim, spec.first_units, true),
            summarizer: Gru::new("gru_2", spec.first_units, spec.second_units, false),
            head: Dense::new("output", spec.second_units, spec.num_classes, ActivationFunction::Softmax),
            spec,
            params,
        }
    }

    fn param_shapes(&self) -> Vec<(String, (usize, usize))> {
        let mut shapes = vec![(self.embedding.weights_name(), (self.spec.vocab_size, self.spec.embedding_dim))];
        shapes.extend(self.encoder.param_shapes());
        shapes.extend(self.summarizer.param_shapes());
        shapes.extend(self.head.param_shapes());
        shapes
    }

    pub fn spec(&self) -> &SequenceSpec {
        &self.spec
    }

    pub fn to_saved(&self) -> SavedModel {
        SavedModel::Sequence { spec: self.spec.clone(), params: self.params.clone() }
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        self.to_saved().save_json(path)
    }
}

impl Model for SequenceClassifier {
    type Input = Vec<u32>;
    type Trace = SequenceTrace;

    fn num_classes(&self) -> usize {
        self.spec.num_classes
    }

    fn params(&self) -> &ParamSet {
        &self.params
    }

    fn params_mut(&mut self) -> &mut ParamSet {
        &mut self.params
    }

    fn forward(&self, input: &Vec<u32>) -> (Vec<f64>, SequenceTrace) {
        let embedded = self.embedding.forward(&self.params, input);
        let (states, encoder) = self.encoder.forward(&self.params, &embedded);
        let (last, summarizer) = self.summarizer.forward(&self.params, &states);
        let (probabilities, head) = self.head.forward(&self.params, last.row(0));

        let trace = SequenceTrace { ids: input.clone(), encoder, summarizer, head };
        (probabilities, trace)
    }

    fn backward(&self, trace: &SequenceTrace, d_logits: &[f64], grads: &mut Gradients) {
        let d_last = self.head.backward(&self.params, &trace.head, d_logits, grads);
        let d_states = self.summarizer.backward(
            &self.params,
            &trace.summarizer,
            &Matrix::row_vector(d_last),
            grads,
        );
        let d_embedded = self.encoder.backward(&self.params, &trace.encoder, &d_states, grads);
        self.embedding.backward(&trace.ids, &d_embedded, grads);
    }

    fn validate_input(&self, input: &Vec<u32>) -> Result<()> {
        if let Some(&id) = input.iter().find(|&&id| id as usize >= self.spec.vocab_size) {
            bail!("token id {} is outside the vocabulary of {}", id, self.spec.vocab_size);
        }
        Ok(())
    }
}
