use std::path::Path;

use anyhow::{ensure, Result};
use rand::Rng;

use crate::activation::activation::ActivationFunction;
use crate::layers::{Dense, DenseTrace};
use crate::network::params::{Gradients, ParamSet};
use crate::network::spec::{check_params, DenseSpec, SavedModel};
use crate::network::Model;

/// Multi-layer perceptron over flat feature vectors, softmax output.
#[derive(Debug, Clone)]
pub struct DenseClassifier {
    spec: DenseSpec,
    layers: Vec<Dense>,
    params: ParamSet,
}

impl DenseClassifier {
    pub fn new<R: Rng>(spec: DenseSpec, rng: &mut R) -> Result<DenseClassifier> {
        spec.validate()?;
        let mut model = DenseClassifier::with_params(spec, ParamSet::new());
        for layer in &model.layers {
            layer.init_params(&mut model.params, rng);
        }
        Ok(model)
    }

    pub fn from_parts(spec: DenseSpec, params: ParamSet) -> Result<DenseClassifier> {
        spec.validate()?;
        let model = DenseClassifier::with_params(spec, params);
        let shapes: Vec<_> = model.layers.iter().flat_map(|l| l.param_shapes()).collect();
        check_params(&model.params, &shapes)?;
        Ok(model)
    }

    fn with_params(spec: DenseSpec, params: ParamSet) -> DenseClassifier {
        let mut layers = Vec::with_capacity(spec.hidden.len() + 1);
        let mut input_size = spec.input_size;
        for (i, &size) in spec.hidden.iter().enumerate() {
            layers.push(Dense::new(format!("dense_{}", i + 1), input_size, size, spec.hidden_activation));
            input_size = size;
        }
        layers.push(Dense::new("output", input_size, spec.num_classes, ActivationFunction::Softmax));
        DenseClassifier { spec, layers, params }
    }

    pub fn spec(&self) -> &DenseSpec {
        &self.spec
    }

    pub fn to_saved(&self) -> SavedModel {
        SavedModel::Dense { spec: self.spec.clone(), params: self.params.clone() }
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        self.to_saved().save_json(path)
    }
}

impl Model for DenseClassifier {
    type Input = Vec<f64>;
    type Trace = Vec<DenseTrace>;

    fn num_classes(&self) -> usize {
        self.spec.num_classes
    }

    fn params(&self) -> &ParamSet {
        &self.params
    }

    fn params_mut(&mut self) -> &mut ParamSet {
        &mut self.params
    }

    fn forward(&self, input: &Vec<f64>) -> (Vec<f64>, Vec<DenseTrace>) {
        let mut current = input.clone();
        let mut traces = Vec::with_capacity(self.layers.len());
        for layer in &self.layers {
            let (out, trace) = layer.forward(&self.params, &current);
            traces.push(trace);
            current = out;
        }
        (current, traces)
    }

    fn backward(&self, trace: &Vec<DenseTrace>, d_logits: &[f64], grads: &mut Gradients) {
        let mut delta = d_logits.to_vec();
        for (layer, layer_trace) in self.layers.iter().zip(trace.iter()).rev() {
            delta = layer.backward(&self.params, layer_trace, &delta, grads);
        }
    }

    fn validate_input(&self, input: &Vec<f64>) -> Result<()> {
        ensure!(
            input.len() == self.spec.input_size,
            "expected {} features, got {}", self.spec.input_size, input.len()
        );
        Ok(())
    }
}
