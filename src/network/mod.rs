pub mod dense;
pub mod params;
pub mod sequence;
pub mod spec;

pub use dense::DenseClassifier;
pub use params::{Gradients, ParamSet};
pub use sequence::SequenceClassifier;
pub use spec::{DenseSpec, SavedModel, SequenceSpec};

/// A classifier trainable by the custom training loop.
///
/// `forward` is pure: everything backpropagation needs is returned in the
/// trace, and parameters are only changed by the optimizer through
/// `params_mut`.
pub trait Model {
    type Input;
    type Trace;

    fn num_classes(&self) -> usize;

    fn params(&self) -> &ParamSet;

    fn params_mut(&mut self) -> &mut ParamSet;

    /// Class probabilities for one sample, plus the values backward needs.
    fn forward(&self, input: &Self::Input) -> (Vec<f64>, Self::Trace);

    /// Accumulates ∂L/∂θ into `grads`, given ∂L/∂logits of the output layer.
    fn backward(&self, trace: &Self::Trace, d_logits: &[f64], grads: &mut Gradients);

    /// Rejects inputs the model cannot consume (wrong width, unknown token).
    fn validate_input(&self, _input: &Self::Input) -> anyhow::Result<()> {
        Ok(())
    }

    fn predict(&self, input: &Self::Input) -> Vec<f64> {
        self.forward(input).0
    }
}
