/// Small epsilon added inside log() to prevent log(0) = -inf.
const EPS: f64 = 1e-12;

/// Categorical cross-entropy against an integer class label, for use with a
/// Softmax output layer.
pub struct SparseCrossEntropyLoss;

impl SparseCrossEntropyLoss {
    /// L = -log(predicted[label] + eps)
    ///
    /// # Panics
    /// Panics if `label >= predicted.len()`.
    pub fn loss(predicted: &[f64], label: usize) -> f64 {
        assert!(label < predicted.len(), "label {} out of range for {} classes", label, predicted.len());
        -(predicted[label] + EPS).ln()
    }

    /// Gradient of the combined Softmax + cross-entropy w.r.t. the pre-softmax
    /// logits:
    ///   ∂L/∂z = predicted - onehot(label)
    pub fn derivative(predicted: &[f64], label: usize) -> Vec<f64> {
        assert!(label < predicted.len(), "label {} out of range for {} classes", label, predicted.len());
        let mut grad = predicted.to_vec();
        grad[label] -= 1.0;
        grad
    }
}
