use crate::data::Batch;
use crate::loss::SparseCrossEntropyLoss;
use crate::network::{Gradients, Model};

/// Result of one forward/backward pass over a batch.
#[derive(Debug, Clone)]
pub struct StepOutput {
    /// Predicted class distribution per sample.
    pub probabilities: Vec<Vec<f64>>,
    /// Cross-entropy of each sample.
    pub losses: Vec<f64>,
    /// Mean of `losses`.
    pub loss: f64,
    /// Gradient of `loss` for every parameter the batch touched.
    pub gradients: Gradients,
}

/// Forward pass, sparse cross-entropy and backward pass for a batch.
///
/// Per-sample gradients are summed into one `Gradients` and divided by the
/// batch size, so the result is the gradient of the mean loss. Parameters
/// are left untouched.
///
/// # Panics
/// Panics if the batch is empty.
pub fn train_step<M: Model>(model: &M, batch: &Batch<'_, M::Input>) -> StepOutput {
    assert!(!batch.is_empty(), "train_step called with an empty batch");

    let mut gradients = Gradients::new();
    let mut probabilities = Vec::with_capacity(batch.len());
    let mut losses = Vec::with_capacity(batch.len());

    for (&input, &label) in batch.inputs.iter().zip(batch.labels.iter()) {
        let (probs, trace) = model.forward(input);
        losses.push(SparseCrossEntropyLoss::loss(&probs, label));
        let d_logits = SparseCrossEntropyLoss::derivative(&probs, label);
        model.backward(&trace, &d_logits, &mut gradients);
        probabilities.push(probs);
    }

    let n = batch.len() as f64;
    gradients.scale(1.0 / n);
    let loss = losses.iter().sum::<f64>() / n;

    StepOutput { probabilities, losses, loss, gradients }
}

/// Forward pass and per-sample losses without gradients (eval mode).
pub fn eval_step<M: Model>(model: &M, batch: &Batch<'_, M::Input>) -> (Vec<Vec<f64>>, Vec<f64>) {
    batch
        .inputs
        .iter()
        .zip(batch.labels.iter())
        .map(|(&input, &label)| {
            let probs = model.predict(input);
            let loss = SparseCrossEntropyLoss::loss(&probs, label);
            (probs, loss)
        })
        .unzip()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Dataset;
    use crate::network::{DenseClassifier, DenseSpec};
    use crate::activation::ActivationFunction;
    use rand::{rngs::StdRng, SeedableRng};

    fn model() -> DenseClassifier {
        let spec = DenseSpec {
            input_size: 2,
            hidden: vec![3],
            num_classes: 2,
            hidden_activation: ActivationFunction::Tanh,
        };
        DenseClassifier::new(spec, &mut StdRng::seed_from_u64(4)).unwrap()
    }

    #[test]
    fn batch_gradient_is_mean_of_sample_gradients() {
        let model = model();
        let ds = Dataset::new(vec![vec![0.1, 0.9], vec![0.8, 0.2]], vec![0, 1], 2).unwrap();
        let order = ds.sequential_order();

        let both = train_step(&model, &ds.batches(&order, 2, false).next().unwrap());
        let singles: Vec<StepOutput> = ds.batches(&order, 1, false).map(|b| train_step(&model, &b)).collect();

        assert!((both.loss - (singles[0].loss + singles[1].loss) / 2.0).abs() < 1e-12);
        for (name, g) in both.gradients.iter() {
            let a = singles[0].gradients.get(name).unwrap();
            let b = singles[1].gradients.get(name).unwrap();
            for i in 0..g.rows {
                for j in 0..g.cols {
                    let expected = (a.data[i][j] + b.data[i][j]) / 2.0;
                    assert!((g.data[i][j] - expected).abs() < 1e-12);
                }
            }
        }
    }

    #[test]
    fn eval_step_matches_train_step_losses() {
        let model = model();
        let ds = Dataset::new(vec![vec![0.3, 0.3], vec![1.0, 0.0]], vec![1, 0], 2).unwrap();
        let order = ds.sequential_order();
        let batch = ds.batches(&order, 2, false).next().unwrap();
        let (probs, losses) = eval_step(&model, &batch);
        let step = train_step(&model, &batch);
        assert_eq!(probs, step.probabilities);
        assert_eq!(losses, step.losses);
    }
}
