use rand::rngs::StdRng;
use rand::SeedableRng;

use seqnet::activation::ActivationFunction;
use seqnet::data::synthetic::{blobs, SyntheticSequences};
use seqnet::data::Dataset;
use seqnet::metrics::{Mean, Metric};
use seqnet::network::{DenseClassifier, DenseSpec, Gradients, Model, ParamSet, SequenceClassifier, SequenceSpec};
use seqnet::optim::Sgd;
use seqnet::train::{evaluate, train_loop, train_step, TrainConfig};

/// Predicts the same uniform distribution for every input.
struct UniformModel {
    classes: usize,
    params: ParamSet,
}

impl Model for UniformModel {
    type Input = Vec<u32>;
    type Trace = ();

    fn num_classes(&self) -> usize {
        self.classes
    }

    fn params(&self) -> &ParamSet {
        &self.params
    }

    fn params_mut(&mut self) -> &mut ParamSet {
        &mut self.params
    }

    fn forward(&self, _input: &Vec<u32>) -> (Vec<f64>, ()) {
        (vec![1.0 / self.classes as f64; self.classes], ())
    }

    fn backward(&self, _trace: &(), _d_logits: &[f64], _grads: &mut Gradients) {}
}

fn uniform_46() -> UniformModel {
    UniformModel { classes: 46, params: ParamSet::new() }
}

#[test]
fn uniform_prediction_over_46_classes_costs_ln_46() {
    let model = uniform_46();
    let ds = Dataset::new(vec![vec![1, 2, 3], vec![4, 5, 6]], vec![0, 1], 46).unwrap();
    let order = ds.sequential_order();
    let batch = ds.batches(&order, 2, false).next().unwrap();

    let out = train_step(&model, &batch);
    let expected = 46f64.ln();
    for loss in &out.losses {
        assert!((loss - expected).abs() < 1e-9);
    }
    assert!((out.loss - expected).abs() < 1e-9);
    assert_eq!(format!("{:.3}", out.loss), "3.829");

    let mut mean = Mean::new();
    mean.update_many(&out.losses);
    assert_eq!(format!("{:.3}", mean.result()), "3.829");
}

#[test]
fn uniform_model_history_reports_constant_loss() {
    let mut model = uniform_46();
    let ds = Dataset::new(vec![vec![1], vec![2], vec![3]], vec![0, 1, 45], 46).unwrap();
    let config = TrainConfig { epochs: 2, batch_size: 2, ..TrainConfig::default() };
    let history = train_loop(
        &mut model, &ds, Some(&ds), &mut config.optimizer(), &config, &mut StdRng::seed_from_u64(0),
    ).unwrap();
    assert_eq!(history.len(), 2);
    for epoch in &history.epochs {
        assert!((epoch.train_loss - 46f64.ln()).abs() < 1e-9);
        assert_eq!(epoch.val_loss.map(|l| (l * 1000.0).round()), Some(3829.0));
        // Constant scores cannot rank positives above negatives.
        assert!((epoch.train_auc - 0.5).abs() < 1e-12);
    }
}

fn tiny_sequence_setup() -> (SequenceClassifier, Dataset<Vec<u32>>) {
    let mut rng = StdRng::seed_from_u64(11);
    let data = SyntheticSequences { samples: 60, num_classes: 3, vocab_size: 33, maxlen: 6, signal: 0.9 }
        .generate(&mut rng)
        .unwrap();
    let spec = SequenceSpec {
        vocab_size: 33,
        embedding_dim: 8,
        first_units: 8,
        second_units: 6,
        num_classes: 3,
    };
    (SequenceClassifier::new(spec, &mut rng).unwrap(), data)
}

#[test]
fn sequence_training_loss_is_finite_and_decreases() {
    let (mut model, data) = tiny_sequence_setup();
    let config = TrainConfig {
        epochs: 20,
        batch_size: 10,
        learning_rate: 0.05,
        momentum: 0.9,
        ..TrainConfig::default()
    };
    let history = train_loop(
        &mut model, &data, None, &mut config.optimizer(), &config, &mut StdRng::seed_from_u64(1),
    ).unwrap();

    let losses = history.train_losses();
    assert_eq!(losses.len(), 20);
    assert!(losses.iter().all(|l| l.is_finite() && *l >= 0.0), "{:?}", losses);
    let tail = (losses[18] + losses[19]) / 2.0;
    assert!(tail < losses[0], "loss did not decrease: {:?}", losses);
}

#[test]
fn dense_training_on_blobs_reduces_loss() {
    let mut rng = StdRng::seed_from_u64(8);
    let data = blobs(90, 3, 2, &mut rng).unwrap();
    let spec = DenseSpec {
        input_size: 2,
        hidden: vec![16],
        num_classes: 3,
        hidden_activation: ActivationFunction::Tanh,
    };
    let mut model = DenseClassifier::new(spec, &mut rng).unwrap();
    let config = TrainConfig {
        epochs: 30,
        batch_size: 9,
        learning_rate: 0.1,
        momentum: 0.9,
        ..TrainConfig::default()
    };
    let history = train_loop(&mut model, &data, None, &mut config.optimizer(), &config, &mut rng).unwrap();
    let losses = history.train_losses();
    assert!(losses[29] < losses[0], "{:?}", losses);
}

#[test]
fn validation_scores_only_the_requested_prefix() {
    let (mut model, data) = tiny_sequence_setup();
    let (validation, train) = data.split_at(10);
    let first_batch = validation.clone().split_at(4).0;

    // A zero learning rate leaves the parameters untouched.
    let config = TrainConfig {
        epochs: 1,
        batch_size: 4,
        learning_rate: 0.0,
        momentum: 0.0,
        validation_steps: Some(1),
        ..TrainConfig::default()
    };
    let history = train_loop(
        &mut model, &train, Some(&validation), &mut Sgd::new(0.0), &config, &mut StdRng::seed_from_u64(2),
    ).unwrap();

    let expected = evaluate(&model, &first_batch, 4, config.auc_thresholds).unwrap();
    let stats = history.last().unwrap();
    assert_eq!(stats.val_loss, Some(expected.loss));
    assert_eq!(stats.val_auc, Some(expected.auc));
    assert_eq!(stats.val_accuracy, Some(expected.accuracy));
}

#[test]
fn invalid_runs_fail_before_training() {
    let (mut model, data) = tiny_sequence_setup();
    let mut rng = StdRng::seed_from_u64(3);
    let config = TrainConfig::new(1, 8);

    let zero_batch = TrainConfig { batch_size: 0, ..config.clone() };
    assert!(train_loop(&mut model, &data, None, &mut Sgd::new(0.1), &zero_batch, &mut rng).is_err());

    let unknown_token = Dataset::new(vec![vec![1, 2, 99, 4, 5, 6]], vec![0], 3).unwrap();
    assert!(train_loop(&mut model, &unknown_token, None, &mut Sgd::new(0.1), &config, &mut rng).is_err());

    let wrong_classes = Dataset::new(vec![vec![1; 6]], vec![0], 5).unwrap();
    assert!(train_loop(&mut model, &wrong_classes, None, &mut Sgd::new(0.1), &config, &mut rng).is_err());

    let empty: Dataset<Vec<u32>> = Dataset::new(vec![], vec![], 3).unwrap();
    assert!(train_loop(&mut model, &empty, None, &mut Sgd::new(0.1), &config, &mut rng).is_err());
}

#[test]
fn dropping_the_only_partial_batch_is_rejected() {
    let (mut model, data) = tiny_sequence_setup();
    let (few, _) = data.split_at(5);
    let mut rng = StdRng::seed_from_u64(4);

    let dropping = TrainConfig { drop_remainder: true, ..TrainConfig::new(1, 8) };
    let err = train_loop(&mut model, &few, None, &mut Sgd::new(0.1), &dropping, &mut rng).unwrap_err();
    assert!(err.to_string().contains("no full batch"), "{}", err);

    let keeping = TrainConfig::new(1, 8);
    let history = train_loop(&mut model, &few, None, &mut Sgd::new(0.1), &keeping, &mut rng).unwrap();
    assert!(history.epochs[0].train_loss > 0.0);
}
