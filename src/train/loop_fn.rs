use std::time::Instant;

use anyhow::{ensure, Context, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::data::Dataset;
use crate::metrics::{Accuracy, Mean, Metric, RocAuc};
use crate::network::Model;
use crate::optim::Sgd;
use crate::train::epoch_stats::{EpochStats, History};
use crate::train::report::{epoch_line, Phase};
use crate::train::step::{eval_step, train_step};
use crate::train::train_config::TrainConfig;

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

/// Aggregate metrics of one pass over a dataset without parameter updates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub loss: f64,
    /// ROC-AUC as a fraction in [0, 1].
    pub auc: f64,
    pub accuracy: f64,
    pub samples: usize,
}

/// Trains `model` for `config.epochs` epochs and returns the statistics of
/// every epoch.
///
/// Each epoch runs three phases strictly in order:
/// - **training**: one pass over `train` in (optionally shuffled) batches,
///   with an SGD update after every batch;
/// - **validating**: the first `config.validation_steps` batches of
///   `validation` (all of them when unset), no updates;
/// - **reporting**: the epoch lines are printed to stdout and an
///   `EpochStats` is appended to the history.
///
/// # Errors
/// Fails before any update if the config is invalid, the training set is
/// empty or yields no batch, or a sample does not fit the model (class count, input width,
/// token outside the vocabulary).
pub fn train_loop<M: Model, R: Rng>(
    model: &mut M,
    train: &Dataset<M::Input>,
    validation: Option<&Dataset<M::Input>>,
    optimizer: &mut Sgd,
    config: &TrainConfig,
    rng: &mut R,
) -> Result<History> {
    config.validate()?;
    ensure!(!train.is_empty(), "training set must not be empty");
    ensure!(
        train.batch_count(config.batch_size, config.drop_remainder) > 0,
        "drop_remainder with batch_size {} leaves no full batch out of {} training samples",
        config.batch_size,
        train.len()
    );
    check_dataset(&*model, train).context("invalid training set")?;
    if let Some(val) = validation {
        check_dataset(&*model, val).context("invalid validation set")?;
    }

    info!(
        samples = train.len(),
        validation_samples = validation.map_or(0, Dataset::len),
        batches = train.batch_count(config.batch_size, config.drop_remainder),
        parameters = model.params().scalar_count(),
        "starting training"
    );

    let mut history = History::new();
    let mut train_loss = Mean::new();
    let mut train_auc = RocAuc::new(config.auc_thresholds);
    let mut train_accuracy = Accuracy::new();

    for epoch in 0..config.epochs {
        let t_start = Instant::now();
        train_loss.reset();
        train_auc.reset();
        train_accuracy.reset();

        // ── Training ──────────────────────────────────────────────────────
        let order = if config.shuffle {
            train.shuffled_order(rng)
        } else {
            train.sequential_order()
        };
        for (step, batch) in train
            .batches(&order, config.batch_size, config.drop_remainder)
            .enumerate()
        {
            let out = train_step(&*model, &batch);
            if !out.loss.is_finite() {
                warn!(epoch, step, loss = out.loss, "non-finite training loss");
            }
            debug!(epoch, step, loss = out.loss, "batch");

            optimizer.step(model.params_mut(), &out.gradients);

            train_loss.update_many(&out.losses);
            for (probs, &label) in out.probabilities.iter().zip(batch.labels.iter()) {
                train_auc.update_sparse(label, probs);
                train_accuracy.update(label, probs);
            }
        }

        // ── Validating ────────────────────────────────────────────────────
        let val = validation
            .filter(|v| !v.is_empty())
            .map(|v| evaluate_prefix(&*model, v, config.batch_size, config.auc_thresholds, config.validation_steps));

        let elapsed_ms = t_start.elapsed().as_millis() as u64;

        // ── Reporting ─────────────────────────────────────────────────────
        let stats = EpochStats {
            epoch,
            total_epochs: config.epochs,
            train_loss: train_loss.result(),
            train_auc: train_auc.result(),
            train_accuracy: train_accuracy.result(),
            val_loss: val.map(|v| v.loss),
            val_auc: val.map(|v| v.auc),
            val_accuracy: val.map(|v| v.accuracy),
            elapsed_ms,
        };

        if (epoch + 1) % config.report_every == 0 || epoch + 1 == config.epochs {
            println!("{}", epoch_line(epoch, Phase::Training, stats.train_loss, stats.train_auc));
            if let Some(v) = val {
                println!("{}", epoch_line(epoch, Phase::Validation, v.loss, v.auc));
            }
        }
        debug!(epoch, elapsed_ms, accuracy = stats.train_accuracy, "epoch finished");

        history.push(stats);
    }

    Ok(history)
}

/// Scores `dataset` batch by batch with the current parameters.
pub fn evaluate<M: Model>(
    model: &M,
    dataset: &Dataset<M::Input>,
    batch_size: usize,
    auc_thresholds: usize,
) -> Result<Evaluation> {
    ensure!(batch_size > 0, "batch_size must be at least 1");
    ensure!(auc_thresholds >= 2, "auc_thresholds must be at least 2");
    check_dataset(model, dataset)?;
    Ok(evaluate_prefix(model, dataset, batch_size, auc_thresholds, None))
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn evaluate_prefix<M: Model>(
    model: &M,
    dataset: &Dataset<M::Input>,
    batch_size: usize,
    auc_thresholds: usize,
    max_batches: Option<usize>,
) -> Evaluation {
    let mut loss = Mean::new();
    let mut auc = RocAuc::new(auc_thresholds);
    let mut accuracy = Accuracy::new();

    let order = dataset.sequential_order();
    let batches = dataset
        .batches(&order, batch_size, false)
        .take(max_batches.unwrap_or(usize::MAX));
    for batch in batches {
        let (probabilities, losses) = eval_step(model, &batch);
        loss.update_many(&losses);
        for (probs, &label) in probabilities.iter().zip(batch.labels.iter()) {
            auc.update_sparse(label, probs);
            accuracy.update(label, probs);
        }
    }

    Evaluation {
        loss: loss.result(),
        auc: auc.result(),
        accuracy: accuracy.result(),
        samples: loss.count(),
    }
}

fn check_dataset<M: Model>(model: &M, dataset: &Dataset<M::Input>) -> Result<()> {
    ensure!(
        dataset.num_classes() == model.num_classes(),
        "dataset has {} classes but the model predicts {}",
        dataset.num_classes(),
        model.num_classes()
    );
    for (i, (input, _)) in dataset.iter().enumerate() {
        model.validate_input(input).with_context(|| format!("sample {}", i))?;
    }
    Ok(())
}
