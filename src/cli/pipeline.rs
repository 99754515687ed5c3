use std::path::Path;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use seqnet::config::RunConfig;
use seqnet::data::csv::load_csv;
use seqnet::data::idx::load_idx_pair;
use seqnet::data::images::load_image_folder;
use seqnet::data::synthetic::blobs;
use seqnet::data::{partition, Corpus, Dataset, Partitions};
use seqnet::network::{DenseClassifier, DenseSpec, Model, SavedModel, SequenceClassifier};
use seqnet::train::report::test_line;
use seqnet::train::{evaluate, train_loop};

use crate::cli::commands::{
    DenseArgs, DenseData, DenseSource, EvaluateArgs, SequenceArgs, SequenceData, SequenceSource,
};

const IDX_DEFAULT_CLASSES: usize = 10;
const BLOB_DEFAULT_CLASSES: usize = 3;

pub fn run_sequence(args: SequenceArgs) -> Result<()> {
    let config = args.run_config()?;
    config.validate()?;
    let mut rng = StdRng::seed_from_u64(config.seed);

    let dataset = load_sequences(&args.data, &config, &mut rng)?;
    let mut spec = config.sequence.clone();
    spec.num_classes = dataset.num_classes();

    let parts = partition(dataset, config.test_fraction, config.validation_size, &mut rng)?;
    let mut model = SequenceClassifier::new(spec, &mut rng)?;
    fit(&mut model, &parts, &config, &mut rng, args.run.history_out.as_deref())?;

    if let Some(path) = &args.run.save_model {
        model.save_json(path)?;
        info!(path = %path.display(), "model saved");
    }
    Ok(())
}

pub fn run_dense(args: DenseArgs) -> Result<()> {
    let config = args.run_config()?;
    config.validate()?;
    let mut rng = StdRng::seed_from_u64(config.seed);

    let dataset = load_dense(&args.data, &config, &mut rng)?;
    let input_size = dataset.inputs().first().map_or(0, Vec::len);
    let spec = DenseSpec {
        input_size,
        hidden: config.dense.hidden.clone(),
        num_classes: dataset.num_classes(),
        hidden_activation: config.dense.hidden_activation,
    };

    let parts = partition(dataset, config.test_fraction, config.validation_size, &mut rng)?;
    let mut model = DenseClassifier::new(spec, &mut rng)?;
    fit(&mut model, &parts, &config, &mut rng, args.run.history_out.as_deref())?;

    if let Some(path) = &args.run.save_model {
        model.save_json(path)?;
        info!(path = %path.display(), "model saved");
    }
    Ok(())
}

pub fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    let saved = SavedModel::load_json(&args.model)?;
    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut config = RunConfig { seed: args.seed, ..RunConfig::default() };

    match saved {
        SavedModel::Sequence { spec, params } => {
            let model = SequenceClassifier::from_parts(spec, params)?;
            let vocab_size = u32::try_from(model.spec().vocab_size)
                .context("saved vocabulary does not fit a token id")?;
            let num_words = args.sequence.num_words_or(vocab_size);
            config.synthetic = args.sequence.synthetic_options(model.num_classes(), num_words);
            config.corpus = args.sequence.corpus_options(num_words);
            let dataset = load_sequences(&args.sequence, &config, &mut rng)?;
            report_test(&model, &dataset, args.batch_size, args.auc_thresholds)
        }
        SavedModel::Dense { spec, params } => {
            let model = DenseClassifier::from_parts(spec, params)?;
            config.dense.image_width = args.dense.image_width;
            config.dense.image_height = args.dense.image_height;
            config.dense.color = args.dense.color();
            let dataset = load_dense(&args.dense, &config, &mut rng)?;
            report_test(&model, &dataset, args.batch_size, args.auc_thresholds)
        }
    }
}

/// Training, then the test evaluation and the history file.
fn fit<M: Model>(
    model: &mut M,
    parts: &Partitions<M::Input>,
    config: &RunConfig,
    rng: &mut StdRng,
    history_out: Option<&Path>,
) -> Result<()> {
    let mut optimizer = config.train.optimizer();
    let history = train_loop(model, &parts.train, parts.validation.as_ref(), &mut optimizer, &config.train, rng)?;

    if let Some(test) = &parts.test {
        report_test(&*model, test, config.train.batch_size, config.train.auc_thresholds)?;
    }
    if let Some(path) = history_out {
        history.save_json(path)?;
        info!(path = %path.display(), epochs = history.len(), "history written");
    }
    Ok(())
}

fn report_test<M: Model>(model: &M, dataset: &Dataset<M::Input>, batch_size: usize, auc_thresholds: usize) -> Result<()> {
    let eval = evaluate(model, dataset, batch_size, auc_thresholds)?;
    println!("{}", test_line(eval.loss, eval.auc, eval.accuracy));
    Ok(())
}

fn load_sequences(data: &SequenceData, config: &RunConfig, rng: &mut StdRng) -> Result<Dataset<Vec<u32>>> {
    let dataset = match data.source()? {
        SequenceSource::Corpus(path) => {
            let corpus = Corpus::load_json(&path)?;
            info!(path = %path.display(), samples = corpus.sequences.len(), "corpus loaded");
            corpus
                .into_dataset(&config.corpus)
                .with_context(|| format!("cannot prepare {}", path.display()))?
        }
        SequenceSource::Synthetic => {
            let ds = config.synthetic.generate(rng)?;
            info!(samples = ds.len(), classes = ds.num_classes(), "synthetic corpus generated");
            ds
        }
    };
    Ok(dataset)
}

fn load_dense(data: &DenseData, config: &RunConfig, rng: &mut StdRng) -> Result<Dataset<Vec<f64>>> {
    let dataset = match data.source()? {
        DenseSource::Csv(path) => {
            let csv = load_csv(&path, data.num_classes)?;
            if let Some(names) = &csv.class_names {
                info!(classes = ?names, "class names from CSV");
            }
            csv.dataset
        }
        DenseSource::Idx { images, labels } => {
            load_idx_pair(&images, &labels, data.num_classes.unwrap_or(IDX_DEFAULT_CLASSES))?
        }
        DenseSource::ImageDir(dir) => {
            let dense = &config.dense;
            let folder = load_image_folder(&dir, dense.image_width, dense.image_height, dense.color)?;
            info!(classes = ?folder.class_names, "class names from directories");
            folder.dataset
        }
        DenseSource::Blobs => blobs(
            data.blob_samples,
            data.num_classes.unwrap_or(BLOB_DEFAULT_CLASSES),
            2,
            rng,
        )?,
    };
    info!(samples = dataset.len(), classes = dataset.num_classes(), "dataset loaded");
    Ok(dataset)
}
