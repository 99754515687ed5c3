use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, Subcommand, ValueEnum};

use seqnet::activation::ActivationFunction;
use seqnet::config::{DenseOptions, RunConfig};
use seqnet::data::images::ColorMode;
use seqnet::data::synthetic::SyntheticSequences;
use seqnet::data::{CorpusOptions, Padding, Truncating};
use seqnet::network::SequenceSpec;
use seqnet::train::TrainConfig;

/// The Reuters notebooks validate on the first 1000 training samples.
const REUTERS_VALIDATION_SIZE: usize = 1000;

/// Vocabulary bound used for training when `--num-words` is not given.
const DEFAULT_NUM_WORDS: u32 = 10_000;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the embedding + GRU + GRU + softmax sequence classifier
    Sequence(SequenceArgs),

    /// Train a fully-connected classifier on CSV, IDX or image-folder data
    Dense(DenseArgs),

    /// Score a saved model on a dataset
    Evaluate(EvaluateArgs),
}

// ─── Shared flag groups ──────────────────────────────────────────────────────

#[derive(Args, Debug, Clone)]
pub struct TrainFlags {
    /// Number of full passes through the training data
    #[arg(long, default_value_t = 10)]
    pub epochs: usize,

    /// Samples per mini-batch
    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 0.005)]
    pub learning_rate: f64,

    /// SGD momentum in [0, 1); 0 gives plain SGD
    #[arg(long, default_value_t = 0.9)]
    pub momentum: f64,

    #[arg(long)]
    pub nesterov: bool,

    /// Validation batches scored per epoch (all when omitted)
    #[arg(long)]
    pub validation_steps: Option<usize>,

    /// Keep the training order fixed instead of reshuffling every epoch
    #[arg(long)]
    pub no_shuffle: bool,

    /// Skip the final short training batch of each epoch
    #[arg(long)]
    pub drop_remainder: bool,

    /// Print the epoch lines every N epochs
    #[arg(long, default_value_t = 1)]
    pub report_every: usize,

    #[arg(long, default_value_t = 200)]
    pub auc_thresholds: usize,
}

impl From<TrainFlags> for TrainConfig {
    fn from(a: TrainFlags) -> Self {
        TrainConfig {
            epochs:           a.epochs,
            batch_size:       a.batch_size,
            learning_rate:    a.learning_rate,
            momentum:         a.momentum,
            nesterov:         a.nesterov,
            validation_steps: a.validation_steps,
            shuffle:          !a.no_shuffle,
            drop_remainder:   a.drop_remainder,
            report_every:     a.report_every,
            auc_thresholds:   a.auc_thresholds,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct RunFlags {
    /// Seed for initialisation, shuffling and synthetic data
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Share of the data held out for the final test evaluation
    #[arg(long, default_value_t = 0.2)]
    pub test_fraction: f64,

    /// Leading training samples held out for validation
    /// (sequence default 1000, dense default a fifth of the training data)
    #[arg(long)]
    pub validation_size: Option<usize>,

    /// JSON run config; replaces every hyper-parameter flag. Fields it
    /// leaves out take the subcommand's defaults
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write the per-epoch history as JSON
    #[arg(long)]
    pub history_out: Option<PathBuf>,

    /// Write the trained model as JSON
    #[arg(long)]
    pub save_model: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct SequenceData {
    /// Tokenised corpus JSON ({"sequences": [[...]], "labels": [...]})
    #[arg(long, conflicts_with = "synthetic")]
    pub corpus: Option<PathBuf>,

    /// Generate a learnable synthetic corpus instead of loading one
    #[arg(long)]
    pub synthetic: bool,

    #[arg(long, default_value_t = 2000)]
    pub synthetic_samples: usize,

    /// Sequence length after padding/truncation
    #[arg(long, default_value_t = 80)]
    pub maxlen: usize,

    /// Keep only the most frequent word ids below this bound
    /// (10000 for training, the saved model's vocabulary for evaluate)
    #[arg(long)]
    pub num_words: Option<u32>,

    #[arg(long, default_value_t = 2)]
    pub oov_token: u32,

    /// Pad at the end instead of the start
    #[arg(long)]
    pub post_padding: bool,

    /// Cut long sequences at the end instead of the start
    #[arg(long)]
    pub post_truncating: bool,
}

impl SequenceData {
    /// `--num-words`, or `default` when the flag was not given.
    pub fn num_words_or(&self, default: u32) -> u32 {
        self.num_words.unwrap_or(default)
    }

    pub fn corpus_options(&self, num_words: u32) -> CorpusOptions {
        CorpusOptions {
            maxlen: self.maxlen,
            num_words: Some(num_words),
            oov_token: self.oov_token,
            padding: if self.post_padding { Padding::Post } else { Padding::Pre },
            truncating: if self.post_truncating { Truncating::Post } else { Truncating::Pre },
            pad_value: 0,
        }
    }

    pub fn synthetic_options(&self, num_classes: usize, num_words: u32) -> SyntheticSequences {
        SyntheticSequences {
            samples: self.synthetic_samples,
            num_classes,
            vocab_size: num_words,
            maxlen: self.maxlen,
            ..SyntheticSequences::default()
        }
    }

    pub fn source(&self) -> Result<SequenceSource> {
        match (&self.corpus, self.synthetic) {
            (Some(path), false) => Ok(SequenceSource::Corpus(path.clone())),
            (None, true) => Ok(SequenceSource::Synthetic),
            _ => bail!("pass exactly one of --corpus <file> or --synthetic"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SequenceSource {
    Corpus(PathBuf),
    Synthetic,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HiddenActivation {
    Relu,
    Sigmoid,
    Tanh,
    Identity,
}

impl From<HiddenActivation> for ActivationFunction {
    fn from(a: HiddenActivation) -> Self {
        match a {
            HiddenActivation::Relu     => ActivationFunction::ReLU,
            HiddenActivation::Sigmoid  => ActivationFunction::Sigmoid,
            HiddenActivation::Tanh     => ActivationFunction::Tanh,
            HiddenActivation::Identity => ActivationFunction::Identity,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct DenseData {
    /// CSV file whose last column is the class
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// IDX3 image file (needs --idx-labels)
    #[arg(long, requires = "idx_labels")]
    pub idx_images: Option<PathBuf>,

    /// IDX1 label file
    #[arg(long, requires = "idx_images")]
    pub idx_labels: Option<PathBuf>,

    /// Directory with one sub-directory of images per class
    #[arg(long)]
    pub image_dir: Option<PathBuf>,

    /// Generate 2-D blobs instead of loading data
    #[arg(long)]
    pub blobs: bool,

    #[arg(long, default_value_t = 600)]
    pub blob_samples: usize,

    /// Class count (inferred from the data when omitted; 10 for IDX)
    #[arg(long)]
    pub num_classes: Option<usize>,

    #[arg(long, default_value_t = 32)]
    pub image_width: u32,

    #[arg(long, default_value_t = 32)]
    pub image_height: u32,

    /// Keep three colour channels instead of converting to grayscale
    #[arg(long)]
    pub rgb: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DenseSource {
    Csv(PathBuf),
    Idx { images: PathBuf, labels: PathBuf },
    ImageDir(PathBuf),
    Blobs,
}

impl DenseData {
    pub fn source(&self) -> Result<DenseSource> {
        let mut sources = Vec::new();
        if let Some(path) = &self.csv {
            sources.push(DenseSource::Csv(path.clone()));
        }
        if let (Some(images), Some(labels)) = (&self.idx_images, &self.idx_labels) {
            sources.push(DenseSource::Idx { images: images.clone(), labels: labels.clone() });
        }
        if let Some(dir) = &self.image_dir {
            sources.push(DenseSource::ImageDir(dir.clone()));
        }
        if self.blobs {
            sources.push(DenseSource::Blobs);
        }
        match sources.len() {
            1 => Ok(sources.remove(0)),
            0 => bail!("no data source: pass --csv, --idx-images/--idx-labels, --image-dir or --blobs"),
            n => bail!("{} data sources given; pass exactly one", n),
        }
    }

    pub fn color(&self) -> ColorMode {
        if self.rgb { ColorMode::Rgb } else { ColorMode::Grayscale }
    }
}

// ─── Subcommands ─────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct SequenceArgs {
    #[command(flatten)]
    pub data: SequenceData,

    /// Size of each token's embedding vector
    #[arg(long, default_value_t = 64)]
    pub embedding_dim: usize,

    /// Units of the first (sequence-returning) GRU
    #[arg(long, default_value_t = 64)]
    pub first_units: usize,

    /// Units of the second GRU
    #[arg(long, default_value_t = 32)]
    pub second_units: usize,

    /// Topic count of the synthetic corpus
    #[arg(long, default_value_t = 46)]
    pub classes: usize,

    #[command(flatten)]
    pub train: TrainFlags,

    #[command(flatten)]
    pub run: RunFlags,
}

impl SequenceArgs {
    /// Hyper-parameters from the flags, or from `--config` when given.
    pub fn run_config(&self) -> Result<RunConfig> {
        if let Some(path) = &self.run.config {
            let mut config = RunConfig::load_json(path)?;
            if config.validation_size.is_none() {
                config.validation_size = Some(REUTERS_VALIDATION_SIZE);
            }
            return Ok(config);
        }
        let num_words = self.data.num_words_or(DEFAULT_NUM_WORDS);
        Ok(RunConfig {
            seed: self.run.seed,
            test_fraction: self.run.test_fraction,
            validation_size: Some(self.run.validation_size.unwrap_or(REUTERS_VALIDATION_SIZE)),
            train: self.train.clone().into(),
            corpus: self.data.corpus_options(num_words),
            sequence: SequenceSpec {
                vocab_size: num_words as usize,
                embedding_dim: self.embedding_dim,
                first_units: self.first_units,
                second_units: self.second_units,
                num_classes: self.classes,
            },
            synthetic: self.data.synthetic_options(self.classes, num_words),
            dense: DenseOptions::default(),
        })
    }
}

#[derive(Args, Debug)]
pub struct DenseArgs {
    #[command(flatten)]
    pub data: DenseData,

    /// Hidden layer sizes, comma-separated
    #[arg(long, value_delimiter = ',', default_value = "64,64")]
    pub hidden: Vec<usize>,

    #[arg(long, value_enum, default_value_t = HiddenActivation::Relu)]
    pub activation: HiddenActivation,

    #[command(flatten)]
    pub train: TrainFlags,

    #[command(flatten)]
    pub run: RunFlags,
}

impl DenseArgs {
    pub fn run_config(&self) -> Result<RunConfig> {
        if let Some(path) = &self.run.config {
            return RunConfig::load_json(path);
        }
        Ok(RunConfig {
            seed: self.run.seed,
            test_fraction: self.run.test_fraction,
            validation_size: self.run.validation_size,
            train: self.train.clone().into(),
            dense: DenseOptions {
                hidden: self.hidden.clone(),
                hidden_activation: self.activation.into(),
                image_width: self.data.image_width,
                image_height: self.data.image_height,
                color: self.data.color(),
            },
            ..RunConfig::default()
        })
    }
}

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Saved model JSON written by --save-model
    #[arg(long)]
    pub model: PathBuf,

    #[command(flatten)]
    pub sequence: SequenceData,

    #[command(flatten)]
    pub dense: DenseData,

    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 200)]
    pub auc_thresholds: usize,

    /// Seed for synthetic data. Passing the training seed regenerates the
    /// training corpus, so the default differs from the training default
    #[arg(long, default_value_t = EVALUATION_SEED)]
    pub seed: u64,
}

/// Default `evaluate --seed`; distinct from the training default of 42.
const EVALUATION_SEED: u64 = 4242;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn sequence_flags_become_a_run_config() {
        let cli = Cli::try_parse_from([
            "seqnet", "sequence", "--synthetic", "--epochs", "3", "--maxlen", "20",
            "--momentum", "0.5", "--nesterov", "--validation-steps", "4",
        ]).unwrap();
        let Commands::Sequence(args) = cli.command else { panic!("wrong subcommand") };
        assert_eq!(args.data.source().unwrap(), SequenceSource::Synthetic);
        let config = args.run_config().unwrap();
        assert_eq!(config.train.epochs, 3);
        assert_eq!(config.train.momentum, 0.5);
        assert!(config.train.nesterov);
        assert_eq!(config.train.validation_steps, Some(4));
        assert_eq!(config.corpus.maxlen, 20);
        assert_eq!(config.synthetic.maxlen, 20);
        assert_eq!(config.sequence.num_classes, 46);
        assert_eq!(config.sequence.vocab_size, 10_000);
        assert_eq!(config.validation_size, Some(1000));
    }

    #[test]
    fn config_files_fill_validation_size_per_subcommand() {
        let path = std::env::temp_dir().join(format!("seqnet-partial-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"train": {"epochs": 2}}"#).unwrap();
        let path_arg = path.to_str().unwrap();

        let cli = Cli::try_parse_from(["seqnet", "dense", "--blobs", "--config", path_arg]).unwrap();
        let Commands::Dense(args) = cli.command else { panic!("wrong subcommand") };
        let config = args.run_config().unwrap();
        assert_eq!(config.train.epochs, 2);
        assert_eq!(config.validation_size, None);

        let cli = Cli::try_parse_from(["seqnet", "sequence", "--synthetic", "--config", path_arg]).unwrap();
        let Commands::Sequence(args) = cli.command else { panic!("wrong subcommand") };
        assert_eq!(args.run_config().unwrap().validation_size, Some(1000));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn evaluate_defaults_leave_vocabulary_to_the_model() {
        let cli = Cli::try_parse_from(["seqnet", "evaluate", "--model", "m.json", "--synthetic"]).unwrap();
        let Commands::Evaluate(args) = cli.command else { panic!("wrong subcommand") };
        assert_eq!(args.sequence.num_words, None);
        assert_eq!(args.sequence.num_words_or(200), 200);
        assert_eq!(args.sequence.synthetic_options(4, 200).vocab_size, 200);
        assert_ne!(args.seed, 42);
    }

    #[test]
    fn corpus_and_synthetic_conflict() {
        assert!(Cli::try_parse_from(["seqnet", "sequence", "--synthetic", "--corpus", "x.json"]).is_err());
    }

    #[test]
    fn dense_needs_exactly_one_source() {
        let cli = Cli::try_parse_from(["seqnet", "dense", "--hidden", "8,4"]).unwrap();
        let Commands::Dense(args) = cli.command else { panic!("wrong subcommand") };
        assert!(args.data.source().is_err());
        let config = args.run_config().unwrap();
        assert_eq!(config.dense.hidden, vec![8, 4]);
        assert_eq!(config.validation_size, None);

        let cli = Cli::try_parse_from(["seqnet", "dense", "--csv", "iris.csv", "--blobs"]).unwrap();
        let Commands::Dense(args) = cli.command else { panic!("wrong subcommand") };
        assert!(args.data.source().is_err());
    }

    #[test]
    fn idx_files_come_in_pairs() {
        assert!(Cli::try_parse_from(["seqnet", "dense", "--idx-images", "a"]).is_err());
        let cli = Cli::try_parse_from(["seqnet", "dense", "--idx-images", "a", "--idx-labels", "b"]).unwrap();
        let Commands::Dense(args) = cli.command else { panic!("wrong subcommand") };
        assert_eq!(
            args.data.source().unwrap(),
            DenseSource::Idx { images: "a".into(), labels: "b".into() }
        );
    }
}
