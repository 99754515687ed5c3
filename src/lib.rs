pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod loss;
pub mod optim;
pub mod metrics;
pub mod data;
pub mod train;
pub mod config;

// Convenience re-exports
pub use math::matrix::Matrix;
pub use activation::activation::ActivationFunction;
pub use data::{Dataset, Batch};
pub use network::{DenseClassifier, DenseSpec, Model, ParamSet, SavedModel, SequenceClassifier, SequenceSpec};
pub use loss::SparseCrossEntropyLoss;
pub use metrics::{Accuracy, Mean, Metric, RocAuc};
pub use optim::sgd::Sgd;
pub use train::{evaluate, train_loop, History, TrainConfig};
pub use config::RunConfig;
