pub mod corpus;
pub mod csv;
pub mod dataset;
pub mod idx;
pub mod images;
pub mod sequence;
pub mod split;
pub mod synthetic;

pub use corpus::{Corpus, CorpusOptions};
pub use dataset::{Batch, Dataset};
pub use sequence::{limit_vocabulary, pad_sequence, pad_sequences, Padding, Truncating};
pub use split::{partition, Partitions};
