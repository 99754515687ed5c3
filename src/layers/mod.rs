pub mod dense;
pub mod embedding;
pub mod gru;

pub use dense::{Dense, DenseTrace};
pub use embedding::Embedding;
pub use gru::{Gru, GruTrace};
