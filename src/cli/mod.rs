// Command-line layer: clap parses the flags, converts them into the
// library's config structs and hands off to the pipeline functions.

pub mod commands;
mod pipeline;

use anyhow::Result;
use clap::Parser;
use commands::Commands;

#[derive(Parser, Debug)]
#[command(
    name = "seqnet",
    version,
    about = "Train GRU sequence classifiers and dense classifiers with a hand-written training loop."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Routes the subcommand; all work happens in `pipeline`.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Sequence(args) => pipeline::run_sequence(args),
            Commands::Dense(args)    => pipeline::run_dense(args),
            Commands::Evaluate(args) => pipeline::run_evaluate(args),
        }
    }
}
