pub mod epoch_stats;
pub mod loop_fn;
pub mod report;
pub mod step;
pub mod train_config;

pub use epoch_stats::{EpochStats, History};
pub use loop_fn::{evaluate, train_loop, Evaluation};
pub use report::Phase;
pub use step::{eval_step, train_step, StepOutput};
pub use train_config::TrainConfig;
