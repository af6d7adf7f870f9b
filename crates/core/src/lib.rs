pub mod config;
pub mod error;

pub use config::RunnerConfig;
pub use error::{RunnerError, RunnerResult};
