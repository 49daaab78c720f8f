//! Error types surfaced by the trial runner.
use std::path::PathBuf;

use thiserror::Error;

use sim_core::SetupError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Setup(#[from] SetupError),

    #[error("failed to parse runner config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("invalid runner config: {0}")]
    InvalidConfig(String),

    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build trial thread pool")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("trial {trial} aborted: {message}")]
    TrialAborted { trial: u64, message: String },
}
