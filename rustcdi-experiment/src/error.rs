//! Error types for rustcdi-experiment.

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

use crate::stages::StageKind;

/// Result type alias for experiment operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Experiment error types.
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] rustcdi_config::Error),

    /// The directory does not hold an experiment.
    #[error("not an experiment directory (missing conf/config): {}", .0.display())]
    NotAnExperiment(PathBuf),

    /// Experiment id was empty.
    #[error("experiment id must not be empty")]
    EmptyId,

    /// Alternate reconstruction configuration id collision.
    #[error("reconstruction configuration '{0}' already exists")]
    RecIdInUse(String),

    /// A stage was launched before its input data exists.
    #[error("stage {stage} is not ready: {requirement}")]
    StageNotReady {
        /// Stage that was launched.
        stage: StageKind,
        /// What the stage is waiting for.
        requirement: &'static str,
    },

    /// A stage program could not be started.
    #[error("cannot launch stage {stage} ({program}): {source}")]
    StageSpawn {
        /// Stage that was launched.
        stage: StageKind,
        /// Program that failed to start.
        program: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A stage program exited with a failure status.
    #[error("stage {stage} ({program}) exited with {status}")]
    StageFailed {
        /// Stage that failed.
        stage: StageKind,
        /// Program that ran.
        program: String,
        /// Its exit status.
        status: ExitStatus,
    },

    /// Malformed toolchain description file.
    #[error("invalid toolchain file {}: {source}", .path.display())]
    Toolchain {
        /// File that failed to parse.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
}
