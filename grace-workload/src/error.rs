use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkloadError {
    #[error("failed to read script {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: unknown instruction {found:?}")]
    UnknownInstruction { line: usize, found: String },

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("thread count must be at least 1, got {0}")]
    InvalidThreadCount(usize),
}

pub type Result<T> = std::result::Result<T, WorkloadError>;
