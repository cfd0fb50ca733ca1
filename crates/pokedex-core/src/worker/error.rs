use thiserror::Error;

use crate::cache::CacheError;

use super::WorkerState;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Install failed: {0}")]
    InstallFailed(String),

    #[error("Worker is {found:?}, expected {expected:?}")]
    InvalidState {
        expected: WorkerState,
        found: WorkerState,
    },

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Client not found: {0}")]
    ClientNotFound(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Worker is no longer running")]
    Closed,
}
