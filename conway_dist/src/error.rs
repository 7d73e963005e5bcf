use thiserror::Error;

use crate::io::IoError;
use crate::params::ParamsError;

/// Fatal failures of a run. Nothing here is retried.
#[derive(Debug, Error)]
pub enum GolError {
    #[error(transparent)]
    Params(#[from] ParamsError),
    #[error(transparent)]
    Io(#[from] IoError),
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error("a worker stopped before its band was finished")]
    WorkerLost,
}
