//! Error types for neondo

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A field value or combination of values violates a task invariant.
    #[error("{0}")]
    Validation(String),

    #[error("Task {0} not found.")]
    NotFound(u64),

    /// A task number that does not exist in the currently visible rows.
    #[error("Task number {0} not found in current view.")]
    NotInView(usize),

    /// Malformed command line; the message carries a usage hint.
    #[error("{0}")]
    Usage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Error::Usage(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
