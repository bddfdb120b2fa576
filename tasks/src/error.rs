//! Error types for Yunie tasks.
//!
//! Task operations themselves never fail (see [`crate::board`]); these
//! errors cover opening the store the board runs on. Configuration errors
//! are reported separately as [`crate::config::ConfigError`].

use thiserror::Error;

use crate::persistence::StorageError;

/// Errors that can occur while opening a task store.
#[derive(Error, Debug)]
pub enum TasksError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized `Result` type for task setup operations.
pub type Result<T> = std::result::Result<T, TasksError>;
