//! Yunie Tasks - todo capture from companion conversations.
//!
//! This crate turns free-text chat into a persistent todo list. Messages are
//! scanned for list items and `TODO:` markers (or, for plain user statements,
//! taken whole), filtered against what was already captured in the current
//! conversation, and added to a board that tracks pending and finished tasks.
//!
//! # Modules
//!
//! - [`extractor`]: Candidate task extraction from a single message
//! - [`session`]: Conversation-scoped duplicate suppression
//! - [`board`]: Pending/finished task lists, the only task mutator
//! - [`persistence`]: Key-value storage of the task lists
//! - [`pipeline`]: Extractor, session guard and board wired together
//! - [`types`]: Task types shared with the server
//! - [`config`]: Configuration from environment variables
//! - [`error`]: Error types for store setup
//! - [`utils`]: Text normalization
//!
//! # Example
//!
//! ```
//! use yunie_tasks::{MessageOrigin, TaskPipeline, TodoBoard};
//!
//! let mut pipeline = TaskPipeline::new(TodoBoard::new());
//! let added = pipeline.ingest("1) call mom\n2. email boss", MessageOrigin::Companion);
//!
//! assert_eq!(added.len(), 2);
//! assert_eq!(pipeline.board().pending()[0].text(), "call mom");
//! ```

use std::fs;

pub mod board;
pub mod config;
pub mod error;
pub mod extractor;
pub mod persistence;
pub mod pipeline;
pub mod session;
pub mod types;
pub mod utils;

pub use board::{RenderHook, TodoBoard};
pub use config::Config;
pub use error::{Result, TasksError};
pub use extractor::{extract, MatcherKind, TaskExtractor};
pub use persistence::{FileStore, KeyValueStore, MemoryStore, StorageError, TaskRecord};
pub use pipeline::TaskPipeline;
pub use session::SessionGuard;
pub use types::{BoardSnapshot, MessageOrigin, Task, TaskId, TaskStatus};

/// Opens the board persisted in the configured data directory.
///
/// The directory is created if missing. Storage that exists but cannot be
/// read is reported here; malformed content is not an error and yields an
/// empty list.
///
/// # Errors
///
/// Returns `TasksError` if the data directory cannot be created or the
/// stored lists cannot be read.
pub fn open_board(config: &Config) -> Result<TodoBoard> {
    fs::create_dir_all(&config.data_dir)?;

    let store = config.file_store();
    store.get(persistence::PENDING_KEY)?;
    store.get(persistence::FINISHED_KEY)?;

    Ok(TodoBoard::restore(store))
}
