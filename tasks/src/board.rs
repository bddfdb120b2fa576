//! The todo board: authoritative pending and finished task lists.
//!
//! [`TodoBoard`] is the only thing that creates or mutates tasks. Every
//! mutating operation writes both lists through the attached
//! [`KeyValueStore`] (if any) and then calls the attached [`RenderHook`]
//! (if any) so a presentation layer can redraw from the board's state.
//!
//! # Task Lifecycle
//!
//! ```text
//! add_item ──► Pending ──complete_item──► Finished ──clear_finished──► (gone)
//! ```
//!
//! - Pending tasks are kept in insertion order, oldest first.
//! - Finished tasks are kept most-recently-finished first.
//! - A task's text must not match any task on either list once trimmed,
//!   whitespace-collapsed and case-folded.
//!
//! # Failure Semantics
//!
//! No operation returns an error. Empty text, duplicates and unknown ids
//! are reported as `None` / `false` and change nothing. Storage write
//! failures are logged and the in-memory mutation stands.
//!
//! # Example
//!
//! ```
//! use yunie_tasks::board::TodoBoard;
//!
//! let mut board = TodoBoard::new();
//! let task = board.add_item("Buy milk").unwrap();
//!
//! assert!(board.add_item("buy  MILK").is_none());
//! assert!(board.complete_item(task.id()));
//! assert_eq!(board.finished()[0].text(), "Buy milk");
//!
//! board.clear_finished();
//! assert!(board.finished().is_empty());
//! ```

use std::fmt;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::persistence::{self, KeyValueStore};
use crate::types::{BoardSnapshot, Task, TaskId};
use crate::utils::normalize::comparison_key;

/// Called after every mutation with the current lists.
///
/// Implemented for any `Fn(&[Task], &[Task]) + Send` closure, taking
/// `(pending, finished)`.
pub trait RenderHook: Send {
    fn render(&self, pending: &[Task], finished: &[Task]);
}

impl<F> RenderHook for F
where
    F: Fn(&[Task], &[Task]) + Send,
{
    fn render(&self, pending: &[Task], finished: &[Task]) {
        self(pending, finished);
    }
}

/// Pending and finished task lists with deduplication and persistence.
pub struct TodoBoard {
    pending: Vec<Task>,
    finished: Vec<Task>,
    next_id: u64,
    store: Option<Box<dyn KeyValueStore>>,
    render_hook: Option<Box<dyn RenderHook>>,
}

impl Default for TodoBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TodoBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TodoBoard")
            .field("pending", &self.pending)
            .field("finished", &self.finished)
            .field("next_id", &self.next_id)
            .field("store", &self.store.as_ref().map(|_| "<KeyValueStore>"))
            .field("render_hook", &self.render_hook.as_ref().map(|_| "<RenderHook>"))
            .finish()
    }
}

impl TodoBoard {
    /// Creates an empty board with no storage attached.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
            finished: Vec::new(),
            next_id: 1,
            store: None,
            render_hook: None,
        }
    }

    /// Creates an empty board that writes to `store` after each mutation.
    ///
    /// Existing content in the store is not read; use [`TodoBoard::restore`]
    /// for that.
    #[must_use]
    pub fn with_store(store: impl KeyValueStore + 'static) -> Self {
        Self {
            store: Some(Box::new(store)),
            ..Self::new()
        }
    }

    /// Creates a board from the lists persisted in `store`, then keeps
    /// writing to it.
    ///
    /// Stored entries receive fresh ids in stored order (pending first).
    /// The stored format has no completion time, so restored finished tasks
    /// are stamped with the time of the restore. Entries with empty text or
    /// duplicating an earlier entry are skipped.
    #[must_use]
    pub fn restore(store: impl KeyValueStore + 'static) -> Self {
        let (pending, finished) = persistence::load(&store);
        let mut board = Self::with_store(store);
        let restored_at = Utc::now();

        for record in pending {
            let Some(text) = board.admit(&record.text) else {
                warn!(text = %record.text, "Skipping invalid or duplicate stored task");
                continue;
            };
            let task = board.allocate(&text, record.due.as_deref());
            board.pending.push(task);
        }

        for record in finished {
            let Some(text) = board.admit(&record.text) else {
                warn!(text = %record.text, "Skipping invalid or duplicate stored task");
                continue;
            };
            let mut task = board.allocate(&text, record.due.as_deref());
            task.finish(restored_at);
            board.finished.push(task);
        }

        info!(
            pending = board.pending.len(),
            finished = board.finished.len(),
            "Restored task board"
        );
        board
    }

    /// Attaches a hook called after every mutation.
    #[must_use]
    pub fn with_render_hook(mut self, hook: impl RenderHook + 'static) -> Self {
        self.render_hook = Some(Box::new(hook));
        self
    }

    /// Replaces the render hook.
    pub fn set_render_hook(&mut self, hook: impl RenderHook + 'static) {
        self.render_hook = Some(Box::new(hook));
    }

    /// Adds a pending task.
    ///
    /// Returns `None` without changing anything if `text` is empty after
    /// trimming or duplicates an existing pending or finished task.
    pub fn add_item(&mut self, text: &str) -> Option<Task> {
        self.add_item_with_due(text, None)
    }

    /// Adds a pending task with an optional free-text due date.
    ///
    /// Same rules as [`TodoBoard::add_item`]; a blank due date is dropped.
    pub fn add_item_with_due(&mut self, text: &str, due: Option<&str>) -> Option<Task> {
        let text = self.admit(text)?;
        let task = self.allocate(&text, due);

        debug!(id = %task.id(), text = %task.text(), "Added task");
        self.pending.push(task.clone());
        self.changed();
        Some(task)
    }

    /// Moves pending task `id` to the front of the finished list.
    ///
    /// Returns `false` without changing anything if `id` is not pending.
    pub fn complete_item(&mut self, id: TaskId) -> bool {
        let Some(index) = self.pending.iter().position(|task| task.id() == id) else {
            debug!(id = %id, "Complete ignored: no pending task with this id");
            return false;
        };

        let mut task = self.pending.remove(index);
        task.finish(Utc::now());
        debug!(id = %id, text = %task.text(), "Completed task");
        self.finished.insert(0, task);
        self.changed();
        true
    }

    /// Empties the finished list, returning how many tasks were removed.
    pub fn clear_finished(&mut self) -> usize {
        let removed = self.finished.len();
        self.finished.clear();
        debug!(removed = removed, "Cleared finished tasks");
        self.changed();
        removed
    }

    /// Removes one finished task.
    ///
    /// Returns `false` without changing anything if `id` is not finished.
    pub fn remove_finished(&mut self, id: TaskId) -> bool {
        let Some(index) = self.finished.iter().position(|task| task.id() == id) else {
            return false;
        };

        let task = self.finished.remove(index);
        debug!(id = %id, text = %task.text(), "Removed finished task");
        self.changed();
        true
    }

    /// Returns `true` if a pending or finished task has the same text once
    /// trimmed, whitespace-collapsed and case-folded.
    #[must_use]
    pub fn exists(&self, text: &str) -> bool {
        let key = comparison_key(text);
        self.pending
            .iter()
            .chain(&self.finished)
            .any(|task| comparison_key(task.text()) == key)
    }

    /// Pending tasks, oldest first.
    #[must_use]
    pub fn pending(&self) -> &[Task] {
        &self.pending
    }

    /// Finished tasks, most recently finished first.
    #[must_use]
    pub fn finished(&self) -> &[Task] {
        &self.finished
    }

    /// Looks up a task on either list.
    #[must_use]
    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.pending
            .iter()
            .chain(&self.finished)
            .find(|task| task.id() == id)
    }

    /// Total number of tasks on both lists.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len() + self.finished.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.finished.is_empty()
    }

    /// Copies both lists.
    #[must_use]
    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            pending: self.pending.clone(),
            finished: self.finished.clone(),
        }
    }

    /// Returns the trimmed text if it may become a new task.
    fn admit(&self, text: &str) -> Option<String> {
        let text = text.trim();
        if text.is_empty() {
            debug!("Add ignored: empty text");
            return None;
        }
        if self.exists(text) {
            debug!(text = %text, "Add ignored: duplicate of an existing task");
            return None;
        }
        Some(text.to_string())
    }

    fn allocate(&mut self, text: &str, due: Option<&str>) -> Task {
        let id = TaskId::from(self.next_id);
        self.next_id += 1;
        let due = due.map(str::trim).filter(|d| !d.is_empty()).map(str::to_string);
        Task::pending(id, text.to_string(), due)
    }

    /// Persists and notifies after a mutation.
    fn changed(&mut self) {
        if let Some(store) = self.store.as_deref_mut() {
            if let Err(err) = persistence::save(store, &self.pending, &self.finished) {
                warn!(error = %err, "Failed to persist task lists");
            }
        }
        if let Some(hook) = &self.render_hook {
            hook.render(&self.pending, &self.finished);
        }
    }
}
