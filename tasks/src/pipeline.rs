//! Chat message intake: extractor, session guard and board wired together.
//!
//! [`TaskPipeline::ingest`] runs one message through the capture path:
//!
//! ```text
//! message ──► TaskExtractor ──► SessionGuard::emit_if_new ──► TodoBoard::add_item
//! ```
//!
//! Manual operations go to [`TaskPipeline::board_mut`] directly and bypass
//! both extraction and the session guard.

use tracing::{debug, info};

use crate::board::TodoBoard;
use crate::extractor::TaskExtractor;
use crate::session::SessionGuard;
use crate::types::{MessageOrigin, Task};

/// Captures tasks from a running conversation into a board.
#[derive(Debug, Default)]
pub struct TaskPipeline {
    extractor: TaskExtractor,
    guard: SessionGuard,
    board: TodoBoard,
}

impl TaskPipeline {
    /// Creates a pipeline feeding `board`, starting a new conversation.
    #[must_use]
    pub fn new(board: TodoBoard) -> Self {
        Self {
            extractor: TaskExtractor::new(),
            guard: SessionGuard::new(),
            board,
        }
    }

    /// Replaces the extractor.
    #[must_use]
    pub fn with_extractor(mut self, extractor: TaskExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Extracts candidates from `text` and adds the ones not yet seen in
    /// this conversation, returning the tasks actually created.
    ///
    /// A candidate passed by the session guard can still be rejected by the
    /// board (for example when the user added the same task by hand); it
    /// stays recorded in the guard either way.
    pub fn ingest(&mut self, text: &str, origin: MessageOrigin) -> Vec<Task> {
        let candidates = self.extractor.extract(text, origin);
        let mut added = Vec::new();

        for candidate in candidates {
            if !self.guard.emit_if_new(&candidate) {
                continue;
            }
            match self.board.add_item(&candidate) {
                Some(task) => added.push(task),
                None => debug!(candidate = %candidate, "Board rejected candidate"),
            }
        }

        if !added.is_empty() {
            info!(origin = ?origin, count = added.len(), "Captured tasks from message");
        }
        added
    }

    /// Starts a new conversation: the session guard forgets every candidate.
    /// The board is untouched.
    pub fn reset_session(&mut self) {
        self.guard.reset();
    }

    #[must_use]
    pub fn extractor(&self) -> &TaskExtractor {
        &self.extractor
    }

    #[must_use]
    pub fn session(&self) -> &SessionGuard {
        &self.guard
    }

    #[must_use]
    pub fn board(&self) -> &TodoBoard {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut TodoBoard {
        &mut self.board
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use MessageOrigin::{Companion, User};

    fn texts(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(Task::text).collect()
    }

    #[test]
    fn ingest_adds_structured_candidates() {
        let mut pipeline = TaskPipeline::default();
        let added = pipeline.ingest("sure! here's a plan:\n- buy milk\n- walk dog", Companion);

        assert_eq!(texts(&added), vec!["buy milk", "walk dog"]);
        assert_eq!(texts(pipeline.board().pending()), vec!["buy milk", "walk dog"]);
    }

    #[test]
    fn ingest_uses_fallback_for_user_statements() {
        let mut pipeline = TaskPipeline::default();
        let added = pipeline.ingest("buy milk before 5", User);
        assert_eq!(texts(&added), vec!["buy milk before 5"]);
    }

    #[test]
    fn ingest_ignores_questions_and_greetings() {
        let mut pipeline = TaskPipeline::default();
        assert!(pipeline.ingest("hi", User).is_empty());
        assert!(pipeline.ingest("how are you today?", User).is_empty());
        assert!(pipeline.board().is_empty());
    }

    #[test]
    fn session_guard_blocks_repeat_after_clear() {
        let mut pipeline = TaskPipeline::default();
        let added = pipeline.ingest("TODO: finish report", Companion);
        let id = added[0].id();

        pipeline.board_mut().complete_item(id);
        pipeline.board_mut().clear_finished();

        assert!(pipeline.ingest("TODO: Finish Report", Companion).is_empty());
        assert!(pipeline.board().is_empty());
    }

    #[test]
    fn manual_add_bypasses_session_guard() {
        let mut pipeline = TaskPipeline::default();
        let added = pipeline.ingest("- pay rent", Companion);
        pipeline.board_mut().complete_item(added[0].id());
        pipeline.board_mut().clear_finished();

        assert!(pipeline.board_mut().add_item("pay rent").is_some());
    }

    #[test]
    fn candidate_rejected_by_board_is_still_recorded_in_session() {
        let mut pipeline = TaskPipeline::default();
        pipeline.board_mut().add_item("water plants").unwrap();

        assert!(pipeline.ingest("- water plants", Companion).is_empty());
        assert!(pipeline.session().has_seen("water plants"));
    }

    #[test]
    fn reset_session_allows_recapture() {
        let mut pipeline = TaskPipeline::default();
        let added = pipeline.ingest("- stretch", Companion);
        pipeline.board_mut().complete_item(added[0].id());
        pipeline.board_mut().clear_finished();

        pipeline.reset_session();
        assert_eq!(texts(&pipeline.ingest("- stretch", Companion)), vec!["stretch"]);
    }
}
