//! Task types shared by the board, the pipeline and the server.
//!
//! All types serialize to camelCase JSON.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a task, unique within the board that allocated it.
///
/// Ids increase monotonically and are never reused, even after the task
/// they named has been cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(u64);

impl TaskId {
    /// Returns the raw numeric value.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for TaskId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// Lifecycle state of a task.
///
/// The only transition is `Pending` to `Finished`; there is no way back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskStatus {
    /// Waiting to be done.
    Pending,
    /// Completed at `done_at`.
    Finished {
        #[serde(rename = "doneAt")]
        done_at: DateTime<Utc>,
    },
}

/// A single todo item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    id: TaskId,
    text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    due: Option<String>,
    #[serde(flatten)]
    status: TaskStatus,
}

impl Task {
    /// Creates a pending task. Only the board allocates tasks.
    pub(crate) fn pending(id: TaskId, text: String, due: Option<String>) -> Self {
        Self {
            id,
            text,
            due,
            status: TaskStatus::Pending,
        }
    }

    /// Moves the task to `Finished`. Already-finished tasks keep their
    /// original timestamp.
    pub(crate) fn finish(&mut self, done_at: DateTime<Utc>) {
        if self.status == TaskStatus::Pending {
            self.status = TaskStatus::Finished { done_at };
        }
    }

    #[must_use]
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// The display text, exactly as it was added (trimmed).
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn due(&self) -> Option<&str> {
        self.due.as_deref()
    }

    #[must_use]
    pub fn status(&self) -> TaskStatus {
        self.status
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self.status, TaskStatus::Finished { .. })
    }

    /// When the task was finished; `None` while pending.
    #[must_use]
    pub fn done_at(&self) -> Option<DateTime<Utc>> {
        match self.status {
            TaskStatus::Pending => None,
            TaskStatus::Finished { done_at } => Some(done_at),
        }
    }
}

/// Where a chat message came from.
///
/// Only user messages are eligible for the whole-message fallback capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageOrigin {
    /// Typed by the user.
    User,
    /// Written by the companion agent.
    Companion,
}

impl MessageOrigin {
    #[must_use]
    pub fn is_user(self) -> bool {
        self == Self::User
    }
}

/// Read-only copy of both task lists, handed to render hooks and API clients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    /// Pending tasks, oldest first.
    pub pending: Vec<Task>,
    /// Finished tasks, most recently finished first.
    pub finished: Vec<Task>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
    }

    #[test]
    fn pending_task_serializes_without_done_at() {
        let task = Task::pending(TaskId::from(3), "buy milk".to_string(), None);
        let json = serde_json::to_value(&task).unwrap();

        assert_eq!(json["id"], 3);
        assert_eq!(json["text"], "buy milk");
        assert_eq!(json["status"], "pending");
        assert!(json.get("doneAt").is_none());
        assert!(json.get("due").is_none());
    }

    #[test]
    fn finished_task_serializes_done_at() {
        let mut task = Task::pending(
            TaskId::from(1),
            "call mom".to_string(),
            Some("friday".to_string()),
        );
        task.finish(sample_time());

        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["status"], "finished");
        assert_eq!(json["doneAt"], "2026-01-15T10:00:00Z");
        assert_eq!(json["due"], "friday");
    }

    #[test]
    fn task_deserializes_from_camel_case() {
        let json = r#"{"id":7,"text":"walk dog","status":"finished","doneAt":"2026-01-15T10:00:00Z"}"#;
        let task: Task = serde_json::from_str(json).unwrap();

        assert_eq!(task.id(), TaskId::from(7));
        assert_eq!(task.done_at(), Some(sample_time()));
        assert!(task.due().is_none());
    }

    #[test]
    fn finish_is_one_way() {
        let mut task = Task::pending(TaskId::from(1), "x y".to_string(), None);
        assert!(!task.is_finished());
        assert!(task.done_at().is_none());

        task.finish(sample_time());
        let later = sample_time() + chrono::Duration::hours(1);
        task.finish(later);

        assert_eq!(task.done_at(), Some(sample_time()));
    }

    #[test]
    fn task_id_parses_and_displays() {
        let id: TaskId = " 42 ".parse().unwrap();
        assert_eq!(id.get(), 42);
        assert_eq!(id.to_string(), "42");
        assert!("abc".parse::<TaskId>().is_err());
    }

    #[test]
    fn message_origin_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&MessageOrigin::Companion).unwrap(),
            "\"companion\""
        );
        assert!(MessageOrigin::User.is_user());
        assert!(!MessageOrigin::Companion.is_user());
    }
}
