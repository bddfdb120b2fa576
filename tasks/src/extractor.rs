//! Task extraction from free-form chat messages.
//!
//! The extractor turns one message into zero or more candidate task strings.
//! It never touches state: the same input always yields the same output.
//!
//! # Structured Matchers
//!
//! Matchers run in a fixed order over the whole message:
//!
//! | Matcher | Shape | Example |
//! |---------|-------|---------|
//! | [`MatcherKind::Bullet`] | `- text`, `* [ ] text`, `• [x] text` | `- buy milk` |
//! | [`MatcherKind::Numbered`] | `<digits>. text` or `<digits>) text` | `2) email boss` |
//! | [`MatcherKind::TodoMarker`] | `TODO: text` / `todo - text` anywhere in a line | `TODO: finish report` |
//!
//! Bullet and numbered matchers work per line, so every line of a multi-line
//! message is scanned. Captures are cleaned (trimmed, whitespace collapsed,
//! case kept) and merged case-insensitively in first-seen order.
//!
//! # Fallback
//!
//! When no structured candidate exists, a user message of more than one word
//! that does not end in `?` is taken whole as a single candidate. Companion
//! messages never use the fallback, and structured candidates are never
//! supplemented by it.
//!
//! # Example
//!
//! ```
//! use yunie_tasks::extractor::TaskExtractor;
//! use yunie_tasks::types::MessageOrigin;
//!
//! let extractor = TaskExtractor::new();
//!
//! let found = extractor.extract("- buy milk\n- walk dog", MessageOrigin::Companion);
//! assert_eq!(found, vec!["buy milk", "walk dog"]);
//!
//! let found = extractor.extract("buy groceries", MessageOrigin::User);
//! assert_eq!(found, vec!["buy groceries"]);
//!
//! let found = extractor.extract("are you free tomorrow?", MessageOrigin::User);
//! assert!(found.is_empty());
//! ```

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, trace};

use crate::types::MessageOrigin;
use crate::utils::normalize::{clean, comparison_key, has_content};

static BULLET_PATTERN: OnceLock<Regex> = OnceLock::new();
static NUMBERED_PATTERN: OnceLock<Regex> = OnceLock::new();
static TODO_PATTERN: OnceLock<Regex> = OnceLock::new();

fn bullet_pattern() -> &'static Regex {
    BULLET_PATTERN.get_or_init(|| {
        Regex::new(r"(?m)^[ \t]*[-*•–][ \t]*(?:\[[ \t]?[xX ]\][ \t]*)?(.+)$")
            .expect("bullet pattern is valid")
    })
}

fn numbered_pattern() -> &'static Regex {
    NUMBERED_PATTERN.get_or_init(|| {
        Regex::new(r"(?m)^[ \t]*\d+[.)][ \t]+(.+)$").expect("numbered pattern is valid")
    })
}

fn todo_pattern() -> &'static Regex {
    TODO_PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\bTODO[ \t]*[:\-][ \t]*([^\r\n]+)").expect("todo pattern is valid")
    })
}

/// One of the structured matchers, in the order they are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatcherKind {
    /// Dash, asterisk, bullet or en-dash lines, with an optional checkbox.
    Bullet,
    /// Lines starting with a number followed by `.` or `)`.
    Numbered,
    /// Inline `TODO:` / `TODO -` markers.
    TodoMarker,
}

impl MatcherKind {
    /// All matchers in application order.
    pub const ALL: [MatcherKind; 3] = [
        MatcherKind::Bullet,
        MatcherKind::Numbered,
        MatcherKind::TodoMarker,
    ];

    fn pattern(self) -> &'static Regex {
        match self {
            MatcherKind::Bullet => bullet_pattern(),
            MatcherKind::Numbered => numbered_pattern(),
            MatcherKind::TodoMarker => todo_pattern(),
        }
    }

    /// Runs this matcher over `text`, returning cleaned, non-empty captures
    /// in the order they appear.
    #[must_use]
    pub fn find_all(self, text: &str) -> Vec<String> {
        self.pattern()
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| clean(m.as_str()))
            .filter(|candidate| has_content(candidate))
            .collect()
    }
}

/// Extracts candidate tasks from chat messages.
#[derive(Debug, Clone)]
pub struct TaskExtractor {
    matchers: Vec<MatcherKind>,
}

impl Default for TaskExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskExtractor {
    /// Creates an extractor using every structured matcher.
    #[must_use]
    pub fn new() -> Self {
        Self {
            matchers: MatcherKind::ALL.to_vec(),
        }
    }

    /// Creates an extractor restricted to the given matchers, applied in the
    /// given order.
    #[must_use]
    pub fn with_matchers(matchers: impl IntoIterator<Item = MatcherKind>) -> Self {
        Self {
            matchers: matchers.into_iter().collect(),
        }
    }

    /// Returns the candidate tasks found in `text`.
    ///
    /// Structured candidates are returned when any exist; otherwise the
    /// whole-message fallback applies (see [`fallback_candidate`]).
    #[must_use]
    pub fn extract(&self, text: &str, origin: MessageOrigin) -> Vec<String> {
        let structured = self.extract_structured(text);

        if structured.is_empty() {
            let fallback: Vec<String> = fallback_candidate(text, origin).into_iter().collect();
            if !fallback.is_empty() {
                debug!(origin = ?origin, "Using whole-message fallback candidate");
            }
            fallback
        } else {
            debug!(
                origin = ?origin,
                count = structured.len(),
                "Extracted structured candidates"
            );
            structured
        }
    }

    /// Runs the structured matchers only, merging their captures
    /// case-insensitively in first-seen order.
    #[must_use]
    pub fn extract_structured(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let mut seen = HashSet::new();
        let mut candidates = Vec::new();

        for matcher in &self.matchers {
            for candidate in matcher.find_all(text) {
                if seen.insert(comparison_key(&candidate)) {
                    trace!(matcher = ?matcher, candidate = %candidate, "Matched candidate");
                    candidates.push(candidate);
                }
            }
        }

        candidates
    }
}

/// Returns the whole trimmed message as a candidate when it qualifies for
/// the fallback rule: the message came from the user, has more than one
/// whitespace-separated token and does not end with `?`.
///
/// This does not look at structured matches; [`TaskExtractor::extract`]
/// only consults it when there are none.
#[must_use]
pub fn fallback_candidate(text: &str, origin: MessageOrigin) -> Option<String> {
    let trimmed = text.trim();

    if !origin.is_user() || trimmed.ends_with('?') {
        return None;
    }

    if trimmed.split_whitespace().nth(1).is_none() {
        return None;
    }

    Some(trimmed.to_string())
}

/// Extracts candidates with the default extractor.
#[must_use]
pub fn extract(text: &str, origin: MessageOrigin) -> Vec<String> {
    TaskExtractor::new().extract(text, origin)
}
