//! Text normalization for task comparison.
//!
//! Two forms are produced from a piece of text:
//!
//! - [`clean`]: trims and collapses internal whitespace runs to a single
//!   space while preserving case. Used for candidate display text.
//! - [`comparison_key`]: [`clean`] followed by case-folding. Used solely for
//!   duplicate detection; display text is never replaced by it.
//!
//! Punctuation is not folded, so `"buy milk"` and
//! `"buy milk!"` are distinct keys.
//!
//! # Example
//!
//! ```
//! use yunie_tasks::utils::normalize::{clean, comparison_key};
//!
//! assert_eq!(clean("  Buy \t milk  "), "Buy milk");
//! assert_eq!(comparison_key("  Buy \t MILK "), "buy milk");
//! ```

/// Trims the text and collapses every whitespace run into one space.
#[must_use]
pub fn clean(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Returns the case-insensitive, whitespace-collapsed key for `text`.
#[must_use]
pub fn comparison_key(text: &str) -> String {
    clean(text).to_lowercase()
}

/// Returns `true` if the text contains at least one letter or digit.
///
/// Candidates failing this check (empty, or only punctuation and symbols)
/// are never treated as tasks.
#[must_use]
pub fn has_content(text: &str) -> bool {
    text.chars().any(char::is_alphanumeric)
}
