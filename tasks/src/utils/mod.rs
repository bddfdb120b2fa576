//! Utility modules for Yunie tasks.
//!
//! # Modules
//!
//! - [`normalize`]: Whitespace collapsing and case-folding for comparison keys

pub mod normalize;

pub use normalize::{clean, comparison_key, has_content};
