//! Yunie Server - Companion chat relay and todo API.
//!
//! This crate provides the HTTP front end of Yunie, responsible for:
//! - Relaying chat messages to an OpenAI-compatible completions API
//! - Capturing tasks from both sides of the conversation
//! - Exposing the todo board for manual edits
//!
//! # Architecture
//!
//! The server owns a single [`yunie_tasks::TaskPipeline`] for its lifetime,
//! so the whole process is one conversation as far as duplicate suppression
//! is concerned. The board persists to the configured data directory.

pub mod config;
pub mod error;
pub mod openai;
pub mod routes;
