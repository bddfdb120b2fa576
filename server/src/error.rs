//! Error types for the Yunie server.
//!
//! # Error Types
//!
//! - [`ConfigError`] - Configuration-related errors (missing values, parse failures)
//! - [`ServerError`] - Request-level errors, rendered as JSON by [`IntoResponse`]
//!
//! Upstream chat failures are [`ChatError`]s, defined beside the client in
//! [`crate::openai`] and wrapped by [`ServerError::Chat`].
//!
//! # Response Body
//!
//! Every error response carries a single-field JSON body:
//!
//! ```json
//! { "error": "duplicate or empty task" }
//! ```

use std::error::Error;
use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error as ThisError;
use tracing::{error, warn};

use crate::openai::ChatError;

/// Body returned to clients when a chat call fails for a reason other than
/// an upstream error status.
pub const CHAT_FAILURE_MESSAGE: &str = "server error calling openai";

/// Errors that occur during configuration loading and validation.
#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required configuration value is missing.
    #[error("missing required configuration: {0}")]
    Missing(String),

    /// A configuration value failed to parse or is invalid.
    #[error("invalid configuration value for '{key}': {reason}")]
    Invalid {
        /// The configuration key that has an invalid value.
        key: String,
        /// Description of why the value is invalid.
        reason: String,
    },
}

impl ConfigError {
    /// Creates a new missing configuration error.
    ///
    /// # Example
    ///
    /// ```rust
    /// use yunie_server::error::ConfigError;
    ///
    /// let err = ConfigError::missing("OPENAI_API_KEY");
    /// assert!(matches!(err, ConfigError::Missing(_)));
    /// ```
    pub fn missing(key: impl Into<String>) -> Self {
        Self::Missing(key.into())
    }

    /// Creates a new invalid configuration error.
    ///
    /// # Example
    ///
    /// ```rust
    /// use yunie_server::error::ConfigError;
    ///
    /// let err = ConfigError::invalid("PORT", "must be a number between 0 and 65535");
    /// assert!(matches!(err, ConfigError::Invalid { .. }));
    /// ```
    pub fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

impl From<yunie_tasks::config::ConfigError> for ConfigError {
    fn from(err: yunie_tasks::config::ConfigError) -> Self {
        use yunie_tasks::config::{ConfigError as TasksConfigError, DATA_DIR_VAR};

        match err {
            TasksConfigError::InvalidValue { key, message } => Self::invalid(key, message),
            TasksConfigError::NoHomeDirectory => {
                Self::missing(format!("{DATA_DIR_VAR} (no home directory to default to)"))
            }
        }
    }
}

/// Request-level error type for the Yunie server.
///
/// Each variant maps to one HTTP status in its [`IntoResponse`] impl.
#[derive(Debug)]
pub enum ServerError {
    /// Malformed or incomplete request (400).
    Validation(String),

    /// The addressed task does not exist in the expected state (404).
    NotFound(String),

    /// The request would violate a board invariant (409).
    Conflict(String),

    /// The upstream chat call failed.
    Chat(ChatError),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(msg) => write!(f, "validation error: {msg}"),
            Self::NotFound(msg) => write!(f, "not found: {msg}"),
            Self::Conflict(msg) => write!(f, "conflict: {msg}"),
            Self::Chat(err) => write!(f, "chat error: {err}"),
        }
    }
}

impl Error for ServerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Chat(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ChatError> for ServerError {
    fn from(err: ChatError) -> Self {
        Self::Chat(err)
    }
}

impl ServerError {
    /// Creates a new validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a new not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Creates a new conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// HTTP status for this error.
    ///
    /// Upstream error statuses are passed through unchanged; every other
    /// chat failure is a 500.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Chat(ChatError::Upstream { status, .. }) => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Self::Chat(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message placed in the response body.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            Self::Validation(msg) | Self::NotFound(msg) | Self::Conflict(msg) => msg.clone(),
            Self::Chat(ChatError::MissingApiKey) => ChatError::MissingApiKey.to_string(),
            Self::Chat(ChatError::Upstream { message, .. }) => message.clone(),
            Self::Chat(_) => CHAT_FAILURE_MESSAGE.to_string(),
        }
    }
}

/// JSON error response body.
#[derive(Debug, Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: String,
}

impl ErrorResponse {
    pub(crate) fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = %status, error = %self, "Request failed");
        } else {
            warn!(status = %status, error = %self, "Request rejected");
        }

        (status, Json(ErrorResponse::new(self.client_message()))).into_response()
    }
}

/// A specialized Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn config_error_missing_displays_correctly() {
        let err = ConfigError::missing("OPENAI_API_KEY");
        assert_eq!(
            err.to_string(),
            "missing required configuration: OPENAI_API_KEY"
        );
    }

    #[test]
    fn config_error_invalid_displays_correctly() {
        let err = ConfigError::invalid("PORT", "must be a positive integer");
        assert_eq!(
            err.to_string(),
            "invalid configuration value for 'PORT': must be a positive integer"
        );
    }

    #[test]
    fn tasks_config_error_converts() {
        let err: ConfigError = yunie_tasks::config::ConfigError::InvalidValue {
            key: "YUNIE_DATA_DIR".to_string(),
            message: "data directory cannot be empty".to_string(),
        }
        .into();
        assert_eq!(
            err,
            ConfigError::invalid("YUNIE_DATA_DIR", "data directory cannot be empty")
        );

        let err: ConfigError = yunie_tasks::config::ConfigError::NoHomeDirectory.into();
        assert!(matches!(err, ConfigError::Missing(ref key) if key.starts_with("YUNIE_DATA_DIR")));
    }

    #[test]
    fn statuses_match_variants() {
        assert_eq!(ServerError::validation("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(ServerError::not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(ServerError::conflict("x").status(), StatusCode::CONFLICT);
        assert_eq!(
            ServerError::Chat(ChatError::MissingApiKey).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn upstream_status_passes_through() {
        let err = ServerError::Chat(ChatError::Upstream {
            status: 429,
            message: "rate limit reached".to_string(),
        });
        assert_eq!(err.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.client_message(), "rate limit reached");
    }

    #[test]
    fn transport_failures_use_generic_message() {
        let err = ServerError::Chat(ChatError::Timeout(Duration::from_secs(30)));
        assert_eq!(err.client_message(), CHAT_FAILURE_MESSAGE);

        let err = ServerError::Chat(ChatError::InvalidResponse("eof".to_string()));
        assert_eq!(err.client_message(), CHAT_FAILURE_MESSAGE);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn missing_api_key_message() {
        let err = ServerError::from(ChatError::MissingApiKey);
        assert_eq!(err.client_message(), "missing OPENAI_API_KEY");
    }

    #[test]
    fn server_error_source_returns_chat_error() {
        let server_err = ServerError::from(ChatError::MissingApiKey);
        assert_eq!(
            server_err.source().unwrap().to_string(),
            "missing OPENAI_API_KEY"
        );

        assert!(ServerError::validation("test").source().is_none());
        assert!(ServerError::not_found("test").source().is_none());
    }

    #[tokio::test]
    async fn into_response_renders_json_body() {
        let response = ServerError::conflict("duplicate or empty task").into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], br#"{"error":"duplicate or empty task"}"#);
    }
}
