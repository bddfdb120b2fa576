//! Chat completions client for companion replies.
//!
//! [`ChatClient`] sends one user message, framed by the companion
//! [`SYSTEM_PROMPT`], to an OpenAI-compatible `/chat/completions` endpoint
//! and returns the reply text.
//!
//! # Error Mapping
//!
//! | Failure | Error |
//! |---------|-------|
//! | No API key configured | [`ChatError::MissingApiKey`] |
//! | Non-2xx status | [`ChatError::Upstream`] with the upstream `error.message` |
//! | Timeout | [`ChatError::Timeout`] |
//! | Connection or transport failure | [`ChatError::Unavailable`] |
//! | Unparseable success body | [`ChatError::InvalidResponse`] |

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;

/// Timeout for a single completion request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Reply used when the upstream answers without any content.
pub const EMPTY_REPLY: &str = "(no response)";

/// System prompt framing every companion reply.
pub const SYSTEM_PROMPT: &str = "you are yunie, a gentle lowercase ai companion. keep replies soft, warm, lowercase, and conversational. avoid sounding robotic or overly formal.";

/// Errors that can occur when requesting a companion reply.
#[derive(Debug, Error)]
pub enum ChatError {
    /// No API key is configured.
    #[error("missing OPENAI_API_KEY")]
    MissingApiKey,

    /// The upstream answered with a non-success status.
    #[error("{message}")]
    Upstream {
        /// HTTP status returned by the upstream.
        status: u16,
        /// Upstream `error.message`, or a generic description.
        message: String,
    },

    /// The request timed out.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The upstream is unreachable.
    #[error("chat api unavailable: {0}")]
    Unavailable(String),

    /// The success response could not be parsed.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The HTTP client could not be built.
    #[error("client configuration error: {0}")]
    Configuration(String),
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpstreamErrorBody {
    error: Option<UpstreamErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct UpstreamErrorDetail {
    message: Option<String>,
}

/// Client for an OpenAI-compatible chat completions API.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone)]
pub struct ChatClient {
    http_client: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl ChatClient {
    /// Creates a new chat client.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Configuration`] if the HTTP client cannot be created.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
    ) -> Result<Self, ChatError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();

        let http_client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ChatError::Configuration(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            base_url,
            api_key: api_key.into(),
            model: model.into(),
            temperature,
        })
    }

    /// Creates a client from server configuration.
    ///
    /// Returns `Ok(None)` when no API key is configured.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Configuration`] if the HTTP client cannot be created.
    pub fn from_config(config: &Config) -> Result<Option<Self>, ChatError> {
        config
            .openai_api_key
            .as_deref()
            .map(|key| Self::new(&config.openai_url, key, &config.model, config.temperature))
            .transpose()
    }

    /// Returns the base URL this client talks to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the model requested for replies.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Requests a companion reply to `message`.
    ///
    /// The reply is the first choice's content, trimmed; an absent or blank
    /// reply becomes [`EMPTY_REPLY`].
    ///
    /// # Errors
    ///
    /// See the module docs for how failures map to [`ChatError`].
    pub async fn complete(&self, message: &str) -> Result<String, ChatError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = CompletionRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: message,
                },
            ],
            temperature: self.temperature,
        };

        debug!(url = %url, model = %self.model, "Requesting companion reply");

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ChatError::Timeout(REQUEST_TIMEOUT)
                } else if e.is_connect() {
                    ChatError::Unavailable(format!("connection failed: {e}"))
                } else {
                    ChatError::Unavailable(format!("request failed: {e}"))
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<UpstreamErrorBody>(&body)
                .ok()
                .and_then(|b| b.error)
                .and_then(|e| e.message)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| format!("openai request failed ({})", status.as_u16()));

            warn!(status = %status, error = %message, "Chat API returned an error");
            return Err(ChatError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let completion: CompletionResponse = response.json().await.map_err(|e| {
            ChatError::InvalidResponse(format!("failed to parse completion response: {e}"))
        })?;

        let reply = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .unwrap_or_else(|| EMPTY_REPLY.to_string());

        debug!(reply_len = reply.len(), "Received companion reply");
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Helper to create a test client pointing to a mock server.
    fn create_test_client(mock_server: &MockServer) -> ChatClient {
        ChatClient::new(mock_server.uri(), "test-key", "gpt-4o-mini", 0.8)
            .expect("failed to create test client")
    }

    fn completion(content: serde_json::Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": content } }]
        }))
    }

    // ==================== ChatClient::new tests ====================

    #[test]
    fn new_trims_trailing_slashes_from_url() {
        let client = ChatClient::new("https://api.example.com/v1//", "key", "m", 0.5)
            .expect("should create client");
        assert_eq!(client.base_url(), "https://api.example.com/v1");
        assert_eq!(client.model(), "m");
    }

    #[test]
    fn debug_redacts_api_key() {
        let client = ChatClient::new("https://api.example.com", "sk-secret", "m", 0.5)
            .expect("should create client");
        assert!(!format!("{client:?}").contains("sk-secret"));
    }

    // ==================== complete tests ====================

    #[tokio::test]
    async fn complete_sends_prompt_and_returns_trimmed_reply() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4o-mini",
                "temperature": 0.8,
                "messages": [
                    { "role": "system", "content": SYSTEM_PROMPT },
                    { "role": "user", "content": "i need to call mom" }
                ]
            })))
            .respond_with(completion(serde_json::json!("  of course, want a reminder?  ")))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let reply = client.complete("i need to call mom").await.unwrap();

        assert_eq!(reply, "of course, want a reminder?");
    }

    #[tokio::test]
    async fn complete_returns_placeholder_for_empty_content() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(completion(serde_json::json!("   ")))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        assert_eq!(client.complete("hi").await.unwrap(), EMPTY_REPLY);
    }

    #[tokio::test]
    async fn complete_returns_placeholder_for_missing_choices() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        assert_eq!(client.complete("hi").await.unwrap(), EMPTY_REPLY);
    }

    #[tokio::test]
    async fn complete_passes_through_upstream_error_message() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": { "message": "Incorrect API key provided", "type": "invalid_request_error" }
            })))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let err = client.complete("hi").await.unwrap_err();

        match err {
            ChatError::Upstream { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Incorrect API key provided");
            }
            other => panic!("expected Upstream, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn complete_uses_generic_message_without_error_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let err = client.complete("hi").await.unwrap_err();

        assert!(matches!(err, ChatError::Upstream { status: 503, .. }));
        assert_eq!(err.to_string(), "openai request failed (503)");
    }

    #[tokio::test]
    async fn complete_rejects_malformed_success_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let err = client.complete("hi").await.unwrap_err();
        assert!(matches!(err, ChatError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn complete_reports_unreachable_upstream() {
        // Port 1 is reserved and nothing listens there.
        let client = ChatClient::new("http://127.0.0.1:1", "key", "m", 0.8).unwrap();
        let err = client.complete("hi").await.unwrap_err();
        assert!(matches!(err, ChatError::Unavailable(_)));
    }
}
