//! HTTP route handlers for the Yunie server.
//!
//! This module provides the HTTP API endpoints:
//!
//! - `POST /chat` - Relay a message to the companion and capture tasks
//! - `GET /todos` - Both task lists
//! - `POST /todos` - Add a task by hand
//! - `POST /todos/{id}/complete` - Finish a pending task
//! - `DELETE /finished` - Clear the finished list
//! - `DELETE /finished/{id}` - Remove one finished task
//! - `GET /health` - Health check endpoint
//!
//! # Architecture
//!
//! All routes share application state through [`AppState`], which contains:
//! - Configuration
//! - The task pipeline behind an async mutex
//! - The chat client, if an API key is configured
//! - Server start time for uptime reporting
//!
//! The pipeline lock is never held across the upstream chat call, so task
//! routes stay responsive while a reply is pending.
//!
//! # Example
//!
//! ```rust,no_run
//! use yunie_server::routes::{create_router, AppState};
//! use yunie_server::config::Config;
//! use yunie_tasks::TodoBoard;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::from_env().expect("failed to load config");
//!     let state = AppState::new(config, TodoBoard::new()).expect("failed to build state");
//!     let app = create_router(state);
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use yunie_tasks::{BoardSnapshot, MessageOrigin, Task, TaskId, TaskPipeline, TodoBoard};

use crate::config::Config;
use crate::error::{Result, ServerError};
use crate::openai::{ChatClient, ChatError};

// ============================================================================
// Constants
// ============================================================================

/// Maximum request body size (1 MB).
const MAX_BODY_SIZE: usize = 1024 * 1024;

/// Error body for a chat request without a message.
const NO_MESSAGE: &str = "no message provided";

/// Error body for a rejected manual add.
const DUPLICATE_OR_EMPTY: &str = "duplicate or empty task";

// ============================================================================
// Application State
// ============================================================================

/// Shared application state for all route handlers.
///
/// Cloned for each request handler; clones share the pipeline.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<Config>,

    /// Extraction, session guard and board for the server's conversation.
    pub pipeline: Arc<Mutex<TaskPipeline>>,

    /// Chat client, absent when no API key is configured.
    pub chat: Option<ChatClient>,

    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Creates application state serving `board`, building the chat client
    /// from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Configuration`] if the HTTP client cannot be created.
    pub fn new(config: Config, board: TodoBoard) -> std::result::Result<Self, ChatError> {
        let chat = ChatClient::from_config(&config)?;
        Ok(Self::with_components(config, TaskPipeline::new(board), chat))
    }

    /// Creates application state from prebuilt components.
    ///
    /// Useful for testing or when the chat client needs custom settings.
    #[must_use]
    pub fn with_components(
        config: Config,
        pipeline: TaskPipeline,
        chat: Option<ChatClient>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            pipeline: Arc::new(Mutex::new(pipeline)),
            chat,
            start_time: Instant::now(),
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &"<Config>")
            .field("pipeline", &"<TaskPipeline>")
            .field("chat", &self.chat)
            .field("start_time", &self.start_time)
            .finish()
    }
}

// ============================================================================
// Router
// ============================================================================

/// Creates the application router with all routes configured.
///
/// Every route sits behind a request trace layer, permissive CORS and a
/// 1 MB body limit.
///
/// # Example
///
/// ```rust,no_run
/// use yunie_server::routes::{create_router, AppState};
/// use yunie_server::config::Config;
/// use yunie_tasks::TodoBoard;
///
/// let config = Config::from_env().expect("failed to load config");
/// let state = AppState::new(config, TodoBoard::new()).expect("failed to build state");
/// let router = create_router(state);
/// ```
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/chat", post(post_chat))
        .route("/todos", get(get_todos).post(post_todo))
        .route("/todos/{id}/complete", post(complete_todo))
        .route("/finished", delete(clear_finished))
        .route("/finished/{id}", delete(remove_finished))
        .route("/health", get(get_health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(MAX_BODY_SIZE)),
        )
        .with_state(state)
}

// ============================================================================
// POST /chat - Companion Relay
// ============================================================================

/// Request body for the chat relay.
#[derive(Debug, Deserialize)]
struct ChatRequest {
    #[serde(default)]
    message: Option<String>,
}

/// Response body for the chat relay.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Companion reply text.
    pub reply: String,

    /// Tasks captured from the user message and the reply, in that order.
    pub added: Vec<Task>,
}

/// POST /chat - Relay a user message to the companion.
///
/// The user message is run through the task pipeline before the upstream
/// call; the reply is run through it afterwards. Tasks captured from the
/// user message stay on the board even if the upstream call fails.
///
/// # Responses
///
/// - `200 OK` - `{ "reply": "...", "added": [...] }`
/// - `400 Bad Request` - No message provided
/// - `500 Internal Server Error` - No API key, or the upstream is unreachable
/// - Upstream status - The upstream rejected the request
async fn post_chat(State(state): State<AppState>, body: Bytes) -> Result<Json<ChatResponse>> {
    let message = serde_json::from_slice::<ChatRequest>(&body)
        .ok()
        .and_then(|request| request.message)
        .filter(|message| !message.trim().is_empty())
        .ok_or_else(|| ServerError::validation(NO_MESSAGE))?;

    let mut added = state
        .pipeline
        .lock()
        .await
        .ingest(&message, MessageOrigin::User);

    let chat = state.chat.as_ref().ok_or(ChatError::MissingApiKey)?;
    let reply = chat.complete(&message).await?;

    added.extend(
        state
            .pipeline
            .lock()
            .await
            .ingest(&reply, MessageOrigin::Companion),
    );

    info!(
        message_len = message.len(),
        reply_len = reply.len(),
        added = added.len(),
        "Chat turn completed"
    );

    Ok(Json(ChatResponse { reply, added }))
}

// ============================================================================
// Todo Routes
// ============================================================================

/// Request body for a manual add.
#[derive(Debug, Deserialize)]
struct NewTodoRequest {
    text: String,
    #[serde(default)]
    due: Option<String>,
}

/// GET /todos - Both task lists.
async fn get_todos(State(state): State<AppState>) -> Json<BoardSnapshot> {
    Json(state.pipeline.lock().await.board().snapshot())
}

/// POST /todos - Add a task by hand, bypassing extraction and the session
/// guard.
///
/// # Responses
///
/// - `201 Created` - The new task
/// - `409 Conflict` - Empty text or a duplicate of an existing task
async fn post_todo(
    State(state): State<AppState>,
    Json(request): Json<NewTodoRequest>,
) -> Result<impl IntoResponse> {
    let task = state
        .pipeline
        .lock()
        .await
        .board_mut()
        .add_item_with_due(&request.text, request.due.as_deref())
        .ok_or_else(|| ServerError::conflict(DUPLICATE_OR_EMPTY))?;

    debug!(id = %task.id(), "Task added by hand");
    Ok((StatusCode::CREATED, Json(task)))
}

/// POST /todos/{id}/complete - Finish a pending task.
async fn complete_todo(State(state): State<AppState>, Path(id): Path<u64>) -> Result<StatusCode> {
    let id = TaskId::from(id);
    if !state.pipeline.lock().await.board_mut().complete_item(id) {
        return Err(ServerError::not_found(format!("no pending task with id {id}")));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /finished - Clear the finished list.
async fn clear_finished(State(state): State<AppState>) -> StatusCode {
    let removed = state.pipeline.lock().await.board_mut().clear_finished();
    debug!(removed = removed, "Finished tasks cleared");
    StatusCode::NO_CONTENT
}

/// DELETE /finished/{id} - Remove one finished task.
async fn remove_finished(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode> {
    let id = TaskId::from(id);
    if !state.pipeline.lock().await.board_mut().remove_finished(id) {
        return Err(ServerError::not_found(format!("no finished task with id {id}")));
    }
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// GET /health - Health Check
// ============================================================================

/// Response body for health check endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Server status (always "ok" if responding).
    pub status: String,

    /// Number of pending tasks.
    pub pending: usize,

    /// Number of finished tasks.
    pub finished: usize,

    /// Server uptime in seconds.
    pub uptime_seconds: u64,
}

/// GET /health - Health check endpoint.
///
/// # Response
///
/// ```json
/// {
///   "status": "ok",
///   "pending": 3,
///   "finished": 1,
///   "uptime_seconds": 3600
/// }
/// ```
async fn get_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let (pending, finished) = {
        let pipeline = state.pipeline.lock().await;
        (pipeline.board().pending().len(), pipeline.board().finished().len())
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        pending,
        finished,
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}

// ============================================================================
// Tests
// ============================================================================
