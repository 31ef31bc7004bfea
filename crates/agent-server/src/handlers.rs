//! HTTP Handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use agent_core::{
    tool::CategoryInfo, AgentError, AgentRequest, AgentResponse, AskResponse, Message, ModelInfo,
};
use agent_tools::documents::FileRecord;

use crate::state::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub models: usize,
    pub tool_categories: usize,
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateAgentRequest {
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct CreateAgentResponse {
    pub agent_id: String,
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    pub filename: String,
    #[serde(default = "default_mime")]
    pub mime_type: String,
    pub content: String,
}

fn default_mime() -> String {
    "text/plain".into()
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub agent_id: String,
    pub history: Vec<Message>,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = Result<Json<T>, ApiError>;

/// Log the internal error, hand the caller only its user-facing text.
fn error_response(err: &AgentError) -> ApiError {
    let status = status_for(err);
    if status.is_server_error() {
        tracing::error!(error = %err, "Request failed");
    } else {
        tracing::warn!(error = %err, "Request rejected");
    }
    (
        status,
        Json(ErrorResponse {
            error: err.user_message(),
            code: err.code().into(),
        }),
    )
}

fn status_for(err: &AgentError) -> StatusCode {
    match err {
        e if e.is_configuration() => StatusCode::BAD_REQUEST,
        AgentError::Unauthorized(_) => StatusCode::FORBIDDEN,
        AgentError::AgentNotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        models: state.engine.list_models().len(),
        tool_categories: state.engine.list_tools().len(),
    })
}

pub async fn list_models(State(state): State<AppState>) -> Json<Vec<ModelInfo>> {
    Json(state.engine.list_models())
}

pub async fn list_tools(State(state): State<AppState>) -> Json<BTreeMap<String, CategoryInfo>> {
    Json(state.engine.list_tools())
}

/// Single-turn question, no tools
pub async fn ask(State(state): State<AppState>, Json(payload): Json<AskRequest>) -> ApiResult<AskResponse> {
    state
        .engine
        .ask(&payload.question, payload.model.as_deref())
        .await
        .map(Json)
        .map_err(|e| error_response(&e))
}

/// Tool-augmented question; reads history when `agent_id` is given but never writes it
pub async fn ask_with_tools(
    State(state): State<AppState>,
    Json(payload): Json<AgentRequest>,
) -> ApiResult<AgentResponse> {
    state
        .engine
        .ask_with_tools(&payload)
        .await
        .map(Json)
        .map_err(|e| error_response(&e))
}

pub async fn create_agent(
    State(state): State<AppState>,
    Json(payload): Json<CreateAgentRequest>,
) -> Json<CreateAgentResponse> {
    let agent_id = uuid::Uuid::new_v4().to_string();
    state.agents.register_agent(&agent_id, &payload.user_id).await;
    tracing::info!(agent_id = %agent_id, user_id = %payload.user_id, "Agent created");

    Json(CreateAgentResponse {
        agent_id,
        user_id: payload.user_id,
    })
}

pub async fn upload_file(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
    Json(payload): Json<UploadRequest>,
) -> Json<FileRecord> {
    let record = state
        .documents
        .upload(&agent_id, &payload.filename, &payload.mime_type, payload.content.into_bytes())
        .await;
    tracing::info!(agent_id = %agent_id, file_id = %record.id, "File uploaded");
    Json(record)
}

/// Chat with a stored agent; the exchange is appended to its history
pub async fn chat(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
    Json(payload): Json<AgentRequest>,
) -> ApiResult<AgentResponse> {
    state
        .engine
        .chat(&agent_id, payload)
        .await
        .map(Json)
        .map_err(|e| error_response(&e))
}

pub async fn history(State(state): State<AppState>, Path(agent_id): Path<String>) -> ApiResult<HistoryResponse> {
    let history = state.engine.history(&agent_id).await.map_err(|e| error_response(&e))?;
    Ok(Json(HistoryResponse { agent_id, history }))
}

pub async fn clear_history(State(state): State<AppState>, Path(agent_id): Path<String>) -> ApiResult<ClearResponse> {
    state
        .engine
        .clear_history(&agent_id)
        .await
        .map_err(|e| error_response(&e))?;
    Ok(Json(ClearResponse { success: true }))
}
