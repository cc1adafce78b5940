//! Route handler functions for all API endpoints.
//!
//! Each handler extracts its inputs via axum extractors, drives the chat
//! pipeline held in AppState, and returns JSON responses.

use std::collections::BTreeMap;

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::Json;
use pdfchat_chat::{normalize_session_id, TurnOutcome};
use pdfchat_core::types::{ChatMessage, DocumentInfo};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::state::AppState;

const PDF_MIME: &str = "application/pdf";

// =============================================================================
// Request / response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub credential_set: bool,
    pub model: Option<String>,
    pub document: Option<DocumentInfo>,
    pub session_count: usize,
}

#[derive(Deserialize)]
pub struct CredentialRequest {
    pub api_key: String,
}

// Keeps the key out of request logs.
impl std::fmt::Debug for CredentialRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialRequest")
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CredentialResponse {
    pub ready: bool,
    pub model: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub session_id: Option<String>,
    pub question: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionsResponse {
    pub sessions: BTreeMap<String, Vec<ChatMessage>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub messages: Vec<ChatMessage>,
}

// =============================================================================
// Page and health
// =============================================================================

/// GET / - serve the self-contained chat page.
pub async fn index() -> impl IntoResponse {
    Html(pdfchat_ui::CHAT_PAGE_HTML)
}

/// GET /health - liveness plus pipeline readiness.
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    let document = state.documents.current()?.map(|doc| doc.info.clone());

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        credential_set: state.has_credential(),
        model: state.model_name(),
        document,
        session_count: state.sessions.len(),
    }))
}

// =============================================================================
// Credential
// =============================================================================

/// PUT /credential - build the pipeline around the supplied API key.
pub async fn put_credential(
    State(state): State<AppState>,
    Json(body): Json<CredentialRequest>,
) -> Result<Json<CredentialResponse>, ApiError> {
    let model = state.set_credential(&body.api_key)?;
    Ok(Json(CredentialResponse { ready: true, model }))
}

// =============================================================================
// Documents
// =============================================================================

/// POST /documents - ingest and index an uploaded PDF.
///
/// Expects a multipart body with the PDF in the `file` field. The new index
/// replaces the current document only once it is fully built.
pub async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<DocumentInfo>), ApiError> {
    let pipeline = state.pipeline()?;
    let limit = state.config.ingest.max_upload_bytes;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload.pdf").to_string();
        if !is_pdf(&field, &file_name) {
            return Err(ApiError::BadRequest(format!(
                "{} is not a PDF file",
                file_name
            )));
        }

        let bytes = field.bytes().await.map_err(multipart_error)?;
        if bytes.is_empty() {
            return Err(ApiError::BadRequest("uploaded file is empty".to_string()));
        }
        if bytes.len() > limit {
            return Err(ApiError::PayloadTooLarge(format!(
                "upload exceeds {} bytes",
                limit
            )));
        }

        info!(file = %file_name, bytes = bytes.len(), "Document upload received");
        let info = match pipeline.load_document(&file_name, bytes.to_vec()).await {
            Ok(info) => info,
            Err(e) => {
                warn!(file = %file_name, error = %e, "Document upload rejected");
                return Err(e.into());
            }
        };
        info!(
            file = %info.file_name,
            pages = info.page_count,
            chunks = info.chunk_count,
            "Document indexed"
        );
        return Ok((StatusCode::CREATED, Json(info)));
    }

    Err(ApiError::BadRequest(
        "multipart field 'file' is required".to_string(),
    ))
}

fn is_pdf(field: &Field<'_>, file_name: &str) -> bool {
    let by_type = field
        .content_type()
        .map(|ct| ct.eq_ignore_ascii_case(PDF_MIME))
        .unwrap_or(false);
    by_type || file_name.to_ascii_lowercase().ends_with(".pdf")
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(err.body_text())
    } else {
        ApiError::BadRequest(err.body_text())
    }
}

// =============================================================================
// Chat
// =============================================================================

/// POST /chat - answer one question within a session.
pub async fn chat(
    State(state): State<AppState>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<TurnOutcome>, ApiError> {
    let pipeline = state.pipeline()?;
    let session_id = body
        .session_id
        .unwrap_or_else(|| state.config.general.default_session_id.clone());

    let outcome = pipeline.handle_turn(&session_id, &body.question).await?;
    Ok(Json(outcome))
}

// =============================================================================
// Sessions
// =============================================================================

/// GET /sessions - every session's message list.
pub async fn list_sessions(
    State(state): State<AppState>,
) -> Result<Json<SessionsResponse>, ApiError> {
    let snapshot = state.sessions.snapshot().await?;
    let sessions = snapshot
        .into_iter()
        .map(|(id, transcript)| (id, transcript.to_messages()))
        .collect();
    Ok(Json(SessionsResponse { sessions }))
}

/// GET /sessions/{id} - one session's message list.
///
/// Unknown ids yield an empty list without creating the session.
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session_id = normalize_session_id(&id)?.to_string();
    let messages = state
        .sessions
        .find(&session_id)
        .await?
        .map(|t| t.to_messages())
        .unwrap_or_default();
    Ok(Json(SessionResponse {
        session_id,
        messages,
    }))
}
