//! API error types and JSON error response formatting.
//!
//! ApiError provides a consistent JSON error response format across all
//! endpoints, mapping pipeline errors to appropriate HTTP status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pdfchat_chat::ChatError;
use pdfchat_core::error::PdfChatError;
use pdfchat_llm::LlmError;
use serde::Serialize;

/// Shown until a credential has been supplied.
pub const CREDENTIAL_WARNING: &str = "Please enter your Groq API key";

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g., "bad_request", "not_ready").
    pub error: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional structured details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// API error type that maps to HTTP status codes and JSON responses.
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request - missing or invalid parameters.
    BadRequest(String),
    /// 401 Unauthorized - the model provider rejected the credential.
    Unauthorized(String),
    /// 409 Conflict - no document is loaded yet.
    NotReady(String),
    /// 413 Payload Too Large - upload exceeds the configured limit.
    PayloadTooLarge(String),
    /// 422 Unprocessable Entity - the upload could not be ingested.
    UnprocessableEntity(String),
    /// 500 Internal Server Error - unexpected server error.
    Internal(String),
    /// 502 Bad Gateway - embedding, retrieval or model call failed.
    BadGateway { stage: &'static str, message: String },
    /// 503 Service Unavailable - no credential has been supplied.
    ServiceUnavailable(String),
}

impl ApiError {
    pub fn missing_credential() -> Self {
        ApiError::ServiceUnavailable(CREDENTIAL_WARNING.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotReady(_) => StatusCode::CONFLICT,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadGateway { .. } => StatusCode::BAD_GATEWAY,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error_code, message, details) = match self {
            ApiError::BadRequest(msg) => ("bad_request", msg, None),
            ApiError::Unauthorized(msg) => ("unauthorized", msg, None),
            ApiError::NotReady(msg) => ("not_ready", msg, None),
            ApiError::PayloadTooLarge(msg) => ("payload_too_large", msg, None),
            ApiError::UnprocessableEntity(msg) => ("ingestion_failed", msg, None),
            ApiError::Internal(msg) => ("internal_error", msg, None),
            ApiError::BadGateway { stage, message } => (
                "upstream_error",
                message,
                Some(serde_json::json!({ "stage": stage })),
            ),
            ApiError::ServiceUnavailable(msg) => ("missing_credential", msg, None),
        };

        let body = ErrorBody {
            error: error_code.to_string(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<LlmError> for ApiError {
    fn from(err: LlmError) -> Self {
        match &err {
            LlmError::MissingCredential => ApiError::missing_credential(),
            LlmError::Authentication(_) => ApiError::Unauthorized(err.to_string()),
            _ => ApiError::BadGateway {
                stage: "generation",
                message: err.to_string(),
            },
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::NotReady => ApiError::NotReady(err.to_string()),
            ChatError::InvalidSessionId
            | ChatError::EmptyQuestion
            | ChatError::QuestionTooLong(_) => ApiError::BadRequest(err.to_string()),
            ChatError::Ingestion(_) => ApiError::UnprocessableEntity(err.to_string()),
            ChatError::Embedding(_) => ApiError::BadGateway {
                stage: "embedding",
                message: err.to_string(),
            },
            ChatError::Retrieval(_) => ApiError::BadGateway {
                stage: "retrieval",
                message: err.to_string(),
            },
            ChatError::Generation(inner) => inner.into(),
            ChatError::InvalidTransition(..) | ChatError::Storage(_) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl From<PdfChatError> for ApiError {
    fn from(err: PdfChatError) -> Self {
        ChatError::from(err).into()
    }
}
