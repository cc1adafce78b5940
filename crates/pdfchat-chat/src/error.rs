//! Error types for the question-answering pipeline.

use pdfchat_core::error::PdfChatError;
use pdfchat_llm::LlmError;

use crate::stage::TurnStage;

/// Errors from a chat turn or a document upload.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("no document has been indexed yet; upload a PDF first")]
    NotReady,
    #[error("session id cannot be empty")]
    InvalidSessionId,
    #[error("question cannot be empty")]
    EmptyQuestion,
    #[error("question exceeds maximum length of {0} characters")]
    QuestionTooLong(usize),
    #[error("ingestion error: {0}")]
    Ingestion(String),
    #[error("embedding error: {0}")]
    Embedding(String),
    #[error("retrieval error: {0}")]
    Retrieval(String),
    #[error("generation error: {0}")]
    Generation(#[from] LlmError),
    #[error("invalid turn transition from {0} to {1}")]
    InvalidTransition(TurnStage, TurnStage),
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<PdfChatError> for ChatError {
    fn from(err: PdfChatError) -> Self {
        match err {
            PdfChatError::Ingestion(msg) => ChatError::Ingestion(msg),
            PdfChatError::Embedding(msg) => ChatError::Embedding(msg),
            PdfChatError::Retrieval(msg) => ChatError::Retrieval(msg),
            other => ChatError::Storage(other.to_string()),
        }
    }
}
