use thiserror::Error;

/// Top-level error type for pdfchat.
///
/// Each pipeline stage reports failures through its own variant so callers can
/// tell an unreadable upload apart from an embedding or search failure.
/// Crates with richer failure modes (the language model client, the chat
/// orchestrator) define their own error types and convert from this one.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PdfChatError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Ingestion error: {0}")]
    Ingestion(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Retrieval error: {0}")]
    Retrieval(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for PdfChatError {
    fn from(err: toml::de::Error) -> Self {
        PdfChatError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for PdfChatError {
    fn from(err: toml::ser::Error) -> Self {
        PdfChatError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for PdfChatError {
    fn from(err: serde_json::Error) -> Self {
        PdfChatError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for pdfchat operations.
pub type Result<T> = std::result::Result<T, PdfChatError>;
