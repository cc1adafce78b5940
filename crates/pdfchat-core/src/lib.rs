//! Shared foundations for pdfchat: configuration, the top-level error type,
//! and the data model passed between the ingestion, retrieval and chat crates.

pub mod config;
pub mod error;
pub mod types;

pub use config::PdfChatConfig;
pub use error::{PdfChatError, Result};
pub use types::*;
