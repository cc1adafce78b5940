//! Document ingestion: PDF page extraction and recursive character splitting.
//!
//! [`DocumentIngestor`] turns uploaded bytes into ordered [`DocumentChunk`]s.
//! Extraction sits behind the [`PageExtractor`] trait so tests can feed page
//! text directly without building a PDF.
//!
//! [`DocumentChunk`]: pdfchat_core::DocumentChunk

pub mod extract;
pub mod fixture;
pub mod splitter;

use std::sync::Arc;

use pdfchat_core::config::IngestConfig;
use pdfchat_core::error::{PdfChatError, Result};
use pdfchat_core::types::{DocumentChunk, PageText};
use tracing::info;

pub use extract::{LopdfExtractor, PageExtractor};
pub use splitter::RecursiveCharacterSplitter;

/// Output of a successful ingestion.
#[derive(Debug, Clone)]
pub struct IngestedDocument {
    pub page_count: usize,
    pub chunks: Vec<DocumentChunk>,
}

/// Extracts and chunks uploaded documents.
pub struct DocumentIngestor {
    extractor: Arc<dyn PageExtractor>,
    splitter: RecursiveCharacterSplitter,
}

impl DocumentIngestor {
    /// Create an ingestor backed by lopdf with the configured chunk geometry.
    pub fn new(config: &IngestConfig) -> Result<Self> {
        let splitter = RecursiveCharacterSplitter::new(config.chunk_size, config.chunk_overlap)?;
        Ok(Self::with_extractor(Arc::new(LopdfExtractor), splitter))
    }

    pub fn with_extractor(
        extractor: Arc<dyn PageExtractor>,
        splitter: RecursiveCharacterSplitter,
    ) -> Self {
        Self {
            extractor,
            splitter,
        }
    }

    /// Extract every page of `bytes` and split the text into chunks.
    ///
    /// Parsing runs on a blocking thread. The bytes are dropped once
    /// extraction finishes.
    pub async fn ingest(&self, bytes: Vec<u8>) -> Result<IngestedDocument> {
        let extractor = Arc::clone(&self.extractor);
        let pages: Vec<PageText> = tokio::task::spawn_blocking(move || extractor.extract(&bytes))
            .await
            .map_err(|e| PdfChatError::Ingestion(format!("extraction task failed: {}", e)))??;

        let chunks = self.splitter.split_pages(&pages);
        if chunks.is_empty() {
            return Err(PdfChatError::Ingestion(
                "document contains no extractable text".to_string(),
            ));
        }

        info!(
            pages = pages.len(),
            chunks = chunks.len(),
            "Document ingested"
        );

        Ok(IngestedDocument {
            page_count: pages.len(),
            chunks,
        })
    }

    pub fn splitter(&self) -> &RecursiveCharacterSplitter {
        &self.splitter
    }
}
