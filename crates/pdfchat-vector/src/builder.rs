//! Builds a [`DocumentIndex`] from ingested chunks.

use std::sync::Arc;

use pdfchat_core::error::{PdfChatError, Result};
use pdfchat_core::types::DocumentChunk;
use tracing::{debug, info};

use crate::embedding::DynEmbeddingService;
use crate::index::DocumentIndex;

/// Embeds chunks and assembles them into an index.
#[derive(Clone)]
pub struct IndexBuilder {
    embedder: Arc<dyn DynEmbeddingService>,
}

impl IndexBuilder {
    pub fn new(embedder: Arc<dyn DynEmbeddingService>) -> Self {
        Self { embedder }
    }

    /// Embed every chunk exactly once, in document order.
    ///
    /// The first embedding failure aborts the build and nothing is returned,
    /// so a half-embedded index can never be published.
    pub async fn build(&self, chunks: Vec<DocumentChunk>) -> Result<DocumentIndex> {
        if chunks.is_empty() {
            return Err(PdfChatError::Ingestion(
                "cannot index a document with no chunks".to_string(),
            ));
        }

        let mut embeddings = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            let vector = self.embedder.embed_boxed(&chunk.text).await.map_err(|e| match e {
                PdfChatError::Embedding(msg) => {
                    PdfChatError::Embedding(format!("chunk {}: {}", chunk.index, msg))
                }
                other => PdfChatError::Embedding(format!("chunk {}: {}", chunk.index, other)),
            })?;
            debug!(chunk = chunk.index, "Embedded chunk");
            embeddings.push(vector);
        }

        let index = DocumentIndex::from_embeddings(chunks, embeddings, self.embedder.dimensions())?;
        info!(
            chunks = index.len(),
            dimensions = index.dimensions(),
            "Vector index built"
        );
        Ok(index)
    }

    pub fn embedder(&self) -> Arc<dyn DynEmbeddingService> {
        Arc::clone(&self.embedder)
    }
}

impl std::fmt::Debug for IndexBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexBuilder")
            .field("dimensions", &self.embedder.dimensions())
            .finish()
    }
}
