//! Query-side search over the current document.

use std::sync::Arc;

use pdfchat_core::error::{PdfChatError, Result};
use tracing::debug;

use crate::embedding::DynEmbeddingService;
use crate::index::{IndexedDocument, ScoredChunk};

/// Embeds a query with the same model used at build time, then searches.
#[derive(Clone)]
pub struct DocumentRetriever {
    embedder: Arc<dyn DynEmbeddingService>,
    document: Arc<IndexedDocument>,
}

impl DocumentRetriever {
    pub fn new(embedder: Arc<dyn DynEmbeddingService>, document: Arc<IndexedDocument>) -> Self {
        Self { embedder, document }
    }

    /// Return the `k` chunks nearest to `query`, best first.
    ///
    /// A failure to embed the query is an `Embedding` error; a failure in
    /// the index itself is a `Retrieval` error.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        let vector = self.embedder.embed_boxed(query).await.map_err(|e| match e {
            PdfChatError::Embedding(msg) => PdfChatError::Embedding(msg),
            other => PdfChatError::Embedding(other.to_string()),
        })?;

        let hits = self.document.index.search(&vector, k)?;
        debug!(
            document = %self.document.id,
            k,
            hits = hits.len(),
            top_score = hits.first().map(|h| h.score),
            "Retrieved chunks"
        );
        Ok(hits)
    }

    pub fn document(&self) -> &Arc<IndexedDocument> {
        &self.document
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::IndexBuilder;
    use crate::embedding::HashEmbedding;
    use pdfchat_core::types::{DocumentChunk, DocumentInfo};

    async fn document(texts: &[&str], embedder: Arc<dyn DynEmbeddingService>) -> Arc<IndexedDocument> {
        let chunks: Vec<DocumentChunk> = texts
            .iter()
            .enumerate()
            .map(|(index, text)| DocumentChunk {
                index,
                page_index: index,
                text: text.to_string(),
            })
            .collect();
        let index = IndexBuilder::new(embedder).build(chunks).await.unwrap();
        Arc::new(IndexedDocument::new(
            DocumentInfo {
                file_name: "test.pdf".to_string(),
                page_count: texts.len(),
                chunk_count: texts.len(),
            },
            index,
        ))
    }

    #[tokio::test]
    async fn test_search_finds_matching_chunk() {
        let embedder: Arc<dyn DynEmbeddingService> = Arc::new(HashEmbedding::new());
        let doc = document(&["intro", "The capital of France is Paris.", "appendix"], embedder.clone()).await;
        let retriever = DocumentRetriever::new(embedder, doc);

        let hits = retriever
            .search("The capital of France is Paris.", 4)
            .await
            .unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].chunk.index, 1);
        assert!((hits[0].score - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_search_blank_query_is_embedding_error() {
        let embedder: Arc<dyn DynEmbeddingService> = Arc::new(HashEmbedding::new());
        let doc = document(&["only chunk"], embedder.clone()).await;
        let retriever = DocumentRetriever::new(embedder, doc);

        assert!(matches!(
            retriever.search("  ", 4).await,
            Err(PdfChatError::Embedding(_))
        ));
    }

    #[tokio::test]
    async fn test_search_with_mismatched_model_is_retrieval_error() {
        let doc = document(&["only chunk"], Arc::new(HashEmbedding::new())).await;
        let retriever = DocumentRetriever::new(Arc::new(HashEmbedding::with_dimensions(8)), doc);

        assert!(matches!(
            retriever.search("query", 4).await,
            Err(PdfChatError::Retrieval(_))
        ));
    }
}
