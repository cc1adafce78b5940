//! In-memory vector index over the chunks of one document.
//!
//! Search is brute-force cosine similarity. A single document rarely holds
//! more than a few hundred 5000-character chunks, so a linear scan is fast
//! enough and keeps ranking exact.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use pdfchat_core::error::{PdfChatError, Result};
use pdfchat_core::types::{DocumentChunk, DocumentInfo};
use uuid::Uuid;

/// A chunk returned from a search, with its similarity to the query.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: DocumentChunk,
    /// Cosine similarity in `[-1.0, 1.0]`.
    pub score: f64,
}

#[derive(Debug, Clone)]
struct IndexEntry {
    chunk: DocumentChunk,
    embedding: Vec<f32>,
}

/// Immutable mapping from chunk to embedding for a single document.
///
/// Built once by [`IndexBuilder`](crate::builder::IndexBuilder); there is no
/// insert or delete after construction.
#[derive(Debug, Clone)]
pub struct DocumentIndex {
    entries: Vec<IndexEntry>,
    dimensions: usize,
}

impl DocumentIndex {
    /// Pair each chunk with its embedding.
    ///
    /// Fails if the two lists differ in length or any vector has the wrong
    /// dimension.
    pub fn from_embeddings(
        chunks: Vec<DocumentChunk>,
        embeddings: Vec<Vec<f32>>,
        dimensions: usize,
    ) -> Result<Self> {
        if chunks.len() != embeddings.len() {
            return Err(PdfChatError::Retrieval(format!(
                "{} chunks but {} embeddings",
                chunks.len(),
                embeddings.len()
            )));
        }
        if let Some((chunk, vector)) = chunks
            .iter()
            .zip(embeddings.iter())
            .find(|(_, v)| v.len() != dimensions)
        {
            return Err(PdfChatError::Embedding(format!(
                "chunk {} embedded to {} dimensions, expected {}",
                chunk.index,
                vector.len(),
                dimensions
            )));
        }

        let entries = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexEntry { chunk, embedding })
            .collect();
        Ok(Self {
            entries,
            dimensions,
        })
    }

    /// Return the `k` chunks most similar to `query`.
    ///
    /// Results are ordered by descending cosine similarity; equal scores keep
    /// document order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        if query.len() != self.dimensions {
            return Err(PdfChatError::Retrieval(format!(
                "query has {} dimensions, index has {}",
                query.len(),
                self.dimensions
            )));
        }

        let mut scored: Vec<ScoredChunk> = self
            .entries
            .iter()
            .map(|entry| ScoredChunk {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(query, &entry.embedding),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.chunk.index.cmp(&b.chunk.index))
        });
        scored.truncate(k);

        Ok(scored)
    }

    pub fn chunks(&self) -> impl Iterator<Item = &DocumentChunk> {
        self.entries.iter().map(|e| &e.chunk)
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The currently loaded document: its index plus upload metadata.
#[derive(Debug)]
pub struct IndexedDocument {
    pub id: Uuid,
    pub info: DocumentInfo,
    pub indexed_at: DateTime<Utc>,
    pub index: DocumentIndex,
}

impl IndexedDocument {
    pub fn new(info: DocumentInfo, index: DocumentIndex) -> Self {
        Self {
            id: Uuid::new_v4(),
            info,
            indexed_at: Utc::now(),
            index,
        }
    }
}

/// Cosine similarity between two vectors.
///
/// Returns 0.0 if the lengths differ or either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (*x as f64) * (*y as f64))
        .sum();

    let mag_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let mag_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    dot / (mag_a * mag_b)
}
