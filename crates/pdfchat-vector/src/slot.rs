//! Holder for the single currently loaded document.

use std::sync::{Arc, RwLock};

use pdfchat_core::error::{PdfChatError, Result};
use tracing::info;

use crate::index::IndexedDocument;

/// At most one indexed document, replaced wholesale on each upload.
///
/// Readers clone the `Arc` and keep searching the document they started
/// with even if a replacement lands mid-turn.
#[derive(Debug, Clone, Default)]
pub struct DocumentSlot {
    current: Arc<RwLock<Option<Arc<IndexedDocument>>>>,
}

impl DocumentSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Result<Option<Arc<IndexedDocument>>> {
        let guard = self
            .current
            .read()
            .map_err(|e| PdfChatError::Retrieval(format!("Document slot lock poisoned: {}", e)))?;
        Ok(guard.clone())
    }

    /// Publish a fully built document, returning the one it replaces.
    pub fn replace(&self, document: IndexedDocument) -> Result<Option<Arc<IndexedDocument>>> {
        let document = Arc::new(document);
        let mut guard = self
            .current
            .write()
            .map_err(|e| PdfChatError::Retrieval(format!("Document slot lock poisoned: {}", e)))?;
        let previous = guard.replace(Arc::clone(&document));
        info!(
            document = %document.id,
            file = %document.info.file_name,
            chunks = document.index.len(),
            replaced = previous.is_some(),
            "Document loaded"
        );
        Ok(previous)
    }

    pub fn is_loaded(&self) -> bool {
        self.current.read().map(|g| g.is_some()).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::DocumentIndex;
    use pdfchat_core::types::{DocumentChunk, DocumentInfo};

    fn document(name: &str) -> IndexedDocument {
        let chunk = DocumentChunk {
            index: 0,
            page_index: 0,
            text: name.to_string(),
        };
        let index = DocumentIndex::from_embeddings(vec![chunk], vec![vec![1.0; 2]], 2).unwrap();
        IndexedDocument::new(
            DocumentInfo {
                file_name: name.to_string(),
                page_count: 1,
                chunk_count: 1,
            },
            index,
        )
    }

    #[test]
    fn test_slot_starts_empty() {
        let slot = DocumentSlot::new();
        assert!(!slot.is_loaded());
        assert!(slot.current().unwrap().is_none());
    }

    #[test]
    fn test_replace_swaps_document() {
        let slot = DocumentSlot::new();
        assert!(slot.replace(document("first.pdf")).unwrap().is_none());

        let held = slot.current().unwrap().unwrap();
        let previous = slot.replace(document("second.pdf")).unwrap().unwrap();

        assert_eq!(previous.info.file_name, "first.pdf");
        assert_eq!(held.info.file_name, "first.pdf");
        assert_eq!(slot.current().unwrap().unwrap().info.file_name, "second.pdf");
    }

    #[test]
    fn test_clones_share_state() {
        let slot = DocumentSlot::new();
        let other = slot.clone();
        slot.replace(document("shared.pdf")).unwrap();
        assert!(other.is_loaded());
    }
}
