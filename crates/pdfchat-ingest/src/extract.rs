//! PDF text extraction.

use pdfchat_core::error::{PdfChatError, Result};
use pdfchat_core::types::PageText;
use tracing::{debug, warn};

/// Every PDF file starts with this header.
const PDF_SIGNATURE: &[u8] = b"%PDF";

/// Turns raw upload bytes into per-page text, in page order.
///
/// Implementations are synchronous; callers move them onto a blocking thread.
pub trait PageExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Result<Vec<PageText>>;
}

/// Page extractor backed by `lopdf`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfExtractor;

impl PageExtractor for LopdfExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<Vec<PageText>> {
        if !bytes.starts_with(PDF_SIGNATURE) {
            return Err(PdfChatError::Ingestion(
                "upload is not a PDF (missing %PDF header)".to_string(),
            ));
        }

        let document = lopdf::Document::load_mem(bytes)
            .map_err(|e| PdfChatError::Ingestion(format!("failed to parse PDF: {}", e)))?;

        // get_pages is keyed by 1-based page number, so iteration is page order.
        let page_numbers: Vec<u32> = document.get_pages().keys().copied().collect();
        if page_numbers.is_empty() {
            return Err(PdfChatError::Ingestion("PDF has no pages".to_string()));
        }

        let mut pages = Vec::with_capacity(page_numbers.len());
        for (page_index, page_number) in page_numbers.into_iter().enumerate() {
            let text = match document.extract_text(&[page_number]) {
                Ok(text) => text,
                Err(e) => {
                    warn!(page = page_number, error = %e, "Page text unrecoverable, skipping");
                    String::new()
                }
            };
            debug!(page = page_number, chars = text.len(), "Extracted page text");
            pages.push(PageText { page_index, text });
        }

        if pages.iter().all(|p| p.text.trim().is_empty()) {
            return Err(PdfChatError::Ingestion(
                "PDF contains no extractable text (it may be image-based or encrypted)"
                    .to_string(),
            ));
        }

        Ok(pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture;

    #[test]
    fn test_extract_preserves_page_order() {
        let bytes = fixture::build_pdf(&["first page", "second page", "third page"]);
        let pages = LopdfExtractor.extract(&bytes).unwrap();

        assert_eq!(pages.len(), 3);
        for (i, page) in pages.iter().enumerate() {
            assert_eq!(page.page_index, i);
        }
        assert!(pages[0].text.contains("first page"));
        assert!(pages[1].text.contains("second page"));
        assert!(pages[2].text.contains("third page"));
    }

    #[test]
    fn test_extract_multiline_page() {
        let bytes = fixture::build_pdf(&["The capital of France is Paris.\nIt sits on the Seine."]);
        let pages = LopdfExtractor.extract(&bytes).unwrap();
        assert!(pages[0].text.contains("The capital of France is Paris."));
        assert!(pages[0].text.contains("It sits on the Seine."));
    }

    #[test]
    fn test_extract_rejects_missing_signature() {
        let result = LopdfExtractor.extract(b"hello world");
        assert!(matches!(result, Err(PdfChatError::Ingestion(_))));
    }

    #[test]
    fn test_extract_rejects_truncated_pdf() {
        let bytes = fixture::build_pdf(&["some text"]);
        let truncated = &bytes[..bytes.len() / 3];
        let result = LopdfExtractor.extract(truncated);
        assert!(matches!(result, Err(PdfChatError::Ingestion(_))));
    }

    #[test]
    fn test_extract_rejects_textless_pdf() {
        let bytes = fixture::build_pdf(&["", ""]);
        let result = LopdfExtractor.extract(&bytes);
        assert!(matches!(result, Err(PdfChatError::Ingestion(_))));
    }
}
