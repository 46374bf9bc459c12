use crate::error::ProcessError;
use crate::processor::{DocumentFormat, DocumentProcessor};

/// Extracts embedded text from the leading pages of a PDF.
pub struct PdfProcessor {
    max_pages: usize,
}

impl PdfProcessor {
    pub fn new(max_pages: usize) -> Self {
        Self {
            max_pages: max_pages.max(1),
        }
    }
}

impl DocumentProcessor for PdfProcessor {
    fn extract(&self, bytes: &[u8]) -> Result<String, ProcessError> {
        let _span = tracing::info_span!("processor.pdf", max_pages = self.max_pages).entered();

        let doc = lopdf::Document::load_mem(bytes)
            .map_err(|e| ProcessError::PdfProcessing(format!("Failed to load PDF: {}", e)))?;

        let pages = leading_pages(&doc, self.max_pages);
        let total = doc.get_pages().len();
        if total > pages.len() {
            tracing::debug!(
                "PDF has {} pages, extracting the first {}",
                total,
                pages.len()
            );
        }

        let mut text = String::new();
        for page_num in pages {
            match doc.extract_text(&[page_num]) {
                Ok(page_text) => {
                    text.push_str(&page_text);
                    text.push('\n');
                }
                Err(e) => tracing::debug!("No text on page {}: {}", page_num, e),
            }
        }

        Ok(text)
    }

    fn supports(&self, format: DocumentFormat) -> bool {
        matches!(format, DocumentFormat::Pdf)
    }
}

/// Page numbers of the first `max_pages` pages, in document order.
fn leading_pages(doc: &lopdf::Document, max_pages: usize) -> Vec<u32> {
    doc.get_pages().into_keys().take(max_pages).collect()
}
