//! services/app/src/adapters/pdf.rs
//!
//! Implements the `PageExtractor` port for PDF uploads using `lopdf`.

use dream_path_core::ports::{PageExtractor, PortError, PortResult};
use lopdf::Document;

#[derive(Debug, Clone, Copy, Default)]
pub struct PdfPageExtractor;

impl PageExtractor for PdfPageExtractor {
    fn extract_pages(&self, bytes: &[u8]) -> PortResult<Vec<PortResult<String>>> {
        let document = Document::load_mem(bytes)
            .map_err(|e| PortError::Unexpected(format!("Could not open PDF: {}", e)))?;

        // `get_pages` is keyed by 1-based page number, so iteration is in page order.
        let pages = document
            .get_pages()
            .keys()
            .map(|&number| {
                document.extract_text(&[number]).map_err(|e| {
                    PortError::Unexpected(format!("Could not read page {}: {}", number, e))
                })
            })
            .collect();
        Ok(pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_pdf_bytes_fail_to_open() {
        let result = PdfPageExtractor.extract_pages(b"just some text, not a PDF");
        assert!(matches!(result, Err(PortError::Unexpected(_))));
    }
}
