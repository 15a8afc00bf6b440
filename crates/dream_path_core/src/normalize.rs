//! crates/dream_path_core/src/normalize.rs
//!
//! Turns uploaded or pasted material into the single string that gets prompted.

use std::path::Path;
use std::sync::Arc;
use tracing::warn;

use crate::ports::{PageExtractor, PortResult};

/// The two accepted input kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    PlainText,
    /// A paged document (PDF).
    Paginated,
}

impl SourceKind {
    /// Picks the kind from the file extension; anything that is not a PDF is read as text.
    pub fn from_file_name(file_name: &str) -> Self {
        let is_pdf = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if is_pdf {
            Self::Paginated
        } else {
            Self::PlainText
        }
    }
}

/// Decodes text bytes as UTF-8. Invalid sequences become U+FFFD.
pub fn decode_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Joins per-page text with single spaces in page order. Failed pages are skipped.
pub fn join_pages(pages: Vec<PortResult<String>>) -> String {
    let mut kept = Vec::with_capacity(pages.len());
    for (index, page) in pages.into_iter().enumerate() {
        match page {
            Ok(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    kept.push(text.to_string());
                }
            }
            Err(e) => warn!(page = index + 1, error = %e, "Skipping unreadable page"),
        }
    }
    kept.join(" ")
}

/// Produces canonical prompt content from raw file bytes.
#[derive(Clone)]
pub struct ContentNormalizer {
    pages: Arc<dyn PageExtractor>,
}

impl ContentNormalizer {
    pub fn new(pages: Arc<dyn PageExtractor>) -> Self {
        Self { pages }
    }

    pub fn normalize(&self, bytes: &[u8], kind: SourceKind) -> PortResult<String> {
        match kind {
            SourceKind::PlainText => Ok(decode_text(bytes)),
            SourceKind::Paginated => {
                let pages = self.pages.extract_pages(bytes)?;
                Ok(join_pages(pages))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::PortError;

    struct FixedPages(Vec<PortResult<String>>);

    impl PageExtractor for FixedPages {
        fn extract_pages(&self, _bytes: &[u8]) -> PortResult<Vec<PortResult<String>>> {
            Ok(self.0.clone())
        }
    }

    struct Unopenable;

    impl PageExtractor for Unopenable {
        fn extract_pages(&self, _bytes: &[u8]) -> PortResult<Vec<PortResult<String>>> {
            Err(PortError::Unexpected("not a PDF".into()))
        }
    }

    #[test]
    fn kind_follows_extension() {
        assert_eq!(SourceKind::from_file_name("notes.pdf"), SourceKind::Paginated);
        assert_eq!(SourceKind::from_file_name("NOTES.PDF"), SourceKind::Paginated);
        assert_eq!(SourceKind::from_file_name("notes.txt"), SourceKind::PlainText);
        assert_eq!(SourceKind::from_file_name("README"), SourceKind::PlainText);
    }

    #[test]
    fn plain_text_is_verbatim() {
        let normalizer = ContentNormalizer::new(Arc::new(Unopenable));
        let text = "  Line one\nLine two — ünïcode  ";
        let content = normalizer
            .normalize(text.as_bytes(), SourceKind::PlainText)
            .unwrap();
        assert_eq!(content, text);
    }

    #[test]
    fn pages_are_joined_in_order_and_failures_skipped() {
        let normalizer = ContentNormalizer::new(Arc::new(FixedPages(vec![
            Ok("First page.\n".into()),
            Err(PortError::Unexpected("broken font".into())),
            Ok("   ".into()),
            Ok("Third page.".into()),
        ])));
        let content = normalizer.normalize(b"%PDF", SourceKind::Paginated).unwrap();
        assert_eq!(content, "First page. Third page.");
    }

    #[test]
    fn unopenable_document_fails_whole_operation() {
        let normalizer = ContentNormalizer::new(Arc::new(Unopenable));
        assert!(normalizer.normalize(b"junk", SourceKind::Paginated).is_err());
    }
}
