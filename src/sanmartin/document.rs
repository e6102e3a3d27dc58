// src/sanmartin/document.rs
use lopdf::Document;

use crate::extractors::timetable::PageSource;
use crate::utils::error::DocumentError;

/// A loaded timetable PDF, exposing its pages' text content.
pub struct TimetableDocument {
    inner: Document,
}

impl TimetableDocument {
    /// Parses a PDF from raw bytes. Failure here is the one fatal condition
    /// of a run: an unreadable source document.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DocumentError> {
        let inner = Document::load_mem(bytes)?;
        Ok(Self { inner })
    }

    pub fn page_count(&self) -> usize {
        self.inner.get_pages().len()
    }

    /// Text content of the page at a zero-based index, or `None` when the
    /// page yields no extractable text (scanned images, vector-only pages,
    /// extraction failures).
    pub fn page_text(&self, index: usize) -> Option<String> {
        // lopdf numbers pages from 1.
        let page_number = index as u32 + 1;
        match self.inner.extract_text(&[page_number]) {
            Ok(text) if !text.trim().is_empty() => Some(text),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!("No text extracted from page {}: {}", index, e);
                None
            }
        }
    }
}

impl PageSource for TimetableDocument {
    fn page_texts(&self) -> Vec<Option<String>> {
        (0..self.page_count()).map(|i| self.page_text(i)).collect()
    }
}
