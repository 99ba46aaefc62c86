//! Source document intake: byte-level PDF validation and text extraction.

use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::{debug, warn};

use crate::errors::EngineError;
use crate::models::cv::CvContent;

pub const MIN_PDF_BYTES: usize = 1_000;
pub const MAX_PDF_BYTES: usize = 10_000_000;
/// Extracted text shorter than this means the PDF is scanned or otherwise unreadable.
pub const MIN_EXTRACTED_CHARS: usize = 100;

/// What the caller hands to the engine.
#[derive(Debug, Clone)]
pub enum SourceInput {
    /// An uploaded résumé PDF.
    Pdf(Vec<u8>),
    /// Résumé text that was already extracted elsewhere.
    Text(String),
    /// Already-structured content; skips richness classification.
    Structured(Box<CvContent>),
}

/// Raw text of the source résumé. Immutable once produced.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDocument {
    raw_text: String,
    byte_len: usize,
    char_count: usize,
}

impl SourceDocument {
    pub fn from_text(raw_text: impl Into<String>) -> Self {
        let raw_text = raw_text.into();
        Self {
            byte_len: raw_text.len(),
            char_count: raw_text.chars().count(),
            raw_text,
        }
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    pub fn char_count(&self) -> usize {
        self.char_count
    }
}

/// Checks the upload before any parsing is attempted.
pub fn validate_pdf(pdf_bytes: &[u8]) -> Result<(), EngineError> {
    if pdf_bytes.is_empty() {
        return Err(EngineError::InvalidSource("PDF file is empty".into()));
    }
    if pdf_bytes.len() < MIN_PDF_BYTES {
        return Err(EngineError::InvalidSource(
            "PDF file too small (<1KB) - may be corrupted or invalid".into(),
        ));
    }
    if pdf_bytes.len() > MAX_PDF_BYTES {
        return Err(EngineError::InvalidSource(
            "PDF file too large (>10MB) - please provide a smaller file".into(),
        ));
    }
    if !pdf_bytes.starts_with(b"%PDF") {
        return Err(EngineError::InvalidSource(
            "Invalid file format - not a valid PDF (missing PDF header)".into(),
        ));
    }
    Ok(())
}

/// Validates and extracts the text of a PDF résumé.
///
/// CPU-bound; call from `spawn_blocking`.
pub fn extract_text(pdf_bytes: &[u8]) -> Result<SourceDocument, EngineError> {
    validate_pdf(pdf_bytes)?;

    // pdf-extract panics on some malformed font programs instead of returning an error.
    let extracted = catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem(pdf_bytes)
    }))
    .map_err(|_| {
        warn!("pdf-extract panicked while reading source PDF");
        EngineError::InvalidSource("Failed to extract text from PDF".into())
    })?
    .map_err(|e| EngineError::InvalidSource(format!("Failed to extract text from PDF: {e}")))?;

    let doc = SourceDocument::from_text(extracted.trim());
    debug!(
        "Extracted {} chars ({} bytes) from {} byte PDF",
        doc.char_count(),
        doc.byte_len(),
        pdf_bytes.len()
    );
    ensure_readable(doc)
}

fn ensure_readable(doc: SourceDocument) -> Result<SourceDocument, EngineError> {
    if doc.char_count() < MIN_EXTRACTED_CHARS {
        return Err(EngineError::InvalidSource(
            "Failed to extract sufficient text from PDF. Please ensure PDF is readable.".into(),
        ));
    }
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{Renderer, TemplateRenderer};
    use crate::testing::sample_cv;

    #[test]
    fn test_empty_pdf_rejected() {
        let err = extract_text(&[]).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_small_pdf_rejected() {
        let err = validate_pdf(b"%PDF-1.4 tiny").unwrap_err();
        assert!(err.to_string().contains("too small"));
    }

    #[test]
    fn test_oversized_pdf_rejected() {
        let mut bytes = b"%PDF-1.4".to_vec();
        bytes.resize(MAX_PDF_BYTES + 1, b' ');
        let err = validate_pdf(&bytes).unwrap_err();
        assert!(err.to_string().contains("too large"));
    }

    #[test]
    fn test_missing_header_rejected() {
        let err = validate_pdf(&vec![b'x'; 2_000]).unwrap_err();
        assert!(err.to_string().contains("missing PDF header"));
        assert_eq!(err.code(), "INVALID_SOURCE");
    }

    #[test]
    fn test_short_text_rejected() {
        assert!(ensure_readable(SourceDocument::from_text("too short")).is_err());
        let doc = ensure_readable(SourceDocument::from_text("experience ".repeat(20))).unwrap();
        assert_eq!(doc.char_count(), 220);
    }

    #[test]
    fn test_char_count_is_unicode_aware() {
        let doc = SourceDocument::from_text("Société Générale");
        assert_eq!(doc.char_count(), 16);
        assert_eq!(doc.byte_len(), 20);
    }

    #[test]
    fn test_extracts_text_from_rendered_cv() {
        let pdf = TemplateRenderer::default()
            .render(&sample_cv(2, 3), false)
            .unwrap();
        let doc = extract_text(&pdf).unwrap();
        assert!(doc.raw_text().contains("Jane Doe"));
        assert!(doc.char_count() >= MIN_EXTRACTED_CHARS);
    }
}
