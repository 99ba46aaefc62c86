//! PDF → DOCX conversion.
//!
//! The DOCX is rebuilt from the text of the final PDF, one paragraph per printed line,
//! so it always matches the converged PDF exactly. Section headings (all-caps lines)
//! are set in bold.

use std::io::Cursor;

use docx_rs::{Docx, Paragraph, Run};

use crate::layout::pdf_text::extract_pages;
use crate::render::RenderError;

/// Body text size in half-points.
const BODY_SIZE: usize = 18;
const HEADING_SIZE: usize = 21;

pub fn pdf_to_docx(pdf_bytes: &[u8]) -> Result<Vec<u8>, RenderError> {
    let pages = extract_pages(pdf_bytes).map_err(|e| RenderError::Docx(e.to_string()))?;

    let mut docx = Docx::new();
    for page in &pages {
        for line in page.lines() {
            docx = docx.add_paragraph(paragraph_for(&line));
        }
    }

    let mut buf = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buf)
        .map_err(|e| RenderError::Docx(e.to_string()))?;
    Ok(buf.into_inner())
}

fn paragraph_for(line: &str) -> Paragraph {
    let run = Run::new().add_text(line);
    let run = if is_heading(line) {
        run.bold().size(HEADING_SIZE)
    } else {
        run.size(BODY_SIZE)
    };
    Paragraph::new().add_run(run)
}

fn is_heading(line: &str) -> bool {
    line.chars().any(char::is_alphabetic)
        && line
            .chars()
            .filter(|c| c.is_alphabetic())
            .all(char::is_uppercase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::template::TemplateRenderer;
    use crate::render::Renderer;
    use crate::testing::sample_cv;

    #[test]
    fn test_docx_round_trips_through_reader() {
        let pdf = TemplateRenderer::default()
            .render(&sample_cv(2, 2), false)
            .unwrap();
        let bytes = pdf_to_docx(&pdf).unwrap();
        assert!(bytes.starts_with(b"PK"));
        let doc = docx_rs::read_docx(&bytes).unwrap();
        assert!(!doc.document.children.is_empty());
    }

    #[test]
    fn test_invalid_pdf_is_a_docx_error() {
        let err = pdf_to_docx(b"nope").unwrap_err();
        assert!(matches!(err, RenderError::Docx(_)));
    }

    #[test]
    fn test_heading_detection() {
        assert!(is_heading("SKILLS & ACTIVITIES"));
        assert!(!is_heading("Jane Doe"));
        assert!(!is_heading("2021-2023"));
    }
}
