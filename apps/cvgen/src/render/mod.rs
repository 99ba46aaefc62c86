// CV rendering: CvContent → PDF bytes, and final PDF → DOCX.
// Rendering is synchronous and CPU-bound; the controller runs it inside
// tokio::task::spawn_blocking under a timeout.

pub mod docx;
pub mod normalize;
pub mod pdf_writer;
pub mod template;

use thiserror::Error;

use crate::models::cv::CvContent;

pub use template::TemplateRenderer;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("PDF generation failed: {0}")]
    Pdf(String),

    #[error("DOCX conversion failed: {0}")]
    Docx(String),
}

/// Template rendering capability.
///
/// `trim_mode` asks for compact spacing between sections and entries. It never drops
/// content: what the controller passes in is exactly what lands on the page. The
/// controller sets it on every render that follows a trim pass.
pub trait Renderer: Send + Sync {
    fn render(&self, content: &CvContent, trim_mode: bool) -> Result<Vec<u8>, RenderError>;

    fn to_docx(&self, pdf_bytes: &[u8]) -> Result<Vec<u8>, RenderError>;
}
