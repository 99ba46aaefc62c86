// Page geometry, font metrics and page-fill measurement.
// Measurement is CPU-bound and must run inside tokio::task::spawn_blocking.

pub mod density;
pub mod font_metrics;
pub mod pdf_text;

pub use density::{measure, DensityPolicy};
pub use font_metrics::{default_page_config, get_metrics, FontFamily, PageConfig};
