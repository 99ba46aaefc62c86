//! Page Fill Rate (PFR) measurement and the density thresholds that act on it.
//!
//! PFR is the vertical extent of the text on a page (top of the highest glyph box to
//! the bottom of the lowest one) as a percentage of the page height. It is measured on
//! the actual rendered PDF, never estimated from content length.
//!
//! # Overflow sentinel
//! A multi-page document reports `fill_percentage = 100.0`. That value means "overflow",
//! not "full page", and the predicates below check `page_count` before comparing fill.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::layout::pdf_text::extract_pages;
use crate::models::metrics::{Outcome, PageFillMetrics};

// ────────────────────────────────────────────────────────────────────────────
// Thresholds
// ────────────────────────────────────────────────────────────────────────────

pub const BLOCK_THRESHOLD: f64 = 40.0;
pub const OPTIMAL_MIN_LENIENT: f64 = 86.0;
pub const OPTIMAL_MIN_STRICT: f64 = 90.0;
pub const OPTIMAL_MAX: f64 = 95.0;
pub const TRIM_THRESHOLD: f64 = 95.0;
pub const MINIMUM_CHARS: usize = 2200;
pub const ENRICHMENT_TARGET: f64 = 92.0;
pub const CORRECTIVE_TARGET: f64 = 88.0;
pub const POST_TRIM_ENRICH_BELOW: f64 = 85.0;
pub const OVERFLOW_SENTINEL: f64 = 100.0;

/// Block thresholds used by earlier product revisions, selectable through config.
pub const LEGACY_BLOCK_THRESHOLDS: [f64; 2] = [65.0, 70.0];

/// The full set of density thresholds the controller acts on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DensityPolicy {
    pub block_threshold: f64,
    pub optimal_min: f64,
    pub optimal_max: f64,
    pub trim_above: f64,
    pub min_chars: usize,
    pub enrichment_target: f64,
    pub corrective_target: f64,
    pub post_trim_enrich_below: f64,
}

impl Default for DensityPolicy {
    fn default() -> Self {
        Self::lenient()
    }
}

impl DensityPolicy {
    /// Accepts rich CVs that plateau in the 86-90% range.
    pub fn lenient() -> Self {
        Self {
            block_threshold: BLOCK_THRESHOLD,
            optimal_min: OPTIMAL_MIN_LENIENT,
            optimal_max: OPTIMAL_MAX,
            trim_above: TRIM_THRESHOLD,
            min_chars: MINIMUM_CHARS,
            enrichment_target: ENRICHMENT_TARGET,
            corrective_target: CORRECTIVE_TARGET,
            post_trim_enrich_below: POST_TRIM_ENRICH_BELOW,
        }
    }

    /// Strict 90-95% band.
    pub fn strict() -> Self {
        Self {
            optimal_min: OPTIMAL_MIN_STRICT,
            ..Self::lenient()
        }
    }

    pub fn with_block_threshold(self, block_threshold: f64) -> Self {
        Self {
            block_threshold,
            ..self
        }
    }

    pub fn is_overflow(&self, metrics: &PageFillMetrics) -> bool {
        metrics.page_count > 1
    }

    pub fn needs_trim(&self, metrics: &PageFillMetrics) -> bool {
        self.is_overflow(metrics) || metrics.fill_percentage > self.trim_above
    }

    pub fn is_blocked(&self, metrics: &PageFillMetrics) -> bool {
        !self.is_overflow(metrics) && metrics.fill_percentage < self.block_threshold
    }

    pub fn needs_enrichment(&self, metrics: &PageFillMetrics) -> bool {
        !self.is_overflow(metrics)
            && metrics.fill_percentage >= self.block_threshold
            && metrics.fill_percentage < self.optimal_min
    }

    pub fn in_band(&self, metrics: &PageFillMetrics) -> bool {
        !self.is_overflow(metrics)
            && (self.optimal_min..=self.optimal_max).contains(&metrics.fill_percentage)
    }

    /// In band and carrying enough characters to read as a complete CV.
    pub fn is_acceptable(&self, metrics: &PageFillMetrics) -> bool {
        self.in_band(metrics) && metrics.char_count >= self.min_chars
    }

    /// Where a single-page result landed relative to the band.
    pub fn classify_outcome(&self, metrics: &PageFillMetrics) -> Outcome {
        if metrics.fill_percentage < self.optimal_min {
            Outcome::BelowBandAccepted
        } else if metrics.fill_percentage > self.optimal_max {
            Outcome::AboveBandAccepted
        } else {
            Outcome::InBand
        }
    }

    pub fn status_message(&self, metrics: &PageFillMetrics) -> String {
        let fill = metrics.fill_percentage;
        if self.is_overflow(metrics) {
            format!(
                "OVERFLOW: {} pages. Content must be trimmed.",
                metrics.page_count
            )
        } else if self.is_blocked(metrics) {
            format!(
                "BLOCKED: {fill}% fill (< {}%). More content required from user.",
                self.block_threshold
            )
        } else if self.needs_enrichment(metrics) {
            format!(
                "ENRICHMENT REQUIRED: {fill}% fill ({}-{}%). Will enrich to ~{}%.",
                self.block_threshold, self.optimal_min, self.enrichment_target
            )
        } else if self.is_acceptable(metrics) {
            format!("ACCEPTED: {fill}% fill, {} chars.", metrics.char_count)
        } else if fill > self.trim_above {
            format!("TRIM: {fill}% fill (> {}%). Will trim slightly.", self.trim_above)
        } else {
            format!("Status: {fill}% fill, {} chars.", metrics.char_count)
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Measurement
// ────────────────────────────────────────────────────────────────────────────

/// Measures the page fill of a rendered PDF. Never fails: unreadable input yields
/// `PageFillMetrics::zero()`, which every caller treats as "blocked".
pub fn measure(pdf_bytes: &[u8]) -> PageFillMetrics {
    let pages = match extract_pages(pdf_bytes) {
        Ok(pages) if !pages.is_empty() => pages,
        Ok(_) => {
            debug!("PDF has no pages; reporting zero fill");
            return PageFillMetrics::zero();
        }
        Err(e) => {
            warn!("Density measurement failed, reporting zero fill: {e}");
            return PageFillMetrics::zero();
        }
    };

    if pages.len() > 1 {
        let total_text: String = pages.iter().map(|p| p.text()).collect();
        return PageFillMetrics {
            page_count: pages.len() as u32,
            fill_percentage: OVERFLOW_SENTINEL,
            char_count: total_text.trim().chars().count(),
            text_height: None,
            page_height: None,
        };
    }

    let page = &pages[0];
    let page_height = page.height as f64;
    let char_count = page.text().trim().chars().count();

    let text_height = page
        .spans
        .iter()
        .map(|s| s.top())
        .reduce(f32::max)
        .zip(page.spans.iter().map(|s| s.bottom()).reduce(f32::min))
        .map(|(top, bottom)| (top - bottom) as f64)
        .unwrap_or(0.0);

    let fill_percentage = if page_height > 0.0 {
        round1((text_height / page_height * 100.0).clamp(0.0, 100.0))
    } else {
        0.0
    };

    PageFillMetrics {
        page_count: 1,
        fill_percentage,
        char_count,
        text_height: Some(text_height),
        page_height: Some(page_height),
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
