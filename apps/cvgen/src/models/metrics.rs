use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::cv::Language;
use crate::richness::RichnessProfile;

/// Page fill measurement of one rendered PDF.
///
/// Only the density meter constructs these from real PDFs. For multi-page output
/// `fill_percentage` is the 100.0 overflow sentinel and must not be compared
/// against density thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageFillMetrics {
    pub page_count: u32,
    pub fill_percentage: f64,
    pub char_count: usize,
    pub text_height: Option<f64>,
    pub page_height: Option<f64>,
}

impl PageFillMetrics {
    /// Conservative result used when a PDF cannot be analysed.
    pub fn zero() -> Self {
        Self {
            page_count: 1,
            fill_percentage: 0.0,
            char_count: 0,
            text_height: None,
            page_height: None,
        }
    }

    pub fn is_multi_page(&self) -> bool {
        self.page_count > 1
    }

    /// Fill percentage usable for threshold comparisons, `None` in the overflow state.
    pub fn comparable_fill(&self) -> Option<f64> {
        if self.is_multi_page() {
            None
        } else {
            Some(self.fill_percentage)
        }
    }
}

/// User-facing warning severity, proportional to how much content was invented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Block,
    Critical,
    Error,
    Warning,
    Success,
}

/// Banner shown to the end user next to the generated CV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserWarning {
    pub severity: Severity,
    pub title: String,
    pub message: String,
}

/// How the final density landed relative to the optimal band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    InBand,
    BelowBandAccepted,
    AboveBandAccepted,
}

impl Outcome {
    pub fn is_suboptimal(self) -> bool {
        !matches!(self, Outcome::InBand)
    }
}

/// Terminal artifact bundle for one language of one request.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub language: Language,
    pub pdf_bytes: Bytes,
    pub docx_bytes: Bytes,
    pub metrics: PageFillMetrics,
    pub outcome: Outcome,
    /// Append-only audit trail of every decision taken for this language.
    pub warnings: Vec<String>,
    pub user_warning: UserWarning,
    pub profile: RichnessProfile,
    pub generated_at: DateTime<Utc>,
}

/// Serializable view of a `GenerationResult` without the binary payloads.
#[derive(Debug, Clone, Serialize)]
pub struct ResultSummary {
    pub language: Language,
    pub page_count: u32,
    pub fill_percentage: f64,
    pub char_count: usize,
    pub outcome: Outcome,
    pub suboptimal: bool,
    pub warnings: Vec<String>,
    pub user_warning: UserWarning,
    pub pdf_size: usize,
    pub docx_size: usize,
    pub generated_at: DateTime<Utc>,
}

impl GenerationResult {
    pub fn summary(&self) -> ResultSummary {
        ResultSummary {
            language: self.language,
            page_count: self.metrics.page_count,
            fill_percentage: self.metrics.fill_percentage,
            char_count: self.metrics.char_count,
            outcome: self.outcome,
            suboptimal: self.outcome.is_suboptimal(),
            warnings: self.warnings.clone(),
            user_warning: self.user_warning.clone(),
            pdf_size: self.pdf_bytes.len(),
            docx_size: self.docx_bytes.len(),
            generated_at: self.generated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_metrics_are_single_page_and_empty() {
        let m = PageFillMetrics::zero();
        assert_eq!(m.page_count, 1);
        assert_eq!(m.fill_percentage, 0.0);
        assert_eq!(m.char_count, 0);
        assert_eq!(m.comparable_fill(), Some(0.0));
    }

    #[test]
    fn test_multi_page_fill_is_not_comparable() {
        let m = PageFillMetrics {
            page_count: 2,
            fill_percentage: 100.0,
            char_count: 5000,
            text_height: None,
            page_height: None,
        };
        assert!(m.is_multi_page());
        assert_eq!(m.comparable_fill(), None);
    }

    #[test]
    fn test_outcome_suboptimal() {
        assert!(!Outcome::InBand.is_suboptimal());
        assert!(Outcome::BelowBandAccepted.is_suboptimal());
        assert_eq!(
            serde_json::to_string(&Outcome::AboveBandAccepted).unwrap(),
            "\"above_band_accepted\""
        );
    }
}
