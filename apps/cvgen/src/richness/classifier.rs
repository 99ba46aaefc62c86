//! Source richness tiers.
//!
//! The tier is decided purely on the character count of the extracted source text and
//! drives three things downstream: the generation instruction bundle, the character
//! budget used for padding, and the severity of the warning shown to the user.

use serde::{Deserialize, Serialize};

use crate::models::metrics::Severity;

// ────────────────────────────────────────────────────────────────────────────
// Thresholds (inclusive lower bounds)
// ────────────────────────────────────────────────────────────────────────────

pub const CRITICAL_THRESHOLD: usize = 600;
pub const POOR_THRESHOLD: usize = 1200;
pub const MEDIUM_THRESHOLD: usize = 1800;
pub const RICH_THRESHOLD: usize = 2500;

/// Character budget assumed for already-structured input.
pub const STRUCTURED_TARGET_CHARS: usize = 2700;

// ────────────────────────────────────────────────────────────────────────────
// Types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Empty,
    Critical,
    Poor,
    Medium,
    Rich,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Block,
    UltraAggressive,
    Aggressive,
    Moderate,
    Minimal,
}

/// Classification of one source document. Constructed by `classify` (or
/// `structured_input_profile`) and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RichnessProfile {
    pub tier: Tier,
    pub strategy: Strategy,
    /// Character budget the generated content is padded toward. Zero when blocked.
    pub target_char_count: usize,
    /// Informational fill band, e.g. `"90-92%"`. `"N/A"` when blocked.
    pub target_pfr_label: &'static str,
    pub warning_severity: Severity,
    /// Estimated share of invented content, e.g. `"30-50%"`.
    pub invention_rate: &'static str,
    /// Unicode scalar count of the classified text.
    pub source_chars: usize,
}

impl RichnessProfile {
    pub fn is_blocked(&self) -> bool {
        self.strategy == Strategy::Block
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Classification
// ────────────────────────────────────────────────────────────────────────────

/// Classifies raw source text. Total over all inputs, including `""`.
pub fn classify(raw_text: &str) -> RichnessProfile {
    let chars = raw_text.chars().count();

    let (tier, strategy, target_char_count, target_pfr_label, warning_severity, invention_rate) =
        if chars < CRITICAL_THRESHOLD {
            (Tier::Empty, Strategy::Block, 0, "N/A", Severity::Block, "N/A")
        } else if chars < POOR_THRESHOLD {
            (
                Tier::Critical,
                Strategy::UltraAggressive,
                3800,
                "90-92%",
                Severity::Critical,
                "50-70%",
            )
        } else if chars < MEDIUM_THRESHOLD {
            (
                Tier::Poor,
                Strategy::Aggressive,
                3500,
                "90-92%",
                Severity::Error,
                "30-50%",
            )
        } else if chars < RICH_THRESHOLD {
            (
                Tier::Medium,
                Strategy::Moderate,
                3200,
                "90-92%",
                Severity::Warning,
                "10-30%",
            )
        } else {
            (
                Tier::Rich,
                Strategy::Minimal,
                3400,
                "88-90%",
                Severity::Success,
                "0-10%",
            )
        };

    RichnessProfile {
        tier,
        strategy,
        target_char_count,
        target_pfr_label,
        warning_severity,
        invention_rate,
        source_chars: chars,
    }
}

/// Fixed profile for input that arrives already structured: it is treated as rich.
pub fn structured_input_profile() -> RichnessProfile {
    RichnessProfile {
        tier: Tier::Rich,
        strategy: Strategy::Minimal,
        target_char_count: STRUCTURED_TARGET_CHARS,
        target_pfr_label: "86-88%",
        warning_severity: Severity::Success,
        invention_rate: "0-10%",
        source_chars: 0,
    }
}
