//! Blocking payload returned when a request cannot produce an acceptable one-page CV.
//!
//! The report is the user-facing side of `EngineError::BlockedInput`: a reason plus a
//! fixed remediation checklist the host can render as-is.

use std::fmt;

use serde::Serialize;

use crate::models::cv::Language;

/// Why the request was blocked.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockReason {
    /// The source document is too short to build a CV from.
    SparseSource { char_count: usize },
    /// Base generation rendered below the hard density floor.
    DensityBelowBlock {
        language: Language,
        fill_percentage: f64,
        threshold: f64,
    },
}

/// One remediation option with its checklist.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Remediation {
    pub title: &'static str,
    pub items: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockReport {
    pub reason: BlockReason,
    pub remediation: Vec<Remediation>,
}

impl BlockReport {
    pub fn sparse_source(char_count: usize) -> Self {
        Self {
            reason: BlockReason::SparseSource { char_count },
            remediation: default_remediation(),
        }
    }

    pub fn density_below_block(language: Language, fill_percentage: f64, threshold: f64) -> Self {
        Self {
            reason: BlockReason::DensityBelowBlock {
                language,
                fill_percentage,
                threshold,
            },
            remediation: default_remediation(),
        }
    }

    /// One-line summary suitable for an error banner.
    pub fn headline(&self) -> String {
        match &self.reason {
            BlockReason::SparseSource { char_count } => format!(
                "GENERATION BLOCKED: source document has only {char_count} characters of content"
            ),
            BlockReason::DensityBelowBlock {
                language,
                fill_percentage,
                threshold,
            } => format!(
                "GENERATION BLOCKED: PFR {fill_percentage}% in {} (minimum required: {threshold}%)",
                language.code().to_uppercase()
            ),
        }
    }
}

impl fmt::Display for BlockReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.headline())?;
        writeln!(f)?;
        writeln!(
            f,
            "Your CV does not contain enough content. Please provide more detailed information using ONE OR BOTH options below:"
        )?;
        for option in &self.remediation {
            writeln!(f)?;
            writeln!(f, "{}", option.title)?;
            for item in &option.items {
                writeln!(f, "  • {item}")?;
            }
        }
        writeln!(f)?;
        write!(f, "After providing more information, regenerate your CV.")
    }
}

fn default_remediation() -> Vec<Remediation> {
    vec![
        Remediation {
            title: "OPTION A: DETAIL EXISTING EXPERIENCES",
            items: vec![
                "More bullet points (3-5 per role)",
                "Quantified outcomes (metrics, percentages, amounts)",
                "Specific tools/methodologies used",
                "Team size or stakeholders involved",
                "Detailed project scope and deliverables",
            ],
        },
        Remediation {
            title: "OPTION B: ADD NEW EXPERIENCE",
            items: vec![
                "Date range (Mon YYYY - Mon YYYY)",
                "Role/position title",
                "Organization name",
                "Location (City, Country)",
                "Duration",
                "3-5 detailed bullet points with achievements",
            ],
        },
        Remediation {
            title: "YOU MAY ALSO ADD",
            items: vec![
                "Additional education entries with coursework",
                "Certifications with details",
                "More extracurricular activities with specific roles",
                "Languages with proficiency levels",
                "Technical skills with proficiency",
            ],
        },
    ]
}
