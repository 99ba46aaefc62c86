use serde_json::{json, Value};
use thiserror::Error;

use crate::generation::blocking::BlockReport;

/// Engine-level error type.
/// Every fatal condition of a generation request surfaces as one of these variants;
/// non-fatal conditions (failed single bullets, suboptimal density) never do.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{0}")]
    BlockedInput(Box<BlockReport>),

    #[error("Invalid source: {0}")]
    InvalidSource(String),

    #[error("Content generation failed: {0}")]
    GenerationFailure(String),

    #[error("Rendering failed: {0}")]
    RenderFailure(String),

    #[error("Rendering timed out after {0}s")]
    RenderTimeout(u64),

    #[error("Unable to fit CV on one page: {pages} pages remain after aggressive trimming")]
    OverflowUnresolved { pages: u32 },

    #[error("Final validation failed: {0}")]
    FinalValidation(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl EngineError {
    /// Stable machine-readable code for hosts that surface the error to end users.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::BlockedInput(_) => "BLOCKED_INPUT",
            EngineError::InvalidSource(_) => "INVALID_SOURCE",
            EngineError::GenerationFailure(_) => "GENERATION_FAILURE",
            EngineError::RenderFailure(_) => "RENDER_FAILURE",
            EngineError::RenderTimeout(_) => "RENDER_TIMEOUT",
            EngineError::OverflowUnresolved { .. } => "OVERFLOW_UNRESOLVED",
            EngineError::FinalValidation(_) => "FINAL_VALIDATION_FAILED",
            EngineError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// True for errors that the caller can fix by providing a richer source document.
    pub fn is_user_actionable(&self) -> bool {
        matches!(
            self,
            EngineError::BlockedInput(_) | EngineError::InvalidSource(_)
        )
    }

    /// JSON body in the shape `{"error": {"code", "message"}}`.
    ///
    /// Blocked requests also carry the structured remediation list so a host can
    /// render it instead of a bare failure message.
    pub fn to_json(&self) -> Value {
        match self {
            EngineError::BlockedInput(report) => json!({
                "error": {
                    "code": self.code(),
                    "message": report.headline(),
                    "remediation": report.remediation,
                }
            }),
            EngineError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                json!({
                    "error": {
                        "code": self.code(),
                        "message": "An internal error occurred"
                    }
                })
            }
            other => json!({
                "error": {
                    "code": other.code(),
                    "message": other.to_string()
                }
            }),
        }
    }
}

impl From<BlockReport> for EngineError {
    fn from(report: BlockReport) -> Self {
        EngineError::BlockedInput(Box::new(report))
    }
}
