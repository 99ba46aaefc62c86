//! Content generation: the `ContentGenerator` capability and its LLM-backed
//! implementation.
//!
//! The controller and the enricher only see the trait. `LlmContentGenerator` is the
//! one place generator JSON enters the engine, and it always passes through
//! `models::aliases::normalize_generated` on the way in.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::errors::EngineError;
use crate::generation::padding::bullet_length_stats;
use crate::generation::prompts::{
    bullet_prompt, language_line, BASE_SYSTEM, BULLET_SYSTEM, RECOVERY_SYSTEM,
};
use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, NO_INVENTION_INSTRUCTION};
use crate::llm_client::{LlmClient, LlmError};
use crate::models::aliases::normalize_generated;
use crate::models::cv::{CvContent, ExperienceEntry, Language};

/// Words whose presence suggests the source describes work history.
const EXPERIENCE_SIGNALS: &[&str] = &[
    "experience",
    "expérience",
    "work",
    "job",
    "position",
    "consultant",
    "analyst",
    "manager",
    "intern",
    "stage",
    "company",
    "entreprise",
    "société",
];

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(19|20)\d{2}\b").unwrap());
static NUMBERING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+[.)]\s+").unwrap());

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum GenerationSource {
    /// Extracted résumé text.
    RawText(String),
    /// Already-structured content to be rewritten into the target language.
    Structured(Box<CvContent>),
}

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub source: GenerationSource,
    pub domain: String,
    pub language: Language,
    /// Strategy instruction bundle from the richness classifier.
    pub instructions: &'static str,
}

/// Everything the generator may see when asked for one extra bullet.
#[derive(Debug, Clone)]
pub struct BulletContext {
    pub position: String,
    pub company: String,
    pub existing_bullets: Vec<String>,
    pub domain: String,
    pub language: Language,
}

impl BulletContext {
    pub fn for_entry(entry: &ExperienceEntry, domain: &str, language: Language) -> Self {
        Self {
            position: entry.position.clone(),
            company: entry.company.clone(),
            existing_bullets: entry.bullets.clone(),
            domain: domain.to_string(),
            language,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// Content generation capability.
///
/// Carried by the controller as `Arc<dyn ContentGenerator>`.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Produces base content for one language.
    async fn generate(&self, request: &GenerationRequest) -> Result<CvContent, EngineError>;

    /// Produces exactly one additional bullet. Failures are absorbed by the enricher.
    async fn generate_bullet(&self, context: &BulletContext) -> Result<String, EngineError>;

    /// Targeted re-extraction of work experience, used when base generation returned
    /// none although the source clearly has some.
    async fn recover_experiences(
        &self,
        raw_text: &str,
        language: Language,
    ) -> Result<Vec<ExperienceEntry>, EngineError>;
}

/// True when generated content has no experience but the source text carries both
/// experience vocabulary and a plausible year.
pub fn needs_experience_recovery(raw_text: &str, content: &CvContent) -> bool {
    if !content.experience.is_empty() {
        return false;
    }
    let lower = raw_text.to_lowercase();
    let has_signals = EXPERIENCE_SIGNALS.iter().any(|s| lower.contains(s));
    has_signals && YEAR_RE.is_match(raw_text)
}

/// Strips list markers the model sometimes prepends to a single bullet.
pub fn clean_bullet(raw: &str) -> String {
    let text = raw.trim();
    let text = text
        .strip_prefix("- ")
        .or_else(|| text.strip_prefix("• "))
        .unwrap_or(text);
    NUMBERING_RE.replace(text, "").trim().to_string()
}

// ────────────────────────────────────────────────────────────────────────────
// LlmContentGenerator
// ────────────────────────────────────────────────────────────────────────────

pub struct LlmContentGenerator {
    llm: LlmClient,
}

impl LlmContentGenerator {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }

    fn base_system(request: &GenerationRequest) -> String {
        format!(
            "{BASE_SYSTEM}\n\n{NO_INVENTION_INSTRUCTION}\n\n{JSON_ONLY_SYSTEM}\n\n{}\n\n{}",
            language_line(request.language),
            request.instructions
        )
    }

    fn user_content(source: &GenerationSource) -> Result<String, EngineError> {
        match source {
            GenerationSource::RawText(text) => Ok(format!("Resume data: {text}")),
            GenerationSource::Structured(content) => {
                let json = serde_json::to_string(content).map_err(|e| {
                    EngineError::Internal(anyhow::anyhow!("Failed to serialize content: {e}"))
                })?;
                Ok(format!("Resume data: {json}"))
            }
        }
    }
}

fn generation_error(context: &str, e: LlmError) -> EngineError {
    EngineError::GenerationFailure(format!("{context}: {e}"))
}

#[async_trait]
impl ContentGenerator for LlmContentGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<CvContent, EngineError> {
        let system = Self::base_system(request);
        let prompt = Self::user_content(&request.source)?;

        let raw: Value = self
            .llm
            .call_json(&prompt, &system)
            .await
            .map_err(|e| generation_error("Base generation call failed", e))?;
        let content = normalize_generated(raw).map_err(|e| {
            EngineError::GenerationFailure(format!("Generator returned malformed CV JSON: {e}"))
        })?;

        let stats = bullet_length_stats(&content);
        if stats.total > 0 {
            info!(
                "Generated {} bullets for {}: avg {:.1} chars, {}/{} optimal, {} short, {} long",
                stats.total,
                request.language,
                stats.average,
                stats.optimal,
                stats.total,
                stats.too_short,
                stats.too_long
            );
        }
        for entry in &content.education {
            if entry.coursework.is_empty() {
                debug!("Education '{}' has no coursework", entry.institution);
            }
        }
        Ok(content)
    }

    async fn generate_bullet(&self, context: &BulletContext) -> Result<String, EngineError> {
        let prompt = bullet_prompt(context);
        let text = self
            .llm
            .call_text(&prompt, BULLET_SYSTEM)
            .await
            .map_err(|e| generation_error("Bullet generation call failed", e))?;

        let bullet = clean_bullet(&text);
        if bullet.is_empty() {
            return Err(EngineError::GenerationFailure(
                "Generator returned an empty bullet".into(),
            ));
        }
        Ok(bullet)
    }

    async fn recover_experiences(
        &self,
        raw_text: &str,
        language: Language,
    ) -> Result<Vec<ExperienceEntry>, EngineError> {
        let system = format!(
            "{RECOVERY_SYSTEM}\n\n{JSON_ONLY_SYSTEM}\n\n{}",
            language_line(language)
        );
        let prompt = format!("Source text:\n\n{raw_text}");

        let raw: Value = self
            .llm
            .call_json(&prompt, &system)
            .await
            .map_err(|e| generation_error("Experience recovery call failed", e))?;
        let recovered = normalize_generated(raw).map_err(|e| {
            EngineError::GenerationFailure(format!("Recovery returned malformed JSON: {e}"))
        })?;

        if recovered.experience.is_empty() {
            warn!("Experience recovery returned no entries");
        }
        Ok(recovered.experience)
    }
}
