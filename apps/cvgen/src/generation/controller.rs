//! Convergence controller: drives one request from source to final artifacts.
//!
//! Flow per request:
//!   resolve source → classify richness → block on sparse source →
//!   base generation per language (recovery + padding) → render + measure →
//!   block on the lowest base fill → single-pass correction per language →
//!   final validation → DOCX → `GenerationResult`.
//!
//! Correction is bounded: at most one enrichment pass and one trim pass per language.
//! The overflow trim ladder (light → moderate → aggressive) counts as the single trim
//! pass. Every decision is appended to the language's audit trail and logged.

use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::Tunables;
use crate::errors::EngineError;
use crate::extraction::{self, SourceDocument, SourceInput};
use crate::generation::blocking::BlockReport;
use crate::generation::enricher::{Enricher, EnrichmentContext, EnrichmentReport};
use crate::generation::generator::{
    needs_experience_recovery, ContentGenerator, GenerationRequest, GenerationSource,
};
use crate::generation::padding::pad_to_target;
use crate::generation::trimmer::{TrimSeverity, Trimmer};
use crate::layout::density::{measure, OPTIMAL_MIN_STRICT};
use crate::models::cv::{CvContent, Language};
use crate::models::metrics::{GenerationResult, Outcome, PageFillMetrics};
use crate::render::Renderer;
use crate::richness::{
    classify, instructions_for, structured_input_profile, warning_for, RichnessProfile,
};

// ────────────────────────────────────────────────────────────────────────────
// Internal state
// ────────────────────────────────────────────────────────────────────────────

/// One rendered snapshot. `content` is exactly what is on the page, and `trim_mode`
/// is the spacing it was laid out with. Reverting is a swap back to an earlier
/// `Attempt`.
#[derive(Clone)]
struct Attempt {
    content: Arc<CvContent>,
    trim_mode: bool,
    pdf: Arc<Vec<u8>>,
    metrics: PageFillMetrics,
}

/// Append-only decision log for one language, mirrored to `tracing`.
struct AuditTrail {
    language: Language,
    entries: Vec<String>,
}

impl AuditTrail {
    fn new(language: Language) -> Self {
        Self {
            language,
            entries: Vec::new(),
        }
    }

    fn push(&mut self, entry: impl Into<String>) {
        let entry = entry.into();
        info!(language = %self.language, "{entry}");
        self.entries.push(entry);
    }

    fn record_enrichment(&mut self, report: &EnrichmentReport) {
        self.push(format!(
            "Enrichment pass: {} bullet(s) requested, {} attempted, {} added, {} failed",
            report.requested, report.attempted, report.added, report.failed
        ));
    }
}

struct ResolvedSource {
    profile: RichnessProfile,
    generation_source: GenerationSource,
    /// Present for text and PDF sources; drives experience recovery.
    raw_text: Option<String>,
}

struct BaseRender {
    language: Language,
    attempt: Attempt,
    trail: AuditTrail,
}

// ────────────────────────────────────────────────────────────────────────────
// Controller
// ────────────────────────────────────────────────────────────────────────────

pub struct ConvergenceController {
    generator: Arc<dyn ContentGenerator>,
    renderer: Arc<dyn Renderer>,
    enricher: Enricher,
    trimmer: Trimmer,
    tunables: Tunables,
}

impl ConvergenceController {
    pub fn new(
        generator: Arc<dyn ContentGenerator>,
        renderer: Arc<dyn Renderer>,
        tunables: Tunables,
    ) -> Self {
        Self {
            enricher: Enricher::new(generator.clone(), tunables.bullet_pfr_yield),
            trimmer: Trimmer::new(tunables.trim_ratios),
            generator,
            renderer,
            tunables,
        }
    }

    /// Generates one single-page CV per requested language.
    ///
    /// An empty `languages` slice means both languages. Duplicates are ignored.
    pub async fn generate(
        &self,
        source: SourceInput,
        domain: &str,
        languages: &[Language],
    ) -> Result<BTreeMap<Language, GenerationResult>, EngineError> {
        let request_id = Uuid::new_v4();
        let span = info_span!("cv_generation", %request_id, domain);
        self.run(source, domain, languages).instrument(span).await
    }

    async fn run(
        &self,
        source: SourceInput,
        domain: &str,
        languages: &[Language],
    ) -> Result<BTreeMap<Language, GenerationResult>, EngineError> {
        let languages = dedup_languages(languages);
        let resolved = self.resolve_source(source).await?;
        let profile = &resolved.profile;

        info!(
            "Source classified: {:?} tier, {:?} strategy, {} chars, target {} chars ({})",
            profile.tier,
            profile.strategy,
            profile.source_chars,
            profile.target_char_count,
            profile.target_pfr_label
        );
        if profile.is_blocked() {
            warn!("Blocking request: source has {} chars", profile.source_chars);
            return Err(BlockReport::sparse_source(profile.source_chars).into());
        }

        let mut bases = Vec::with_capacity(languages.len());
        for &language in &languages {
            bases.push(self.base_render(&resolved, domain, language).await?);
        }

        // The whole request is blocked when any single-page base is under the floor.
        let policy = &self.tunables.policy;
        let lowest = bases
            .iter()
            .filter_map(|b| b.attempt.metrics.comparable_fill().map(|f| (b.language, f)))
            .min_by(|a, b| a.1.total_cmp(&b.1));
        if let Some((language, fill)) = lowest {
            if fill < policy.block_threshold {
                warn!("Blocking request: base PFR {fill}% in {language}");
                return Err(BlockReport::density_below_block(
                    language,
                    fill,
                    policy.block_threshold,
                )
                .into());
            }
        }

        let mut results = BTreeMap::new();
        for base in bases {
            let language = base.language;
            let result = self.converge(base, domain, profile).await?;
            results.insert(language, result);
        }
        Ok(results)
    }

    async fn resolve_source(&self, source: SourceInput) -> Result<ResolvedSource, EngineError> {
        let document = match source {
            SourceInput::Structured(content) => {
                return Ok(ResolvedSource {
                    profile: structured_input_profile(),
                    generation_source: GenerationSource::Structured(content),
                    raw_text: None,
                });
            }
            SourceInput::Text(text) => SourceDocument::from_text(text.trim()),
            SourceInput::Pdf(bytes) => {
                tokio::task::spawn_blocking(move || extraction::extract_text(&bytes))
                    .await
                    .map_err(|e| {
                        EngineError::Internal(anyhow::anyhow!("Extraction task failed: {e}"))
                    })??
            }
        };

        let raw_text = document.raw_text().to_string();
        Ok(ResolvedSource {
            profile: classify(&raw_text),
            generation_source: GenerationSource::RawText(raw_text.clone()),
            raw_text: Some(raw_text),
        })
    }

    /// Base generation for one language: generate, recover missing experience, pad,
    /// then render and measure once.
    async fn base_render(
        &self,
        resolved: &ResolvedSource,
        domain: &str,
        language: Language,
    ) -> Result<BaseRender, EngineError> {
        let mut trail = AuditTrail::new(language);
        let request = GenerationRequest {
            source: resolved.generation_source.clone(),
            domain: domain.to_string(),
            language,
            instructions: instructions_for(resolved.profile.strategy, language),
        };
        let mut content = self.generator.generate(&request).await?;

        // Part of base generation, not a correction pass: it does not consume the
        // enrichment budget.
        if let Some(raw_text) = resolved.raw_text.as_deref() {
            if needs_experience_recovery(raw_text, &content) {
                trail.push("Base generation returned no experience - running targeted recovery");
                match self.generator.recover_experiences(raw_text, language).await {
                    Ok(entries) if !entries.is_empty() => {
                        trail.push(format!("Recovered {} experience(s)", entries.len()));
                        content.experience = entries;
                    }
                    Ok(_) => trail.push("Recovery found no experience"),
                    Err(e) => {
                        warn!("Experience recovery failed: {e}");
                        trail.push("Recovery failed - continuing without experience");
                    }
                }
            }
        }

        let content = pad_to_target(&content, resolved.profile.target_char_count, language);
        let attempt = self.render_attempt(Arc::new(content), false).await?;
        info!(
            language = %language,
            "Base render: {}",
            self.tunables.policy.status_message(&attempt.metrics)
        );
        Ok(BaseRender {
            language,
            attempt,
            trail,
        })
    }

    /// Single-pass correction of one language, then final validation and assembly.
    async fn converge(
        &self,
        base: BaseRender,
        domain: &str,
        profile: &RichnessProfile,
    ) -> Result<GenerationResult, EngineError> {
        let BaseRender {
            language,
            attempt,
            mut trail,
        } = base;
        let policy = self.tunables.policy;
        let initial = attempt.metrics.fill_percentage;
        let mut current = attempt;
        trail.push(format!("PFR initial: {initial}%"));

        if policy.is_overflow(&current.metrics) {
            trail.push(format!(
                "Multi-page output ({} pages) - applying trim ladder",
                current.metrics.page_count
            ));
            for severity in TrimSeverity::LADDER {
                if !policy.is_overflow(&current.metrics) {
                    break;
                }
                let trimmed = self.trimmer.trim(&current.content, severity);
                current = self.render_attempt(Arc::new(trimmed), true).await?;
                trail.push(format!(
                    "After {} trimming (step {}): {}%, {} page(s)",
                    severity.label(),
                    severity.step(),
                    current.metrics.fill_percentage,
                    current.metrics.page_count
                ));
            }
            if policy.is_overflow(&current.metrics) {
                return Err(EngineError::OverflowUnresolved {
                    pages: current.metrics.page_count,
                });
            }

            let fill = current.metrics.fill_percentage;
            if fill < policy.post_trim_enrich_below {
                trail.push(format!(
                    "Trimming left PFR at {fill}% - applying corrective enrichment (target {}%)",
                    policy.corrective_target
                ));
                let trimmed = current.clone();
                let candidate = self
                    .enrich_and_render(&trimmed, domain, language, policy.corrective_target, &mut trail)
                    .await?;
                trail.push(format!(
                    "After corrective enrichment: {}%, {} page(s)",
                    candidate.metrics.fill_percentage, candidate.metrics.page_count
                ));
                if policy.is_overflow(&candidate.metrics) {
                    trail.push(format!(
                        "Enrichment caused multi-page output - reverting to trimmed version ({}%)",
                        trimmed.metrics.fill_percentage
                    ));
                    current = trimmed;
                } else {
                    current = candidate;
                }
            } else if fill < OPTIMAL_MIN_STRICT {
                trail.push(format!(
                    "PFR {fill}% in acceptable range [{}-{OPTIMAL_MIN_STRICT}%] after trimming - no enrichment",
                    policy.post_trim_enrich_below
                ));
            }
        } else if policy.needs_trim(&current.metrics) {
            trail.push(format!(
                "PFR {initial}% > {}% - applying light trimming",
                policy.trim_above
            ));
            let trimmed = self.trimmer.trim(&current.content, TrimSeverity::Light);
            current = self.render_attempt(Arc::new(trimmed), true).await?;
            trail.push(format!(
                "After trimming: {}% (delta: {:+.1}%)",
                current.metrics.fill_percentage,
                current.metrics.fill_percentage - initial
            ));
        } else if current.metrics.fill_percentage < policy.optimal_min {
            trail.push(format!(
                "PFR {initial}% < {}% - applying incremental enrichment (single pass)",
                policy.optimal_min
            ));
            let before = current.clone();
            current = self
                .enrich_and_render(&before, domain, language, policy.enrichment_target, &mut trail)
                .await?;
            let fill = current.metrics.fill_percentage;
            trail.push(format!(
                "After incremental enrichment: {fill}% (delta: {:+.1}%)",
                fill - initial
            ));

            if policy.needs_trim(&current.metrics) {
                trail.push(format!(
                    "Enrichment overshoot: {fill}% > {}% - applying light trimming",
                    policy.trim_above
                ));
                let trimmed = self.trimmer.trim(&current.content, TrimSeverity::Light);
                current = self.render_attempt(Arc::new(trimmed), true).await?;
                trail.push(format!(
                    "After corrective trimming: {}%",
                    current.metrics.fill_percentage
                ));
                if policy.is_overflow(&current.metrics) {
                    trail.push(format!(
                        "Still {} pages - reverting to pre-enrichment version ({}%)",
                        current.metrics.page_count, before.metrics.fill_percentage
                    ));
                    current = before;
                }
            }
        } else {
            trail.push(format!(
                "PFR {initial}% already in optimal zone [{}-{}%] - no adjustment needed",
                policy.optimal_min, policy.optimal_max
            ));
        }

        let outcome = self.validate_final(language, &current.metrics, &mut trail)?;
        let docx = self.convert_docx(current.pdf.clone()).await?;

        Ok(GenerationResult {
            language,
            pdf_bytes: Bytes::copy_from_slice(&current.pdf),
            docx_bytes: Bytes::from(docx),
            metrics: current.metrics,
            outcome,
            warnings: trail.entries,
            user_warning: warning_for(profile.strategy),
            profile: profile.clone(),
            generated_at: Utc::now(),
        })
    }

    async fn enrich_and_render(
        &self,
        from: &Attempt,
        domain: &str,
        language: Language,
        target_pfr: f64,
        trail: &mut AuditTrail,
    ) -> Result<Attempt, EngineError> {
        let ctx = EnrichmentContext {
            domain,
            language,
            target_pfr,
        };
        let (enriched, report) = self.enricher.enrich(&from.content, &from.metrics, &ctx).await;
        trail.record_enrichment(&report);
        if report.added == 0 {
            // Nothing changed; the existing render is still exact.
            return Ok(from.clone());
        }
        // Keep the spacing of the attempt being enriched so a trimmed page is not
        // re-expanded.
        self.render_attempt(Arc::new(enriched), from.trim_mode).await
    }

    fn validate_final(
        &self,
        language: Language,
        metrics: &PageFillMetrics,
        trail: &mut AuditTrail,
    ) -> Result<Outcome, EngineError> {
        let policy = &self.tunables.policy;
        if metrics.page_count != 1 {
            return Err(EngineError::FinalValidation(format!(
                "CV must be exactly one page. Current: {} pages.",
                metrics.page_count
            )));
        }
        let fill = metrics.fill_percentage;
        if fill < policy.block_threshold {
            return Err(EngineError::FinalValidation(format!(
                "{} must have PFR >= {}%. Current: {fill}%",
                language.code().to_uppercase(),
                policy.block_threshold
            )));
        }

        let outcome = policy.classify_outcome(metrics);
        match outcome {
            Outcome::InBand => trail.push(format!(
                "SUCCESS: Final PFR {fill}% in optimal zone [{}-{}%]",
                policy.optimal_min, policy.optimal_max
            )),
            Outcome::BelowBandAccepted => trail.push(format!(
                "SUBOPTIMAL: Final PFR {fill}% below target [{}-{}%] - accepted (single-pass limit)",
                policy.block_threshold, policy.optimal_min
            )),
            Outcome::AboveBandAccepted => trail.push(format!(
                "SUBOPTIMAL: Final PFR {fill}% above target (>{}%) - accepted (single-pass limit)",
                policy.optimal_max
            )),
        }
        if outcome == Outcome::InBand && !policy.is_acceptable(metrics) {
            trail.push(format!(
                "Note: {} chars is under the {} char guideline for a complete CV",
                metrics.char_count, policy.min_chars
            ));
        }
        Ok(outcome)
    }

    /// Renders and measures on the blocking pool under the configured timeout.
    async fn render_attempt(
        &self,
        content: Arc<CvContent>,
        trim_mode: bool,
    ) -> Result<Attempt, EngineError> {
        let renderer = Arc::clone(&self.renderer);
        let snapshot = Arc::clone(&content);
        let task = tokio::task::spawn_blocking(move || {
            renderer
                .render(&snapshot, trim_mode)
                .map(|pdf| {
                    let metrics = measure(&pdf);
                    (pdf, metrics)
                })
        });

        let timeout = self.tunables.render_timeout;
        let (pdf, metrics) = tokio::time::timeout(timeout, task)
            .await
            .map_err(|_| EngineError::RenderTimeout(timeout.as_secs()))?
            .map_err(|e| EngineError::Internal(anyhow::anyhow!("Render task failed: {e}")))?
            .map_err(|e| EngineError::RenderFailure(e.to_string()))?;

        Ok(Attempt {
            content,
            trim_mode,
            pdf: Arc::new(pdf),
            metrics,
        })
    }

    async fn convert_docx(&self, pdf: Arc<Vec<u8>>) -> Result<Vec<u8>, EngineError> {
        let renderer = Arc::clone(&self.renderer);
        let timeout = self.tunables.render_timeout;
        let task = tokio::task::spawn_blocking(move || renderer.to_docx(&pdf));
        tokio::time::timeout(timeout, task)
            .await
            .map_err(|_| EngineError::RenderTimeout(timeout.as_secs()))?
            .map_err(|e| EngineError::Internal(anyhow::anyhow!("DOCX task failed: {e}")))?
            .map_err(|e| EngineError::RenderFailure(e.to_string()))
    }
}

fn dedup_languages(languages: &[Language]) -> Vec<Language> {
    if languages.is_empty() {
        return Language::all();
    }
    let mut out = Vec::with_capacity(languages.len());
    for &language in languages {
        if !out.contains(&language) {
            out.push(language);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use std::sync::Mutex;

    use crate::generation::blocking::BlockReason;
    use crate::generation::trimmer::shorten_words;
    use crate::layout::pdf_text::extract_pages;
    use crate::models::metrics::Severity;
    use crate::render::{RenderError, TemplateRenderer};
    use crate::richness::Strategy;
    use crate::testing::{sample_cv, sample_experience, FakeGenerator, ScriptedRenderer};

    /// 31 chars per repetition, minus the trailing space removed on intake.
    fn source_text(repetitions: usize) -> String {
        "Financial analyst, Paris 2021. ".repeat(repetitions)
    }

    fn controller(
        generator: &Arc<FakeGenerator>,
        renderer: &Arc<ScriptedRenderer>,
    ) -> ConvergenceController {
        ConvergenceController::new(generator.clone(), renderer.clone(), Tunables::default())
    }

    async fn run_en(
        content: CvContent,
        script: &[(u32, f64)],
    ) -> (
        Result<BTreeMap<Language, GenerationResult>, EngineError>,
        Arc<FakeGenerator>,
        Arc<ScriptedRenderer>,
    ) {
        let generator = Arc::new(FakeGenerator::new(content));
        let renderer = Arc::new(ScriptedRenderer::new(script));
        let result = controller(&generator, &renderer)
            .generate(SourceInput::Text(source_text(100)), "finance", &[Language::En])
            .await;
        (result, generator, renderer)
    }

    fn has_entry(result: &GenerationResult, needle: &str) -> bool {
        result.warnings.iter().any(|w| w.contains(needle))
    }

    #[tokio::test]
    async fn test_rich_source_in_band_is_accepted_untouched() {
        let (result, generator, renderer) = run_en(sample_cv(3, 3), &[(1, 88.0)]).await;
        let result = &result.unwrap()[&Language::En];

        assert_eq!(result.metrics.page_count, 1);
        assert_eq!(result.outcome, Outcome::InBand);
        assert_eq!(generator.bullet_calls(), 0);
        assert_eq!(renderer.render_count(), 1);
        assert!(!result.warnings.iter().any(|w| w.contains("enrichment")));
        assert!(!result.warnings.iter().any(|w| w.contains("trimming")));
        assert_eq!(result.user_warning.severity, Severity::Success);
        assert_eq!(result.docx_bytes.as_ref(), b"docx");
    }

    #[tokio::test]
    async fn test_critical_source_blocked_on_low_base_density() {
        let generator = Arc::new(FakeGenerator::new(sample_cv(1, 1)));
        let renderer = Arc::new(ScriptedRenderer::new(&[(1, 35.0)]));
        let err = controller(&generator, &renderer)
            .generate(SourceInput::Text(source_text(30)), "finance", &[Language::En])
            .await
            .unwrap_err();

        let EngineError::BlockedInput(report) = err else {
            panic!("expected BlockedInput");
        };
        assert!(matches!(
            report.reason,
            BlockReason::DensityBelowBlock { language: Language::En, .. }
        ));
        let requests = generator.requests.lock().unwrap();
        assert_eq!(
            requests[0].instructions,
            instructions_for(Strategy::UltraAggressive, Language::En)
        );
        assert_eq!(generator.bullet_calls(), 0);
        assert_eq!(renderer.render_count(), 1);
    }

    #[tokio::test]
    async fn test_underfilled_enrichment_favours_thinnest_entry() {
        let mut cv = sample_cv(0, 0);
        cv.experience = vec![
            sample_experience(1, 2),
            sample_experience(2, 3),
            sample_experience(3, 4),
        ];
        let (result, generator, renderer) = run_en(cv, &[(1, 82.0), (1, 90.0)]).await;
        let result = &result.unwrap()[&Language::En];

        let rendered = renderer.last_content().unwrap();
        assert_eq!(rendered.experience[0].bullets.len(), 3);
        assert!(rendered.experience[0].bullets[2].starts_with("Generated bullet 0"));
        assert_eq!(rendered.bullet_counts(), vec![3, 4, 5]);
        assert_eq!(generator.bullet_calls(), 3);
        assert_eq!(renderer.trim_flags(), vec![false, false]);
        assert!(has_entry(result, "After incremental enrichment: 90%"));
        assert_eq!(result.outcome, Outcome::InBand);
    }

    #[tokio::test]
    async fn test_overflow_ladder_then_corrective_enrichment_targets_88() {
        let (result, generator, renderer) = run_en(
            sample_cv(4, 3),
            &[(3, 100.0), (2, 100.0), (1, 81.0), (1, 87.0)],
        )
        .await;
        let result = &result.unwrap()[&Language::En];

        // gap 88 - 81 = 7 -> 2 bullets; a 92 target would have asked for 4.
        assert_eq!(generator.bullet_calls(), 2);
        assert_eq!(renderer.trim_flags(), vec![false, true, true, true]);
        // Enrichment builds on the moderately trimmed content, not the base.
        assert_eq!(renderer.last_content().unwrap().bullet_counts(), vec![4, 4, 3, 3]);
        assert!(has_entry(result, "After light trimming (step 1): 100%, 2 page(s)"));
        assert!(has_entry(result, "After moderate trimming (step 2): 81%, 1 page(s)"));
        assert!(has_entry(result, "corrective enrichment (target 88%)"));
        assert!(!has_entry(result, "aggressive"));
        assert_eq!(result.metrics.fill_percentage, 87.0);
        assert_eq!(result.outcome, Outcome::InBand);
    }

    #[tokio::test]
    async fn test_overflow_after_aggressive_trim_is_an_error() {
        let (result, generator, renderer) = run_en(
            sample_cv(4, 3),
            &[(3, 100.0), (3, 100.0), (2, 100.0), (2, 100.0)],
        )
        .await;
        assert!(matches!(
            result.unwrap_err(),
            EngineError::OverflowUnresolved { pages: 2 }
        ));
        assert_eq!(renderer.render_count(), 4);
        assert_eq!(generator.bullet_calls(), 0);
    }

    #[tokio::test]
    async fn test_corrective_enrichment_overflow_reverts_to_trimmed() {
        let (result, _, renderer) =
            run_en(sample_cv(4, 3), &[(2, 100.0), (1, 80.0), (2, 100.0)]).await;
        let result = &result.unwrap()[&Language::En];

        assert_eq!(renderer.render_count(), 3);
        assert_eq!(result.metrics.page_count, 1);
        assert_eq!(result.metrics.fill_percentage, 80.0);
        assert_eq!(result.outcome, Outcome::BelowBandAccepted);
        assert!(has_entry(result, "reverting to trimmed version"));
    }

    #[tokio::test]
    async fn test_post_trim_fill_between_85_and_90_is_left_alone() {
        let (result, generator, _) = run_en(sample_cv(4, 3), &[(2, 100.0), (1, 87.0)]).await;
        let result = &result.unwrap()[&Language::En];
        assert_eq!(generator.bullet_calls(), 0);
        assert!(has_entry(result, "acceptable range"));
    }

    #[tokio::test]
    async fn test_over_dense_single_page_gets_one_light_trim() {
        let (result, generator, renderer) = run_en(sample_cv(4, 4), &[(1, 97.0), (1, 93.0)]).await;
        let result = &result.unwrap()[&Language::En];

        assert_eq!(renderer.trim_flags(), vec![false, true]);
        assert_eq!(generator.bullet_calls(), 0);
        assert!(has_entry(result, "After trimming: 93% (delta: -4.0%)"));
        assert_eq!(result.outcome, Outcome::InBand);
    }

    #[tokio::test]
    async fn test_trim_that_stays_dense_is_accepted_above_band() {
        let (result, _, renderer) = run_en(sample_cv(4, 4), &[(1, 97.0), (1, 96.0)]).await;
        let result = &result.unwrap()[&Language::En];
        assert_eq!(renderer.render_count(), 2);
        assert_eq!(result.outcome, Outcome::AboveBandAccepted);
    }

    #[tokio::test]
    async fn test_enrichment_overshoot_is_trimmed_once() {
        let (result, _, renderer) =
            run_en(sample_cv(3, 2), &[(1, 70.0), (1, 98.0), (1, 94.0)]).await;
        let result = &result.unwrap()[&Language::En];
        assert_eq!(renderer.trim_flags(), vec![false, false, true]);
        assert!(has_entry(result, "Enrichment overshoot"));
        assert_eq!(result.metrics.fill_percentage, 94.0);
    }

    #[tokio::test]
    async fn test_enrichment_overshoot_still_multi_page_reverts() {
        let (result, _, renderer) =
            run_en(sample_cv(3, 2), &[(1, 70.0), (2, 100.0), (2, 100.0)]).await;
        let result = &result.unwrap()[&Language::En];
        assert_eq!(renderer.render_count(), 3);
        assert_eq!(result.metrics.fill_percentage, 70.0);
        assert_eq!(result.outcome, Outcome::BelowBandAccepted);
        assert!(has_entry(result, "reverting to pre-enrichment version"));
    }

    #[tokio::test]
    async fn test_failed_bullets_do_not_abort_the_request() {
        let generator = Arc::new(FakeGenerator::new(sample_cv(3, 2)).failing(&[0, 1, 2]));
        let renderer = Arc::new(ScriptedRenderer::new(&[(1, 75.0)]));
        let results = controller(&generator, &renderer)
            .generate(SourceInput::Text(source_text(100)), "finance", &[Language::En])
            .await
            .unwrap();
        let result = &results[&Language::En];

        // No bullet was added, so nothing is re-rendered.
        assert_eq!(renderer.render_count(), 1);
        assert_eq!(result.outcome, Outcome::BelowBandAccepted);
        assert!(has_entry(result, "0 added, 3 failed"));
    }

    #[tokio::test]
    async fn test_final_fill_under_block_threshold_fails_validation() {
        let (result, _, _) = run_en(sample_cv(3, 2), &[(1, 50.0), (1, 30.0)]).await;
        assert!(matches!(
            result.unwrap_err(),
            EngineError::FinalValidation(_)
        ));
    }

    #[tokio::test]
    async fn test_sparse_source_blocks_before_generation() {
        let generator = Arc::new(FakeGenerator::new(sample_cv(1, 1)));
        let renderer = Arc::new(ScriptedRenderer::new(&[(1, 90.0)]));
        let err = controller(&generator, &renderer)
            .generate(SourceInput::Text(source_text(10)), "finance", &[])
            .await
            .unwrap_err();

        let EngineError::BlockedInput(report) = err else {
            panic!("expected BlockedInput");
        };
        assert_eq!(report.reason, BlockReason::SparseSource { char_count: 309 });
        assert_eq!(generator.generate_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
        assert_eq!(renderer.render_count(), 0);
    }

    #[tokio::test]
    async fn test_lowest_language_decides_the_block() {
        let generator = Arc::new(FakeGenerator::new(sample_cv(2, 2)));
        let renderer = Arc::new(ScriptedRenderer::new(&[(1, 90.0), (1, 30.0)]));
        let err = controller(&generator, &renderer)
            .generate(
                SourceInput::Text(source_text(100)),
                "finance",
                &[Language::Fr, Language::En],
            )
            .await
            .unwrap_err();
        let EngineError::BlockedInput(report) = err else {
            panic!("expected BlockedInput");
        };
        assert!(matches!(
            report.reason,
            BlockReason::DensityBelowBlock { language: Language::En, fill_percentage, .. }
                if fill_percentage == 30.0
        ));
    }

    #[tokio::test]
    async fn test_both_languages_produce_independent_results() {
        let generator = Arc::new(FakeGenerator::new(sample_cv(3, 3)));
        let renderer = Arc::new(ScriptedRenderer::new(&[(1, 88.0), (1, 91.0)]));
        let results = controller(&generator, &renderer)
            .generate(SourceInput::Text(source_text(100)), "finance", &[])
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[&Language::Fr].metrics.fill_percentage, 88.0);
        assert_eq!(results[&Language::En].metrics.fill_percentage, 91.0);
        assert_eq!(results[&Language::Fr].warnings[0], "PFR initial: 88%");
    }

    #[tokio::test]
    async fn test_zero_experience_triggers_one_recovery_call() {
        let mut cv = sample_cv(0, 0);
        cv.experience.clear();
        let generator = Arc::new(
            FakeGenerator::new(cv).with_recovered(vec![sample_experience(1, 3)]),
        );
        let renderer = Arc::new(ScriptedRenderer::new(&[(1, 90.0)]));
        let results = controller(&generator, &renderer)
            .generate(SourceInput::Text(source_text(100)), "finance", &[Language::En])
            .await
            .unwrap();

        assert_eq!(generator.recovery_calls(), 1);
        let rendered = renderer.last_content().unwrap();
        assert_eq!(rendered.experience.len(), 1);
        assert!(has_entry(&results[&Language::En], "Recovered 1 experience(s)"));
    }

    #[tokio::test]
    async fn test_structured_input_skips_classification() {
        let generator = Arc::new(FakeGenerator::new(sample_cv(3, 3)));
        let renderer = Arc::new(ScriptedRenderer::new(&[(1, 89.0)]));
        let results = controller(&generator, &renderer)
            .generate(
                SourceInput::Structured(Box::new(sample_cv(3, 3))),
                "consulting",
                &[Language::Fr],
            )
            .await
            .unwrap();
        let result = &results[&Language::Fr];
        assert_eq!(result.profile.target_pfr_label, "86-88%");
        assert_eq!(generator.recovery_calls(), 0);
        assert!(matches!(
            generator.requests.lock().unwrap()[0].source,
            GenerationSource::Structured(_)
        ));
    }

    #[tokio::test]
    async fn test_base_content_is_padded_before_first_render() {
        let cv = sample_cv(1, 1);
        let (_, _, renderer) = run_en(cv.clone(), &[(1, 90.0)]).await;
        let rendered = renderer.rendered.lock().unwrap()[0].0.clone();
        assert!(rendered.content_chars() > cv.content_chars());
    }

    #[tokio::test]
    async fn test_invalid_pdf_is_rejected() {
        let generator = Arc::new(FakeGenerator::new(sample_cv(1, 1)));
        let renderer = Arc::new(ScriptedRenderer::new(&[(1, 90.0)]));
        let err = controller(&generator, &renderer)
            .generate(SourceInput::Pdf(b"not a pdf".to_vec()), "finance", &[])
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_SOURCE");
    }

    struct SlowRenderer;

    impl Renderer for SlowRenderer {
        fn render(&self, _: &CvContent, _: bool) -> Result<Vec<u8>, RenderError> {
            std::thread::sleep(Duration::from_millis(1500));
            Ok(Vec::new())
        }

        fn to_docx(&self, _: &[u8]) -> Result<Vec<u8>, RenderError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_render_timeout() {
        let generator = Arc::new(FakeGenerator::new(sample_cv(1, 1)));
        let tunables = Tunables {
            render_timeout: Duration::from_secs(1),
            ..Tunables::default()
        };
        let controller = ConvergenceController::new(generator, Arc::new(SlowRenderer), tunables);
        let err = controller
            .generate(SourceInput::Text(source_text(100)), "finance", &[Language::En])
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::RenderTimeout(1)));
    }

    struct FailingRenderer;

    impl Renderer for FailingRenderer {
        fn render(&self, _: &CvContent, _: bool) -> Result<Vec<u8>, RenderError> {
            Err(RenderError::Pdf("font resource missing".into()))
        }

        fn to_docx(&self, _: &[u8]) -> Result<Vec<u8>, RenderError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_base_generation_failure_stops_the_request() {
        let generator =
            Arc::new(FakeGenerator::new(sample_cv(3, 3)).failing_generate("upstream overloaded"));
        let renderer = Arc::new(ScriptedRenderer::new(&[(1, 90.0)]));
        let err = controller(&generator, &renderer)
            .generate(SourceInput::Text(source_text(100)), "finance", &[Language::En])
            .await
            .unwrap_err();

        assert!(matches!(&err, EngineError::GenerationFailure(m) if m == "upstream overloaded"));
        assert_eq!(err.code(), "GENERATION_FAILURE");
        assert_eq!(renderer.render_count(), 0);
        assert_eq!(generator.bullet_calls(), 0);
        assert_eq!(generator.recovery_calls(), 0);
    }

    #[tokio::test]
    async fn test_renderer_error_surfaces_as_render_failure() {
        let generator = Arc::new(FakeGenerator::new(sample_cv(3, 3)));
        let controller =
            ConvergenceController::new(generator.clone(), Arc::new(FailingRenderer), Tunables::default());
        let err = controller
            .generate(SourceInput::Text(source_text(100)), "finance", &[Language::En])
            .await
            .unwrap_err();

        let EngineError::RenderFailure(message) = &err else {
            panic!("expected RenderFailure, got {err:?}");
        };
        assert!(message.contains("font resource missing"), "{message}");
        assert_eq!(generator.bullet_calls(), 0);
    }

    /// Draws with the bundled template and keeps every request it was given.
    struct RecordingTemplate {
        inner: TemplateRenderer,
        rendered: Mutex<Vec<(CvContent, bool)>>,
    }

    impl RecordingTemplate {
        fn new() -> Self {
            Self {
                inner: TemplateRenderer::default(),
                rendered: Mutex::new(Vec::new()),
            }
        }
    }

    impl Renderer for RecordingTemplate {
        fn render(&self, content: &CvContent, trim_mode: bool) -> Result<Vec<u8>, RenderError> {
            self.rendered
                .lock()
                .unwrap()
                .push((content.clone(), trim_mode));
            self.inner.render(content, trim_mode)
        }

        fn to_docx(&self, pdf_bytes: &[u8]) -> Result<Vec<u8>, RenderError> {
            self.inner.to_docx(pdf_bytes)
        }
    }

    async fn run_on_template(
        cv: CvContent,
    ) -> (GenerationResult, Arc<FakeGenerator>, Arc<RecordingTemplate>) {
        let generator = Arc::new(FakeGenerator::new(cv.clone()));
        let renderer = Arc::new(RecordingTemplate::new());
        let controller =
            ConvergenceController::new(generator.clone(), renderer.clone(), Tunables::default());
        let mut results = controller
            .generate(SourceInput::Structured(Box::new(cv)), "finance", &[Language::En])
            .await
            .unwrap();
        let result = results.remove(&Language::En).unwrap();
        (result, generator, renderer)
    }

    fn page_text(result: &GenerationResult) -> String {
        let pages = extract_pages(&result.pdf_bytes).unwrap();
        assert_eq!(pages.len(), 1);
        pages[0].text()
    }

    #[tokio::test]
    async fn test_two_page_cv_lands_in_band_after_light_trim_on_template() {
        let mut cv = sample_cv(4, 5);
        cv.certifications = vec!["CFA Level I".into()];
        let (result, generator, renderer) = run_on_template(cv.clone()).await;

        assert!(has_entry(&result, "PFR initial: 100%"));
        assert!(has_entry(&result, "After light trimming (step 1)"));
        assert!(!has_entry(&result, "After moderate trimming"));

        // The light pass keeps every entry and bullet and only cuts words.
        let rendered = renderer.rendered.lock().unwrap();
        let (trimmed, trim_mode) = &rendered[1];
        assert!(*trim_mode);
        assert_eq!(trimmed.bullet_counts(), cv.bullet_counts());
        for (kept, original) in trimmed.experience.iter().zip(&cv.experience) {
            for (bullet, source) in kept.bullets.iter().zip(&original.bullets) {
                assert_eq!(bullet, &shorten_words(source, 0.85, 10));
            }
        }

        assert_eq!(result.metrics.page_count, 1);
        assert_eq!(result.outcome, Outcome::InBand, "fill {}", result.metrics.fill_percentage);
        assert_eq!(generator.bullet_calls(), 0);
        let text = page_text(&result);
        assert!(text.contains("Company 4"));
        assert!(text.contains("CFA Level I"));
    }

    #[tokio::test]
    async fn test_corrective_enrichment_after_trim_adds_bullets_on_template() {
        let (result, generator, renderer) = run_on_template(sample_cv(6, 4)).await;

        assert!(has_entry(&result, "After moderate trimming (step 2)"));
        assert!(has_entry(&result, "corrective enrichment (target 88%)"));
        // Moderate trimming leaves three bullets per entry, so every entry has room.
        assert_eq!(generator.bullet_calls(), 6);
        assert!(has_entry(&result, "6 attempted, 6 added"));

        let rendered = renderer.rendered.lock().unwrap();
        let trim_flags: Vec<bool> = rendered.iter().map(|(_, t)| *t).collect();
        assert_eq!(trim_flags, vec![false, true, true, true]);
        let post_trim = measure(&renderer.inner.render(&rendered[2].0, true).unwrap());
        assert_eq!(rendered[3].0.bullet_counts(), vec![4; 6]);

        assert_eq!(result.metrics.page_count, 1);
        assert!(result.metrics.fill_percentage > post_trim.fill_percentage);
        assert!(page_text(&result).contains("Company 6"));
    }

    #[test]
    fn test_dedup_languages() {
        assert_eq!(dedup_languages(&[]), vec![Language::Fr, Language::En]);
        assert_eq!(
            dedup_languages(&[Language::En, Language::En]),
            vec![Language::En]
        );
    }
}
