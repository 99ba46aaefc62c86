//! Incremental enrichment: adds a bounded number of bullets to the thinnest
//! experiences, sized from the gap between measured and target fill.
//!
//! One call is one pass. The enricher never re-renders, never re-measures and never
//! retries a failed bullet; the controller decides what happens next.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::generation::generator::{BulletContext, ContentGenerator};
use crate::models::cv::{CvContent, Language};
use crate::models::metrics::PageFillMetrics;

/// Fill gained per added bullet on the bundled template: a 15-25 word bullet wraps onto
/// two 11.25pt body lines of an 842pt page.
pub const DEFAULT_BULLET_PFR_YIELD: f64 = 2.7;
/// Upper bound on generator calls in a single pass.
pub const MAX_BULLETS_PER_PASS: usize = 10;

/// Per-call parameters. `target_pfr` is explicit so corrective passes can aim lower
/// without touching shared state.
#[derive(Debug, Clone)]
pub struct EnrichmentContext<'a> {
    pub domain: &'a str,
    pub language: Language,
    pub target_pfr: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EnrichmentReport {
    /// Bullets the fill gap called for.
    pub requested: usize,
    /// Generator calls actually made.
    pub attempted: usize,
    pub added: usize,
    pub failed: usize,
}

pub struct Enricher {
    generator: Arc<dyn ContentGenerator>,
    bullet_pfr_yield: f64,
}

impl Enricher {
    pub fn new(generator: Arc<dyn ContentGenerator>, bullet_pfr_yield: f64) -> Self {
        Self {
            generator,
            bullet_pfr_yield,
        }
    }

    /// `floor(max(0, target - fill) / yield)`.
    pub fn bullets_needed(&self, fill: f64, target_pfr: f64) -> usize {
        if self.bullet_pfr_yield <= 0.0 {
            return 0;
        }
        let gap = (target_pfr - fill).max(0.0);
        (gap / self.bullet_pfr_yield).floor() as usize
    }

    pub async fn enrich(
        &self,
        content: &CvContent,
        metrics: &PageFillMetrics,
        ctx: &EnrichmentContext<'_>,
    ) -> (CvContent, EnrichmentReport) {
        let requested = self.bullets_needed(metrics.fill_percentage, ctx.target_pfr);
        let mut report = EnrichmentReport {
            requested,
            ..Default::default()
        };
        if requested == 0 {
            debug!(
                "No enrichment needed: fill {}% vs target {}%",
                metrics.fill_percentage, ctx.target_pfr
            );
            return (content.clone(), report);
        }

        // Stable sort: entries with equal bullet counts keep document order.
        let mut ranked: Vec<usize> = (0..content.experience.len()).collect();
        ranked.sort_by_key(|&i| content.experience[i].bullet_count());
        let selected: Vec<usize> = ranked
            .into_iter()
            .take(requested.min(MAX_BULLETS_PER_PASS))
            .collect();

        info!(
            "Enriching {} of {} experiences (gap {:.1}% -> {} bullets requested)",
            selected.len(),
            content.experience.len(),
            ctx.target_pfr - metrics.fill_percentage,
            requested
        );

        let mut enriched = content.clone();
        for index in selected {
            let entry = &enriched.experience[index];
            if !entry.has_room_for_bullet() {
                debug!("Skipping '{}': already at bullet ceiling", entry.company);
                continue;
            }
            let bullet_ctx = BulletContext::for_entry(entry, ctx.domain, ctx.language);
            report.attempted += 1;
            match self.generator.generate_bullet(&bullet_ctx).await {
                Ok(bullet) => {
                    enriched.experience[index].bullets.push(bullet);
                    report.added += 1;
                }
                Err(e) => {
                    warn!("Bullet generation failed for '{}': {e}", bullet_ctx.company);
                    report.failed += 1;
                }
            }
        }

        (enriched, report)
    }
}
