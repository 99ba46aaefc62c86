//! Deterministic padding of base content toward the strategy's character budget,
//! plus bullet-length diagnostics.
//!
//! Padding runs once, right after base generation and before the first render. It
//! never calls the generator: it appends fixed, domain-neutral clauses to short
//! bullets, activities and coursework.

use serde::Serialize;
use tracing::info;

use crate::models::cv::{CvContent, Language};

/// Bullets shorter than this are extended.
pub const BULLET_PAD_MIN_CHARS: usize = 200;
/// Hard cap on a padded bullet.
pub const BULLET_PAD_MAX_CHARS: usize = 250;
pub const ACTIVITY_PAD_MIN_CHARS: usize = 150;
pub const COURSEWORK_PAD_MIN_CHARS: usize = 40;

/// Below this a bullet reads as thin.
pub const BULLET_OPTIMAL_MIN: usize = 110;
/// Above this a bullet starts wrapping onto a third line.
pub const BULLET_OPTIMAL_MAX: usize = 155;

const BULLET_CLAUSES_FR: &[&str] = &[
    ", avec coordination d'équipes pluridisciplinaires et gestion de projets transverses",
    ", incluant analyses de données quantitatives et qualitatives approfondies",
    ", en collaboration étroite avec stakeholders internes et externes",
    ", avec production de livrables détaillés et présentations exécutives régulières",
    ", optimisation continue des processus et méthodologies de travail",
    ", participation active aux réunions stratégiques et comités de pilotage",
    ", suivi rigoureux des indicateurs de performance et reporting hebdomadaire",
];

const BULLET_CLAUSES_EN: &[&str] = &[
    ", coordinating cross-functional teams and managing transversal projects",
    ", including in-depth quantitative and qualitative data analysis",
    ", working closely with internal and external stakeholders",
    ", producing detailed deliverables and regular executive presentations",
    ", continuously improving processes and working methods",
    ", actively participating in strategic meetings and steering committees",
    ", rigorously tracking performance indicators with weekly reporting",
];

fn bullet_clauses(language: Language) -> &'static [&'static str] {
    match language {
        Language::Fr => BULLET_CLAUSES_FR,
        Language::En => BULLET_CLAUSES_EN,
    }
}

fn activity_clause(language: Language) -> &'static str {
    match language {
        Language::Fr => " avec organisation d'événements réguliers, gestion de la communication, coordination logistique et animation de communauté",
        Language::En => " including organising regular events, handling communication, coordinating logistics and community building",
    }
}

fn coursework_clause(language: Language) -> &'static str {
    match language {
        Language::Fr => " (méthodes avancées, études de cas pratiques)",
        Language::En => " (advanced methods, practical case studies)",
    }
}

/// Pads `content` toward `target_chars` (as counted by `CvContent::content_chars`).
///
/// Content already at or above the target is returned unchanged. Otherwise every
/// bullet under 200 chars is extended, then activities and coursework are extended
/// only while the count is still short.
pub fn pad_to_target(content: &CvContent, target_chars: usize, language: Language) -> CvContent {
    let before = content.content_chars();
    if before >= target_chars {
        return content.clone();
    }
    info!(
        "Padding content: {before}/{target_chars} chars (+{} needed)",
        target_chars - before
    );

    let mut padded = content.clone();
    for entry in &mut padded.experience {
        for bullet in &mut entry.bullets {
            *bullet = pad_bullet(bullet, language);
        }
    }

    if padded.content_chars() < target_chars {
        for activity in &mut padded.activities {
            if activity.chars().count() < ACTIVITY_PAD_MIN_CHARS {
                activity.push_str(activity_clause(language));
            }
        }
    }

    if padded.content_chars() < target_chars {
        for course in padded.education.iter_mut().flat_map(|e| e.coursework.iter_mut()) {
            if course.chars().count() < COURSEWORK_PAD_MIN_CHARS {
                course.push_str(coursework_clause(language));
            }
        }
    }

    let after = padded.content_chars();
    info!("After padding: {after} chars (+{})", after - before);
    padded
}

fn pad_bullet(bullet: &str, language: Language) -> String {
    if bullet.chars().count() >= BULLET_PAD_MIN_CHARS {
        return bullet.to_string();
    }
    let mut out = bullet.to_string();
    for clause in bullet_clauses(language) {
        if out.chars().count() >= BULLET_PAD_MIN_CHARS {
            break;
        }
        out.push_str(clause);
    }
    out.chars().take(BULLET_PAD_MAX_CHARS).collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Bullet-length diagnostics
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BulletLengthStats {
    pub total: usize,
    pub average: f64,
    pub min: usize,
    pub max: usize,
    pub too_short: usize,
    pub optimal: usize,
    pub too_long: usize,
}

pub fn bullet_length_stats(content: &CvContent) -> BulletLengthStats {
    let lengths: Vec<usize> = content
        .experience
        .iter()
        .flat_map(|e| e.bullets.iter())
        .map(|b| b.chars().count())
        .collect();
    if lengths.is_empty() {
        return BulletLengthStats::default();
    }

    let mut stats = BulletLengthStats {
        total: lengths.len(),
        average: lengths.iter().sum::<usize>() as f64 / lengths.len() as f64,
        min: lengths.iter().copied().min().unwrap_or(0),
        max: lengths.iter().copied().max().unwrap_or(0),
        ..Default::default()
    };
    for len in lengths {
        if len < BULLET_OPTIMAL_MIN {
            stats.too_short += 1;
        } else if len > BULLET_OPTIMAL_MAX {
            stats.too_long += 1;
        } else {
            stats.optimal += 1;
        }
    }
    stats
}
