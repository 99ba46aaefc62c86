//! Strategy-keyed instruction bundles and user warnings.
//!
//! Instruction bundles are injected into the base generation prompt. Each bundle sets
//! bullet length targets and minimum item counts per section so that the first render
//! lands close to the fill band.

use crate::models::cv::Language;
use crate::models::metrics::{Severity, UserWarning};
use crate::richness::classifier::Strategy;

// ────────────────────────────────────────────────────────────────────────────
// Instruction bundles
// ────────────────────────────────────────────────────────────────────────────

const BLOCK_FR: &str =
    "BLOCAGE : Source trop vide (<600 caractères). Demander plus d'informations.";
const BLOCK_EN: &str =
    "BLOCKED: source too sparse (<600 characters). Ask the candidate for more information.";

const ULTRA_AGGRESSIVE_FR: &str = r#"ULTRA-AGRESSIF - GÉNÉRATION MAXIMALE OBLIGATOIRE

IMPÉRATIF ABSOLU : 3800 caractères minimum

VOUS DEVEZ GÉNÉRER UN CV ULTRA-DENSE. NE PAS ÉCONOMISER LES MOTS.

RÈGLES STRICTES :

1. EXPÉRIENCES - MINIMUM 3 AVEC 4 BULLETS CHACUNE :
   - Si < 3 dans la source : CRÉER 1-2 expériences complètes
   - CHAQUE bullet : 200-250 caractères (PAS MOINS)
   - Formule par bullet :
     [Action détaillée] pour [type de client + secteur] (méthodologie 1, méthodologie 2, outil 1, outil 2, ...) avec [résultat quantifié]

2. EDUCATION - 8-10 ITEMS DE COURSEWORK :
   - Détailler CHAQUE cours : "Corporate Finance (méthodes de valorisation, modélisation LBO, analyse M&A)"

3. ACTIVITIES - 4-5 ITEMS DE 150-200 CARACTÈRES :
   - TOUTES avec métriques (équipe de X personnes, budget de Y€, audience de Z)

4. IT SKILLS - 10+ ITEMS :
   - Développer chaque compétence : "Excel (avancé : VBA, Power Query, tableaux croisés dynamiques)"

VÉRIFICATION AVANT DE RETOURNER :
- Total caractères > 3800
- Bullets moyens > 200 caractères
- Coursework > 8 items
- Activities > 4 items

OBJECTIF : 3800 caractères MINIMUM, 90%+ PFR"#;

const ULTRA_AGGRESSIVE_EN: &str = r#"ULTRA-AGGRESSIVE - MAXIMUM GENERATION REQUIRED

ABSOLUTE REQUIREMENT: 3800 characters minimum

YOU MUST GENERATE AN ULTRA-DENSE CV. DO NOT SAVE WORDS.

STRICT RULES:

1. EXPERIENCES - AT LEAST 3 WITH 4 BULLETS EACH:
   - If the source has < 3: CREATE 1-2 complete experiences
   - EVERY bullet: 200-250 characters (NOT LESS)
   - Formula per bullet:
     [Detailed action] for [client type + sector] (methodology 1, methodology 2, tool 1, tool 2, ...) with [quantified result]

2. EDUCATION - 8-10 COURSEWORK ITEMS:
   - Detail EACH course: "Corporate Finance (valuation methods, LBO modeling, M&A analysis)"

3. ACTIVITIES - 4-5 ITEMS OF 150-200 CHARACTERS:
   - ALL with metrics (team of X people, budget of Y, audience of Z)

4. IT SKILLS - 10+ ITEMS:
   - Develop each skill: "Excel (advanced: VBA, Power Query, pivot tables)"

CHECK BEFORE RETURNING:
- Total characters > 3800
- Average bullet > 200 characters
- Coursework > 8 items
- Activities > 4 items

GOAL: 3800 characters MINIMUM, 90%+ PFR"#;

const AGGRESSIVE_FR: &str = r#"AGRESSIF (30-50% invention) - Cible 90%+ PFR, 3500 caractères

1. EXPÉRIENCES :
   - Enrichir TOUS les bullets à 190-220 caractères
   - Ajouter méthodologies détaillées, outils, contexte
   - Si < 3 expériences : créer 1 expérience plausible courte

2. EDUCATION :
   - Coursework 7-8 items minimum
   - Détailler chaque cours avec sous-thèmes

3. ACTIVITIES :
   - 3-4 activities avec métriques
   - 130-160 caractères chacune

4. IT SKILLS :
   - 8-9 items minimum

OBJECTIF : 3500 caractères, 90%+ PFR"#;

const AGGRESSIVE_EN: &str = r#"AGGRESSIVE (30-50% invention) - Target 90%+ PFR, 3500 characters

1. EXPERIENCES:
   - Expand ALL bullets to 190-220 characters
   - Add detailed methodologies, tools, context
   - If < 3 experiences: create 1 short plausible experience

2. EDUCATION:
   - Coursework 7-8 items minimum
   - Detail each course with sub-topics

3. ACTIVITIES:
   - 3-4 activities with metrics
   - 130-160 characters each

4. IT SKILLS:
   - 8-9 items minimum

GOAL: 3500 characters, 90%+ PFR"#;

const MODERATE_FR: &str = r#"MODÉRÉ (10-30% invention) - Cible 90%+ PFR, 3200 caractères

1. Enrichir les bullets à 170-190 caractères
2. Compléter le coursework à 6-7 items
3. Développer les activities (3 items, 110-130 caractères)
4. IT skills 7-8 items

OBJECTIF : 3200 caractères, 90%+ PFR"#;

const MODERATE_EN: &str = r#"MODERATE (10-30% invention) - Target 90%+ PFR, 3200 characters

1. Expand bullets to 170-190 characters
2. Complete coursework to 6-7 items
3. Develop activities (3 items, 110-130 characters)
4. IT skills 7-8 items

GOAL: 3200 characters, 90%+ PFR"#;

const MINIMAL_FR: &str = r#"MINIMAL (0-10% ajouts) - Cible 88-90% PFR, 3400 caractères

SOURCE RICHE - Préservation TOTALE du contenu.

RÈGLES STRICTES :
1. EXPÉRIENCES :
   - Extraire TOUTES les expériences de la source (ne jamais en omettre)
   - Conserver TOUS les bullets de chaque expérience
   - Bullets 180-200 caractères (optimiser la formulation sans inventer)

2. EDUCATION :
   - Extraire TOUT le coursework présent
   - Compléter à 6 items si < 6 (inférer depuis le diplôme)

3. ACTIVITIES :
   - Développer chaque activité à 110-130 caractères minimum

4. IT SKILLS :
   - Lister TOUTES les compétences de la source
   - Minimum 7-8 items

CRITIQUE : ne JAMAIS omettre d'expériences ou de bullets présents dans la source.
OBJECTIF : 3400 caractères, 88-90% PFR"#;

const MINIMAL_EN: &str = r#"MINIMAL (0-10% additions) - Target 88-90% PFR, 3400 characters

RICH SOURCE - Preserve ALL content.

STRICT RULES:
1. EXPERIENCES:
   - Extract ALL experiences from the source (never omit one)
   - Keep ALL bullets of each experience
   - Bullets 180-200 characters (improve wording without inventing)

2. EDUCATION:
   - Extract ALL coursework present
   - Complete to 6 items if < 6 (infer from the degree)

3. ACTIVITIES:
   - Develop each activity to at least 110-130 characters

4. IT SKILLS:
   - List ALL skills from the source
   - Minimum 7-8 items

CRITICAL: NEVER omit experiences or bullets present in the source.
GOAL: 3400 characters, 88-90% PFR"#;

/// Returns the generation instruction bundle for a strategy in the given language.
pub fn instructions_for(strategy: Strategy, language: Language) -> &'static str {
    match (strategy, language) {
        (Strategy::Block, Language::Fr) => BLOCK_FR,
        (Strategy::Block, Language::En) => BLOCK_EN,
        (Strategy::UltraAggressive, Language::Fr) => ULTRA_AGGRESSIVE_FR,
        (Strategy::UltraAggressive, Language::En) => ULTRA_AGGRESSIVE_EN,
        (Strategy::Aggressive, Language::Fr) => AGGRESSIVE_FR,
        (Strategy::Aggressive, Language::En) => AGGRESSIVE_EN,
        (Strategy::Moderate, Language::Fr) => MODERATE_FR,
        (Strategy::Moderate, Language::En) => MODERATE_EN,
        (Strategy::Minimal, Language::Fr) => MINIMAL_FR,
        (Strategy::Minimal, Language::En) => MINIMAL_EN,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// User warnings
// ────────────────────────────────────────────────────────────────────────────

/// Returns the user-facing warning attached to results produced under `strategy`.
pub fn warning_for(strategy: Strategy) -> UserWarning {
    let (severity, title, message) = match strategy {
        Strategy::Block => (
            Severity::Block,
            "GENERATION BLOCKED",
            "Your source CV contains too little information (< 600 characters). \
             Please provide a more detailed CV.",
        ),
        Strategy::UltraAggressive => (
            Severity::Critical,
            "MAXIMUM WARNING: Content MASSIVELY inferred (50-70%)",
            "Your source CV was EXTREMELY poor. We had to INVENT substantially:\n\n\
             - 1-2 plausible professional experiences created\n\
             - Complete coursework inferred (7-8 courses)\n\
             - Activities created with metrics\n\
             - Detailed methodologies and context added\n\n\
             CRITICAL: 50-70% of content is INFERRED/INVENTED\n\n\
             This CV is a FICTIONAL BASE. You MUST:\n\
             1. Verify EVERY line\n\
             2. Replace invented content with YOUR real experiences\n\
             3. NOT send it as-is\n\n\
             STRONG RECOMMENDATION: Provide a much more detailed source CV.",
        ),
        Strategy::Aggressive => (
            Severity::Error,
            "WARNING: Substantial content inferred (30-50%)",
            "Your source CV lacked details. We added:\n\n\
             - Detailed methodologies and tools\n\
             - Complete inferred coursework\n\
             - Developed activities\n\
             - Possibly 1 short experience created\n\n\
             IMPORTANT: 30-50% of content is inferred\n\n\
             Verify and personalize before sending.\n\n\
             For better results, provide a more detailed source CV.",
        ),
        Strategy::Moderate => (
            Severity::Warning,
            "Significant enrichments (10-30%)",
            "Your CV has been enriched:\n\n\
             - Standard methodologies added\n\
             - Coursework completed\n\
             - Activities developed\n\n\
             10-30% of content was added. Review before use.",
        ),
        Strategy::Minimal => (
            Severity::Success,
            "CV generated successfully",
            "Light optimizations applied (< 10% additions).",
        ),
    };

    UserWarning {
        severity,
        title: title.to_string(),
        message: message.to_string(),
    }
}
