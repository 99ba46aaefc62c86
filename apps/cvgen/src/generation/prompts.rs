// Prompt constants for the content generator.
// Reuses cross-cutting fragments from llm_client::prompts.

use crate::generation::generator::BulletContext;
use crate::models::cv::Language;

/// System prompt for base content generation. Strategy instructions and the output
/// language line are appended per request.
pub const BASE_SYSTEM: &str = r#"You are an expert CV writer for finance, consulting and corporate roles.
Turn the résumé data you are given into a complete one-page CV.

Return a JSON object with this EXACT schema:
{
  "contact": {"name": "", "email": "", "phone": "", "address": ""},
  "summary": null,
  "education": [{
    "institution": "", "degree": "", "date": "Sep YYYY - Jun YYYY",
    "location": "City, Country", "major": null, "honors": null,
    "coursework": ["Course 1", "Course 2"]
  }],
  "experience": [{
    "company": "", "position": "", "date": "Mon YYYY - Mon YYYY",
    "location": "City, Country", "duration": "X months",
    "bullets": ["Achievement 1", "Achievement 2", "Achievement 3"]
  }],
  "languages": ["French (native)"],
  "it_skills": ["Excel"],
  "databases": ["Bloomberg"],
  "activities": ["Role, organisation, what you did"],
  "certifications": []
}

Rules:
- Most recent entries first in every section.
- Bullets start with an action verb and carry one concrete outcome each.
- Leave a field empty rather than writing placeholders such as "N/A"."#;

pub const BULLET_SYSTEM: &str =
    "You are a professional CV writer. Generate contextual, factual bullet points.";

/// Used only when base generation returned no experience although the source
/// clearly describes work history.
pub const RECOVERY_SYSTEM: &str = r#"The previous extraction returned ZERO work experiences, but the source clearly contains work history.

TASK: Extract ALL work experiences from the source. Look for:
- Company/organization names
- Job titles or roles
- Date ranges (any format)
- Responsibilities or achievements

You MUST extract AT LEAST ONE work experience if ANY exists in the source.

Return ONLY work experiences in this exact format:
{
    "work_experience": [{
        "date": "Mon YYYY-Mon YYYY",
        "company": "COMPANY NAME",
        "location": "City, Country",
        "position": "Job Title",
        "duration": "X months",
        "bullets": ["Achievement 1", "Achievement 2", "Achievement 3"]
    }]
}"#;

pub fn language_line(language: Language) -> &'static str {
    match language {
        Language::Fr => "Output must be in French.",
        Language::En => "Output must be in English.",
    }
}

/// Prompt asking for exactly one additional bullet for an existing experience.
pub fn bullet_prompt(ctx: &BulletContext) -> String {
    let existing = ctx
        .existing_bullets
        .iter()
        .map(|b| format!("- {b}"))
        .collect::<Vec<_>>()
        .join("\n");

    match ctx.language {
        Language::Fr => format!(
            "Tu es un expert en rédaction de CV pour le secteur {domain}.\n\n\
             Rôle: {position}\n\
             Entreprise: {company}\n\
             Bullets existants:\n{existing}\n\n\
             Génère UN SEUL bullet point supplémentaire qui:\n\
             1. Est contextuel au rôle et aux bullets existants\n\
             2. Ajoute une dimension manquante (scope, méthode, outils, impact, coordination)\n\
             3. Est quantifié si possible (métriques, pourcentages, tailles)\n\
             4. N'invente PAS de faits\n\
             5. Fait 15-25 mots\n\
             6. Style: professionnel, finance/conseil\n\n\
             Réponds UNIQUEMENT avec le bullet point, sans tiret, sans numéro.",
            domain = ctx.domain,
            position = ctx.position,
            company = ctx.company,
        ),
        Language::En => format!(
            "You are a CV writing expert for the {domain} sector.\n\n\
             Role: {position}\n\
             Company: {company}\n\
             Existing bullets:\n{existing}\n\n\
             Generate ONE additional bullet point that:\n\
             1. Is contextual to the role and existing bullets\n\
             2. Adds a missing dimension (scope, method, tools, impact, coordination)\n\
             3. Is quantified if possible (metrics, percentages, sizes)\n\
             4. Does NOT invent facts\n\
             5. Is 15-25 words\n\
             6. Style: professional, finance/consulting tone\n\n\
             Respond ONLY with the bullet point, no dash, no number.",
            domain = ctx.domain,
            position = ctx.position,
            company = ctx.company,
        ),
    }
}
