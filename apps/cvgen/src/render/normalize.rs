//! Presentation normalization applied just before layout.
//!
//! Dates and locations are shortened to keep header lines on one line. Nothing here
//! adds or removes entries, bullets or words: the page always shows exactly the
//! `CvContent` the controller holds, only with compacted header strings.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::cv::CvContent;

/// Returns the copy of `content` that is actually laid out.
pub fn prepare(content: &CvContent) -> CvContent {
    let mut data = content.clone();

    for edu in &mut data.education {
        if let Some(date) = edu.date.take() {
            let short = shorten_date_range(&date);
            edu.date = Some(if short.len() == 4 && short.chars().all(|c| c.is_ascii_digit()) {
                format!("Jan {short}")
            } else {
                short
            });
        }
        edu.location = edu.location.as_deref().map(shorten_location);
    }

    for exp in &mut data.experience {
        exp.date = exp.date.as_deref().map(shorten_date_range);
        exp.location = exp.location.as_deref().map(shorten_location);
    }
    data
}

// ────────────────────────────────────────────────────────────────────────────
// Dates
// ────────────────────────────────────────────────────────────────────────────

const MONTHS: [(&str, &str); 12] = [
    ("january", "jan"),
    ("february", "feb"),
    ("march", "mar"),
    ("april", "apr"),
    ("may", "may"),
    ("june", "jun"),
    ("july", "jul"),
    ("august", "aug"),
    ("september", "sep"),
    ("october", "oct"),
    ("november", "nov"),
    ("december", "dec"),
];

const FRENCH_MONTHS: [(&str, &str); 15] = [
    ("janvier", "jan"),
    ("février", "feb"),
    ("fevrier", "feb"),
    ("mars", "mar"),
    ("avril", "apr"),
    ("mai", "may"),
    ("juin", "jun"),
    ("juillet", "jul"),
    ("août", "aug"),
    ("aout", "aug"),
    ("septembre", "sep"),
    ("octobre", "oct"),
    ("novembre", "nov"),
    ("décembre", "dec"),
    ("decembre", "dec"),
];

static MONTH_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    FRENCH_MONTHS
        .iter()
        .chain(MONTHS.iter())
        .filter_map(|(long, short)| {
            Regex::new(&format!(r"\b{long}\b"))
                .ok()
                .map(|re| (re, *short))
        })
        .collect()
});

static SHORT_MONTH_PATTERNS: Lazy<Vec<(Regex, String)>> = Lazy::new(|| {
    MONTHS
        .iter()
        .filter_map(|(_, short)| {
            let mut capitalized = short.to_string();
            capitalized[..1].make_ascii_uppercase();
            Regex::new(&format!(r"\b{short}\b"))
                .ok()
                .map(|re| (re, capitalized))
        })
        .collect()
});

static PRESENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(present|présent|jusqu'?a\s+present|jusqu'?à\s+présent|aujourd'?hui|current|to\s+date)\b",
    )
    .unwrap()
});
static SINCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(since|depuis)\s+(.*)$").unwrap());
static UNTIL_NOW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*?)\s*[–—-]\s*now$").unwrap());
static ANY_DASH: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*[–—-]\s*").unwrap());
static LONG_DASH: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*[–—]\s*").unwrap());
static HYPHEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*-\s*").unwrap());
static SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

fn capitalize_months(s: &str) -> String {
    SHORT_MONTH_PATTERNS
        .iter()
        .fold(s.to_string(), |acc, (re, cap)| {
            re.replace_all(&acc, cap.as_str()).into_owned()
        })
}

/// Shortens a date range: `"Since July 2025"` → `"Since Jul 2025"`,
/// `"juillet 2025 - décembre 2025"` → `"Jul 2025-Dec 2025"`, `"Mar 2021 – present"` →
/// `"Since Mar 2021"`.
pub fn shorten_date_range(text: &str) -> String {
    let mut t = text.trim().to_lowercase();
    for (re, short) in MONTH_PATTERNS.iter() {
        t = re.replace_all(&t, *short).into_owned();
    }
    t = PRESENT.replace_all(&t, "now").into_owned();

    if let Some(caps) = SINCE.captures(&t) {
        let start = capitalize_months(&caps[2]);
        return format!("Since {}", ANY_DASH.replace_all(&start, " ").trim());
    }
    if let Some(caps) = UNTIL_NOW.captures(&t) {
        let start = capitalize_months(&caps[1]);
        return format!("Since {}", ANY_DASH.replace_all(&start, " ").trim());
    }

    let short = capitalize_months(&t);
    let short = LONG_DASH.replace_all(&short, "-");
    let short = HYPHEN.replace_all(&short, "-");
    SPACES.replace_all(&short, " ").trim().to_string()
}

// ────────────────────────────────────────────────────────────────────────────
// Locations
// ────────────────────────────────────────────────────────────────────────────

const COUNTRIES: [(&str, &str); 24] = [
    ("etats-unis", "USA"),
    ("etats unis", "USA"),
    ("united states of america", "USA"),
    ("united states", "USA"),
    ("usa", "USA"),
    ("royaume-uni", "UK"),
    ("united kingdom", "UK"),
    ("uk", "UK"),
    ("emirats arabes unis", "UAE"),
    ("united arab emirates", "UAE"),
    ("uae", "UAE"),
    ("allemagne", "Germany"),
    ("espagne", "Spain"),
    ("italie", "Italy"),
    ("suisse", "Switzerland"),
    ("belgique", "Belgium"),
    ("pays-bas", "Netherlands"),
    ("pays bas", "Netherlands"),
    ("luxembourg", "Luxembourg"),
    ("france", "France"),
    ("canada", "Canada"),
    ("chine", "China"),
    ("japon", "Japan"),
    ("inde", "India"),
];

static SAINT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*saint[-\s]").unwrap());
static SAINTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*sainte[-\s]").unwrap());

/// Shortens a location to ASCII `"City, Country"` with English country names.
pub fn shorten_location(text: &str) -> String {
    let parts: Vec<&str> = text.trim().split(',').map(str::trim).collect();
    match parts.as_slice() {
        [] => strip_accents(text),
        [single] => {
            let token = strip_accents(single);
            match country(&token) {
                Some(c) => c.to_string(),
                None => abbreviate_city(&token),
            }
        }
        [first, .., last] => {
            let city = abbreviate_city(&strip_accents(first));
            let country_token = strip_accents(last);
            let country = country(&country_token)
                .map(str::to_string)
                .unwrap_or_else(|| title_case(&country_token));
            format!("{city}, {country}")
        }
    }
}

fn country(token: &str) -> Option<&'static str> {
    let lowered = token.to_lowercase();
    COUNTRIES
        .iter()
        .find(|(name, _)| *name == lowered)
        .map(|(_, short)| *short)
}

fn abbreviate_city(city: &str) -> String {
    let c = SAINT.replace(city, "St-");
    let c = SAINTE.replace(&c, "Ste-");
    let c = HYPHEN.replace_all(&c, "-");
    let c = SPACES.replace_all(&c, " ");
    c.split('-')
        .map(|part| title_case(part.trim()))
        .collect::<Vec<_>>()
        .join("-")
        .trim()
        .to_string()
}

/// Uppercases the first letter of every alphabetic run and lowercases the rest.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

/// Folds accented Latin letters to ASCII and drops whatever else is not ASCII.
fn strip_accents(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => out.push('a'),
            'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => out.push('A'),
            'ç' => out.push('c'),
            'Ç' => out.push('C'),
            'è' | 'é' | 'ê' | 'ë' => out.push('e'),
            'È' | 'É' | 'Ê' | 'Ë' => out.push('E'),
            'ì' | 'í' | 'î' | 'ï' => out.push('i'),
            'Ì' | 'Í' | 'Î' | 'Ï' => out.push('I'),
            'ñ' => out.push('n'),
            'Ñ' => out.push('N'),
            'ò' | 'ó' | 'ô' | 'õ' | 'ö' => out.push('o'),
            'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' => out.push('O'),
            'ù' | 'ú' | 'û' | 'ü' => out.push('u'),
            'Ù' | 'Ú' | 'Û' | 'Ü' => out.push('U'),
            'ÿ' | 'ý' => out.push('y'),
            'œ' => out.push_str("oe"),
            'Œ' => out.push_str("OE"),
            c if c.is_ascii() => out.push(c),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cv::{EducationEntry, ExperienceEntry};

    #[test]
    fn test_shorten_english_range() {
        assert_eq!(
            shorten_date_range("July 2025 - December 2025"),
            "Jul 2025-Dec 2025"
        );
    }

    #[test]
    fn test_shorten_french_range() {
        assert_eq!(
            shorten_date_range("septembre 2019 – juin 2021"),
            "Sep 2019-Jun 2021"
        );
    }

    #[test]
    fn test_since_and_present_forms() {
        assert_eq!(shorten_date_range("Since July 2025"), "Since Jul 2025");
        assert_eq!(shorten_date_range("depuis mars 2022"), "Since Mar 2022");
        assert_eq!(shorten_date_range("March 2021 - Present"), "Since Mar 2021");
    }

    #[test]
    fn test_shorten_location_maps_country_and_saint() {
        assert_eq!(shorten_location("Saint-Étienne, France"), "St-Etienne, France");
        assert_eq!(shorten_location("new york, États-Unis"), "New York, USA");
        assert_eq!(shorten_location("Royaume-Uni"), "UK");
        assert_eq!(shorten_location("Genève, Suisse"), "Geneve, Switzerland");
    }

    #[test]
    fn test_prepare_expands_bare_education_year() {
        let content = CvContent {
            education: vec![EducationEntry {
                date: Some("2021".into()),
                ..Default::default()
            }],
            ..Default::default()
        };
        let prepared = prepare(&content);
        assert_eq!(prepared.education[0].date.as_deref(), Some("Jan 2021"));
    }

    #[test]
    fn test_prepare_keeps_every_entry_and_word() {
        let long_bullet = "word ".repeat(40).trim_end().to_string();
        let content = CvContent {
            experience: vec![
                ExperienceEntry {
                    date: Some("January 2022 - March 2023".into()),
                    bullets: vec![long_bullet.clone(); 5],
                    ..Default::default()
                };
                4
            ],
            it_skills: vec!["skill".into(); 10],
            ..Default::default()
        };
        let prepared = prepare(&content);
        assert_eq!(prepared.experience.len(), 4);
        assert_eq!(prepared.bullet_counts(), content.bullet_counts());
        assert_eq!(prepared.experience[3].bullets[4], long_bullet);
        assert_eq!(prepared.it_skills.len(), 10);
        assert_eq!(prepared.experience[0].date.as_deref(), Some("Jan 2022-Mar 2023"));
    }
}
