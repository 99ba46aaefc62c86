//! Deterministic content reduction for overflowing or over-dense CVs.
//!
//! Each severity is a pure function of its input: the same content and severity always
//! produce the same output, and the input snapshot is never modified.

use serde::{Deserialize, Serialize};

use crate::models::cv::{CvContent, ExperienceEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrimSeverity {
    /// Shorten every bullet slightly, keep all entries.
    Light = 1,
    /// Cap bullets per entry and shorten harder.
    Moderate = 2,
    /// Last resort: keep a skeleton CV.
    Aggressive = 3,
}

impl TrimSeverity {
    /// Escalation order used for multi-page output.
    pub const LADDER: [TrimSeverity; 3] = [
        TrimSeverity::Light,
        TrimSeverity::Moderate,
        TrimSeverity::Aggressive,
    ];

    pub fn step(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            TrimSeverity::Light => "light",
            TrimSeverity::Moderate => "moderate",
            TrimSeverity::Aggressive => "aggressive",
        }
    }
}

/// Word ratios and section caps. Calibrated for the bundled template; other
/// templates should recalibrate them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrimRatios {
    pub min_words: usize,
    pub light_word_ratio: f64,
    pub moderate_word_ratio: f64,
    pub moderate_bullets: usize,
    pub moderate_education: usize,
    pub aggressive_experiences: usize,
    pub aggressive_bullets: usize,
    pub aggressive_education: usize,
    pub aggressive_languages: usize,
    pub aggressive_it_skills: usize,
    pub aggressive_activities: usize,
}

impl Default for TrimRatios {
    fn default() -> Self {
        Self {
            min_words: 10,
            light_word_ratio: 0.85,
            moderate_word_ratio: 0.80,
            moderate_bullets: 3,
            moderate_education: 2,
            aggressive_experiences: 2,
            aggressive_bullets: 2,
            aggressive_education: 2,
            aggressive_languages: 3,
            aggressive_it_skills: 3,
            aggressive_activities: 2,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Trimmer {
    ratios: TrimRatios,
}

impl Trimmer {
    pub fn new(ratios: TrimRatios) -> Self {
        Self { ratios }
    }

    pub fn trim(&self, content: &CvContent, severity: TrimSeverity) -> CvContent {
        let r = &self.ratios;
        let mut out = content.clone();
        match severity {
            TrimSeverity::Light => {
                for entry in &mut out.experience {
                    shorten_bullets(entry, r.light_word_ratio, r.min_words);
                }
            }
            TrimSeverity::Moderate => {
                for entry in &mut out.experience {
                    entry.bullets.truncate(r.moderate_bullets);
                    shorten_bullets(entry, r.moderate_word_ratio, r.min_words);
                }
                out.education.truncate(r.moderate_education);
            }
            TrimSeverity::Aggressive => {
                out.experience.truncate(r.aggressive_experiences);
                for entry in &mut out.experience {
                    entry.bullets.truncate(r.aggressive_bullets);
                }
                out.education.truncate(r.aggressive_education);
                out.languages.truncate(r.aggressive_languages);
                out.it_skills.truncate(r.aggressive_it_skills);
                out.activities.truncate(r.aggressive_activities);
                out.certifications.clear();
            }
        }
        out
    }
}

fn shorten_bullets(entry: &mut ExperienceEntry, ratio: f64, min_words: usize) {
    for bullet in &mut entry.bullets {
        *bullet = shorten_words(bullet, ratio, min_words);
    }
}

/// Keeps the first `max(min_words, floor(words × ratio))` words. A cut bullet ends with
/// `...` unless it already ends with a period; an uncut one is returned as is.
pub fn shorten_words(text: &str, ratio: f64, min_words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    let keep = min_words.max((words.len() as f64 * ratio).floor() as usize);
    if keep >= words.len() {
        return text.to_string();
    }
    let mut shortened = words[..keep].join(" ");
    if !shortened.ends_with('.') {
        shortened.push_str("...");
    }
    shortened
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cv::EducationEntry;
    use crate::testing::sample_cv;

    fn words(n: usize) -> String {
        (1..=n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_light_cuts_to_85_percent() {
        assert_eq!(
            shorten_words(&words(20), 0.85, 10),
            format!("{}...", words(17))
        );
    }

    #[test]
    fn test_short_bullets_are_left_untouched() {
        assert_eq!(shorten_words(&words(8), 0.85, 10), words(8));
        assert_eq!(shorten_words("Led the audit of funds", 0.85, 10), "Led the audit of funds");
        assert_eq!(shorten_words("Led the audit.", 0.85, 10), "Led the audit.");
        assert_eq!(shorten_words("", 0.85, 10), "");
    }

    #[test]
    fn test_cut_ending_on_a_period_gets_no_ellipsis() {
        let text = format!("{}. {}", words(12), words(4));
        assert_eq!(shorten_words(&text, 0.75, 10), format!("{}.", words(12)));
    }

    #[test]
    fn test_light_keeps_every_entry() {
        let cv = sample_cv(4, 5);
        let trimmed = Trimmer::default().trim(&cv, TrimSeverity::Light);
        assert_eq!(trimmed.bullet_counts(), cv.bullet_counts());
        assert!(trimmed.content_chars() < cv.content_chars());
    }

    #[test]
    fn test_moderate_caps_bullets_and_education() {
        let mut cv = sample_cv(3, 5);
        cv.education.push(EducationEntry::default());
        let trimmed = Trimmer::default().trim(&cv, TrimSeverity::Moderate);
        assert_eq!(trimmed.bullet_counts(), vec![3, 3, 3]);
        assert_eq!(trimmed.education.len(), 2);
    }

    #[test]
    fn test_aggressive_caps() {
        let mut cv = sample_cv(5, 5);
        cv.languages = vec!["a".into(), "b".into(), "c".into(), "d".into()];
        cv.it_skills = vec!["a".into(); 6];
        cv.activities = vec!["a".into(); 4];
        cv.certifications = vec!["CFA Level I".into()];
        cv.education.push(EducationEntry::default());

        let trimmed = Trimmer::default().trim(&cv, TrimSeverity::Aggressive);
        assert_eq!(trimmed.experience.len(), 2);
        assert!(trimmed.experience.iter().all(|e| e.bullets.len() <= 2));
        assert!(trimmed.education.len() <= 2);
        assert!(trimmed.languages.len() <= 3);
        assert!(trimmed.it_skills.len() <= 3);
        assert!(trimmed.activities.len() <= 2);
        assert!(trimmed.certifications.is_empty());
    }

    #[test]
    fn test_trim_does_not_touch_input() {
        let cv = sample_cv(3, 5);
        let before = cv.clone();
        let _ = Trimmer::default().trim(&cv, TrimSeverity::Aggressive);
        assert_eq!(cv, before);
    }

    #[test]
    fn test_custom_ratios() {
        let ratios = TrimRatios {
            moderate_bullets: 1,
            ..Default::default()
        };
        let trimmed = Trimmer::new(ratios).trim(&sample_cv(2, 4), TrimSeverity::Moderate);
        assert_eq!(trimmed.bullet_counts(), vec![1, 1]);
    }

    #[test]
    fn test_ladder_order() {
        let steps: Vec<u8> = TrimSeverity::LADDER.iter().map(|s| s.step()).collect();
        assert_eq!(steps, vec![1, 2, 3]);
    }
}
