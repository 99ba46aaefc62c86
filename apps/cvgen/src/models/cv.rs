use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Product ceiling on bullets per work-experience entry.
pub const MAX_BULLETS_PER_EXPERIENCE: usize = 5;

/// Output language of a generated CV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Fr,
    En,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::Fr => "fr",
            Language::En => "en",
        }
    }

    /// Both languages in the order the product generates them by default.
    pub fn all() -> Vec<Language> {
        vec![Language::Fr, Language::En]
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fr" | "french" | "francais" | "français" => Ok(Language::Fr),
            "en" | "english" | "anglais" => Ok(Language::En),
            other => Err(format!("unsupported language '{other}' (expected fr or en)")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EducationEntry {
    #[serde(default)]
    pub institution: String,
    #[serde(default)]
    pub degree: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub major: Option<String>,
    #[serde(default)]
    pub honors: Option<String>,
    #[serde(default)]
    pub coursework: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub bullets: Vec<String>,
}

impl ExperienceEntry {
    pub fn bullet_count(&self) -> usize {
        self.bullets.len()
    }

    pub fn has_room_for_bullet(&self) -> bool {
        self.bullets.len() < MAX_BULLETS_PER_EXPERIENCE
    }
}

/// The canonical structured résumé.
///
/// Field names here are the only ones the engine knows about; historical aliases are
/// folded in once by `models::aliases::normalize_generated` at the generator boundary.
/// Values are treated as immutable snapshots: passes build a new `CvContent` instead of
/// editing one in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CvContent {
    #[serde(default)]
    pub contact: Option<ContactInfo>,
    #[serde(default)]
    pub education: Vec<EducationEntry>,
    #[serde(default)]
    pub experience: Vec<ExperienceEntry>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub it_skills: Vec<String>,
    #[serde(default)]
    pub databases: Vec<String>,
    #[serde(default)]
    pub activities: Vec<String>,
    #[serde(default)]
    pub certifications: Vec<String>,
    #[serde(default)]
    pub summary: Option<String>,
}

impl CvContent {
    pub fn total_bullets(&self) -> usize {
        self.experience.iter().map(ExperienceEntry::bullet_count).sum()
    }

    pub fn bullet_counts(&self) -> Vec<usize> {
        self.experience.iter().map(ExperienceEntry::bullet_count).collect()
    }

    /// Characters carried by the density-relevant free text: bullets, coursework, activities.
    pub fn content_chars(&self) -> usize {
        let bullets: usize = self
            .experience
            .iter()
            .flat_map(|e| e.bullets.iter())
            .map(|b| b.chars().count())
            .sum();
        let coursework: usize = self
            .education
            .iter()
            .map(|e| e.coursework.join(" ").chars().count())
            .sum();
        let activities = self.activities.join(" ").chars().count();
        bullets + coursework + activities
    }
}
