//! Boundary adapter between generator JSON and the canonical `CvContent` schema.
//!
//! Generators have historically emitted several names for the same section. All of
//! them are folded here, once, when generator output enters the engine. Nothing past
//! this module ever sees an alias key.

use serde_json::{Map, Value};

use crate::models::cv::CvContent;

/// Top-level `(alias, canonical)` pairs. Order matters: the first alias found wins
/// when a payload carries several of them and no canonical key.
const SECTION_ALIASES: &[(&str, &str)] = &[
    ("work_experience", "experience"),
    ("language_skills", "languages"),
    ("financial_databases", "databases"),
    ("activities_interests", "activities"),
    ("interests", "activities"),
];

/// Values that generators emit when they have nothing to say.
const PLACEHOLDERS: &[&str] = &["N/A", "NA", "NOT AVAILABLE", "NONE", "NULL"];

/// Sections rendered as flat string lists.
const STRING_LIST_SECTIONS: &[&str] = &[
    "languages",
    "it_skills",
    "databases",
    "activities",
    "certifications",
];

/// Normalizes a raw generator payload into `CvContent`.
///
/// Unknown keys are ignored. A payload that is not a JSON object yields empty content
/// rather than an error; the density checks downstream will block it.
pub fn normalize_generated(raw: Value) -> Result<CvContent, serde_json::Error> {
    let Value::Object(mut map) = strip_placeholders(raw).unwrap_or(Value::Null) else {
        return Ok(CvContent::default());
    };

    for (alias, canonical) in SECTION_ALIASES {
        if let Some(value) = map.remove(*alias) {
            map.entry(canonical.to_string()).or_insert(value);
        }
    }

    if let Some(contact) = map.remove("contact_information") {
        let first = match contact {
            Value::Array(items) => items.into_iter().next(),
            obj @ Value::Object(_) => Some(obj),
            _ => None,
        };
        if let Some(first) = first {
            map.entry("contact".to_string()).or_insert(first);
        }
    }

    if let Some(Value::Array(education)) = map.get_mut("education") {
        for entry in education.iter_mut() {
            if let Value::Object(edu) = entry {
                fold_education_year(edu);
            }
        }
    }

    if let Some(Value::Array(experience)) = map.get_mut("experience") {
        for entry in experience.iter_mut() {
            if let Value::Object(exp) = entry {
                if let Some(bullets) = exp.remove("bullets") {
                    exp.insert("bullets".into(), flatten_string_list(bullets));
                }
            }
        }
    }

    for key in STRING_LIST_SECTIONS {
        if let Some(value) = map.remove(*key) {
            map.insert(key.to_string(), flatten_string_list(value));
        }
    }

    serde_json::from_value(Value::Object(map))
}

/// `year` becomes `date`. When both exist, a purely numeric `date` is replaced by `year`
/// while a date that spells out a month is kept.
fn fold_education_year(edu: &mut Map<String, Value>) {
    let Some(year) = edu.remove("year") else {
        return;
    };
    let year = scalar_to_string(&year);
    let keep_date = edu
        .get("date")
        .and_then(Value::as_str)
        .map(|d| d.chars().any(char::is_alphabetic))
        .unwrap_or(false);
    if !keep_date {
        if let Some(year) = year {
            edu.insert("date".into(), Value::String(year));
        }
    }
}

/// Recursively drops placeholder strings, empty strings and nulls.
/// Returns `None` when the value itself is a placeholder.
pub fn strip_placeholders(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() || PLACEHOLDERS.contains(&trimmed.to_uppercase().as_str()) {
                None
            } else {
                Some(Value::String(s))
            }
        }
        Value::Array(items) => Some(Value::Array(
            items.into_iter().filter_map(strip_placeholders).collect(),
        )),
        Value::Object(map) => Some(Value::Object(
            map.into_iter()
                .filter_map(|(k, v)| strip_placeholders(v).map(|v| (k, v)))
                .collect(),
        )),
        other => Some(other),
    }
}

/// Coerces a section into a list of strings. Objects (e.g. `{"language": "English",
/// "level": "C1"}`) are joined into `"English (C1)"`; a bare string becomes one item.
fn flatten_string_list(value: Value) -> Value {
    let items = match value {
        Value::Array(items) => items,
        Value::String(s) => vec![Value::String(s)],
        _ => Vec::new(),
    };
    Value::Array(
        items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(obj) => {
                    let parts: Vec<String> = obj.values().filter_map(scalar_to_string).collect();
                    match parts.split_first() {
                        None => None,
                        Some((head, [])) => Some(head.clone()),
                        Some((head, rest)) => Some(format!("{head} ({})", rest.join(", "))),
                    }
                }
                other => scalar_to_string(&other),
            })
            .map(Value::String)
            .collect(),
    )
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
