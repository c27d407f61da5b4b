use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

// Card boilerplate and print dates that the OCR picks up around the
// holder's name. Stripped before matching so they cannot be mistaken
// for name parts.
static EXCLUDED_KEYWORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(RMIT|Student|University|Sinh\s+Vien|January|February|March|April|May|June|July|August|September|October|November|December)",
    )
    .expect("invalid keyword pattern")
});

// A capitalized multi-word name, parts possibly split across lines,
// followed by a 7-digit student number.
static NAME_AND_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Z][a-zA-Z]+(?:[\s\n]+[A-Z][a-zA-Z]+)*)\s*\n*\s*(\d{7})")
        .expect("invalid extraction pattern")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdInfo {
    pub name: String,
    #[serde(rename = "studentNumber")]
    pub student_number: String,
}

/// Locates a name and student number in raw OCR output. Returns None
/// when the text holds no plausible name/number pair.
pub fn extract_id_info(text: &str) -> Option<IdInfo> {
    let cleaned = EXCLUDED_KEYWORDS.replace_all(text, "");
    let caps = NAME_AND_NUMBER.captures(&cleaned)?;
    let name = format_name(&caps[1]);
    let student_number = caps[2].trim().to_string();
    Some(IdInfo {
        name,
        student_number,
    })
}

/// Cards print the name in all caps; recase those parts while leaving
/// already mixed-case parts alone.
fn format_name(raw: &str) -> String {
    raw.split_whitespace()
        .map(|part| {
            if part.chars().all(|c| c.is_ascii_uppercase()) {
                capitalize(part)
            } else {
                part.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}
