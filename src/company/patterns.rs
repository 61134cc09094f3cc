use log::debug;
use regex::Regex;
use std::sync::OnceLock;

/// Subject-line phrasings, tried in order. The capture runs up to the next
/// comma, dash, pipe or exclamation mark.
pub const SUBJECT_PATTERNS: &[&str] = &[
    r"(?i)application to\s+([^,–|!]+)",
    r"(?i)applying to\s+([^,–|!]+)",
    r"(?i)interest in\s+([^,–|!]+)",
    r"(?i)interview (?:with|invitation with)\s+([^,–|!]+)",
    r"(?i)thank you[, ]+(?:for your )?(?:application|interest|submission)[^–—]*[–—]\s*([^,–|!]+)",
];

/// A run of capitalised words, allowing `&` between them ("Procter & Gamble").
const COMPANY_NAME: &str = r"([A-Z][\w&'-]*(?:[ \t]+(?:&[ \t]+)?[A-Z][\w&'-]*)*)";

/// Body phrasings, tried in order. Keywords ignore case, the company name
/// must be capitalised.
pub const BODY_PREFIXES: &[&str] = &[
    r"(?i:position (?:at|with))\s+",
    r"(?i:thank you for (?:applying to|your interest in))\s+",
    r"(?i:interview (?:with|at))\s+",
];

fn compiled_subject() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        SUBJECT_PATTERNS
            .iter()
            .map(|pattern| Regex::new(pattern).expect("valid subject pattern"))
            .collect()
    })
}

fn compiled_body() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        BODY_PREFIXES
            .iter()
            .map(|prefix| Regex::new(&format!("{}{}", prefix, COMPANY_NAME)).expect("valid body pattern"))
            .collect()
    })
}

/// First subject pattern that matches, with its trimmed capture.
pub fn match_subject(subject: &str) -> Option<String> {
    first_capture(compiled_subject(), subject)
}

/// First body pattern that matches, with its trimmed capture.
pub fn match_body(body: &str) -> Option<String> {
    first_capture(compiled_body(), body)
}

fn first_capture(patterns: &[Regex], text: &str) -> Option<String> {
    if text.is_empty() {
        return None;
    }

    patterns.iter().enumerate().find_map(|(index, re)| {
        let captured = re.captures(text)?.get(1)?;
        let name = clean_capture(captured.as_str())?;
        debug!("Company '{}' matched by pattern #{}", name, index + 1);
        Some(name)
    })
}

/// Trim whitespace and a trailing period; empty captures are misses.
pub fn clean_capture(raw: &str) -> Option<String> {
    let name = raw.trim().trim_end_matches('.').trim_end();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}
