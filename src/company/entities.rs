use regex::Regex;
use std::sync::OnceLock;

pub const ORGANIZATION: &str = "ORG";

/// A tagged span of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub text: String,
    pub entity_type: String,
}

/// Named-entity recognition collaborator. Entities come back in document
/// order.
pub trait EntityRecognizer: Send + Sync {
    fn recognize(&self, text: &str) -> Vec<Entity>;
}

/// First entity tagged as an organization, trimmed.
pub fn first_organization(recognizer: &dyn EntityRecognizer, text: &str) -> Option<String> {
    recognizer
        .recognize(text)
        .into_iter()
        .filter(|entity| entity.entity_type.eq_ignore_ascii_case(ORGANIZATION))
        .map(|entity| entity.text.trim().to_string())
        .find(|name| !name.is_empty())
}

/// Rule-based recognizer: tags up to four capitalised words ending in a
/// corporate suffix ("Acme Corp", "Initech Technologies", "Hooli, Inc.")
/// as organizations.
#[derive(Debug, Default, Clone)]
pub struct SuffixRecognizer;

const SUFFIXES: &str = "Inc|Incorporated|Corp|Corporation|Co|Company|LLC|LLP|Ltd|Limited|GmbH|AG|SA|PLC|Plc|Group|Holdings|Technologies|Technology|Labs|Systems|Solutions|Partners|Software|Studios";

fn suffix_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(&format!(
            r"\b((?:[A-Z][\w&'-]*[ \t]+(?:&[ \t]+)?){{0,3}}[A-Z][\w&'-]*,?[ \t]+(?:{})\b\.?)",
            SUFFIXES
        ))
        .expect("valid organization pattern")
    })
}

impl EntityRecognizer for SuffixRecognizer {
    fn recognize(&self, text: &str) -> Vec<Entity> {
        suffix_pattern()
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| Entity {
                text: m.as_str().to_string(),
                entity_type: ORGANIZATION.to_string(),
            })
            .collect()
    }
}
