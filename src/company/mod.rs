/// Best-effort company name extraction
pub mod entities;
pub mod patterns;
pub mod sender;

use log::debug;
use std::sync::Arc;

pub use entities::{Entity, EntityRecognizer, SuffixRecognizer};

use crate::email::RawMessage;

pub const UNKNOWN_COMPANY: &str = "Unknown";

/// One step of the extraction cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompanyRule {
    SubjectPattern,
    BodyPattern,
    EntityRecognition,
    SenderDomain,
}

/// Cascade order; the first rule that finds a name wins.
pub const CASCADE: [CompanyRule; 4] = [
    CompanyRule::SubjectPattern,
    CompanyRule::BodyPattern,
    CompanyRule::EntityRecognition,
    CompanyRule::SenderDomain,
];

#[derive(Clone, Default)]
pub struct CompanyExtractor {
    recognizer: Option<Arc<dyn EntityRecognizer>>,
}

impl CompanyExtractor {
    /// Extractor without entity recognition.
    pub fn new() -> Self {
        CompanyExtractor { recognizer: None }
    }

    pub fn with_recognizer(recognizer: Arc<dyn EntityRecognizer>) -> Self {
        CompanyExtractor {
            recognizer: Some(recognizer),
        }
    }

    /// Company name for a message, or "Unknown". Never empty.
    pub fn extract(&self, message: &RawMessage) -> String {
        self.extract_with_rule(message)
            .map(|(_, name)| name)
            .unwrap_or_else(|| UNKNOWN_COMPANY.to_string())
    }

    /// Company name together with the rule that produced it.
    pub fn extract_with_rule(&self, message: &RawMessage) -> Option<(CompanyRule, String)> {
        CASCADE.iter().find_map(|rule| {
            let name = self.apply(*rule, message)?;
            debug!("Email {}: company '{}' via {:?}", message.id, name, rule);
            Some((*rule, name))
        })
    }

    fn apply(&self, rule: CompanyRule, message: &RawMessage) -> Option<String> {
        match rule {
            CompanyRule::SubjectPattern => patterns::match_subject(&message.subject),
            CompanyRule::BodyPattern => patterns::match_body(&message.body),
            CompanyRule::EntityRecognition => {
                let recognizer = self.recognizer.as_deref()?;
                let body = message.body.trim();
                let text = if body.is_empty() { message.subject.trim() } else { body };
                if text.is_empty() {
                    return None;
                }
                entities::first_organization(recognizer, text)
            }
            CompanyRule::SenderDomain => sender::company_from_sender(&message.sender),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_suffixes() -> CompanyExtractor {
        CompanyExtractor::with_recognizer(Arc::new(SuffixRecognizer))
    }

    #[test]
    fn test_subject_wins_over_sender() {
        let message = RawMessage::new(
            "1",
            "Thank you for applying to Acme Corp",
            "Recruiting <no-reply@greenhouse.io>",
            "",
        );
        assert_eq!(
            with_suffixes().extract_with_rule(&message),
            Some((CompanyRule::SubjectPattern, "Acme Corp".to_string()))
        );
    }

    #[test]
    fn test_body_pattern_before_entities() {
        let message = RawMessage::new(
            "2",
            "Update",
            "jobs@lever.co",
            "Initech Corp partners with us. Your position at Globex is filled.",
        );
        assert_eq!(
            with_suffixes().extract_with_rule(&message),
            Some((CompanyRule::BodyPattern, "Globex".to_string()))
        );
    }

    #[test]
    fn test_entities_before_sender() {
        let message = RawMessage::new(
            "3",
            "Update",
            "jobs@lever.co",
            "Everyone here at Initech Technologies enjoyed meeting you.",
        );
        assert_eq!(
            with_suffixes().extract_with_rule(&message),
            Some((CompanyRule::EntityRecognition, "Initech Technologies".to_string()))
        );
    }

    #[test]
    fn test_entities_use_subject_when_body_empty() {
        let message = RawMessage::new("4", "News from Umbrella Corp", "", "   ");
        assert_eq!(with_suffixes().extract(&message), "Umbrella Corp");
    }

    #[test]
    fn test_sender_domain_fallback() {
        let message = RawMessage::new("5", "Hello", "no-reply@big-tech.io", "Just checking in");
        assert_eq!(with_suffixes().extract(&message), "Big Tech");
    }

    #[test]
    fn test_recognition_disabled_skips_to_sender() {
        let message = RawMessage::new(
            "6",
            "Update",
            "Careers <careers@wayne-enterprises.com>",
            "Everyone at Initech Technologies enjoyed meeting you.",
        );
        assert_eq!(CompanyExtractor::new().extract(&message), "Wayne Enterprises");
    }

    #[test]
    fn test_unknown_sentinel() {
        let message = RawMessage::new("7", "", "", "");
        assert_eq!(with_suffixes().extract(&message), UNKNOWN_COMPANY);
    }

    #[test]
    fn test_cascade_order_is_pinned() {
        assert_eq!(
            CASCADE,
            [
                CompanyRule::SubjectPattern,
                CompanyRule::BodyPattern,
                CompanyRule::EntityRecognition,
                CompanyRule::SenderDomain
            ]
        );
    }
}
