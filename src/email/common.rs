/// Common structures for job application emails
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classifier::{ClassificationResult, LabelSource, StatusLabel};
use super::body_extractor;

/// Body of a message as delivered by the mail provider: either a single
/// part with a base64 payload, or a multipart container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentNode {
    Leaf { mime_type: String, payload: String },
    Container { children: Vec<ContentNode> },
}

impl ContentNode {
    pub fn leaf(mime_type: impl Into<String>, payload: impl Into<String>) -> Self {
        ContentNode::Leaf {
            mime_type: mime_type.into(),
            payload: payload.into(),
        }
    }

    pub fn container(children: Vec<ContentNode>) -> Self {
        ContentNode::Container { children }
    }
}

/// Email retrieved from the mail provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMessage {
    pub id: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<ContentNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received_at: Option<DateTime<Utc>>,
}

impl RawMessage {
    pub fn new(
        id: impl Into<String>,
        subject: impl Into<String>,
        sender: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        RawMessage {
            id: id.into(),
            subject: subject.into(),
            sender: sender.into(),
            body: body.into(),
            content: None,
            received_at: None,
        }
    }

    pub fn with_content(mut self, content: ContentNode) -> Self {
        self.content = Some(content);
        self
    }

    pub fn with_received_at(mut self, received_at: DateTime<Utc>) -> Self {
        self.received_at = Some(received_at);
        self
    }

    /// Copy of this message whose body is filled from the content tree when
    /// it was not already populated.
    pub fn with_extracted_body(&self) -> RawMessage {
        let mut prepared = self.clone();
        if prepared.body.is_empty() {
            if let Some(content) = &self.content {
                prepared.body = body_extractor::extract_body(content);
            }
        }
        prepared
    }

    /// Subject and body joined for keyword matching, empty parts skipped.
    pub fn cue_text(&self) -> String {
        [self.subject.as_str(), self.body.as_str()]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// One output record per input message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationRecord {
    pub email_id: String,
    pub subject: String,
    pub classification: StatusLabel,
    pub confidence: Option<f64>,
    pub company: String,
    #[serde(skip)]
    pub source: LabelSource,
}

impl ClassificationRecord {
    pub fn new(message: &RawMessage, result: ClassificationResult, company: String) -> Self {
        ClassificationRecord {
            email_id: message.id.clone(),
            subject: message.subject.clone(),
            classification: result.label,
            confidence: result.confidence,
            company,
            source: result.source,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == LabelSource::Fallback
    }
}

/// Result of a tracker run
#[derive(Debug, Default)]
pub struct ProcessingResult {
    pub emails_processed: usize,
    pub emails_failed: usize,
    pub fallbacks: usize,
}

impl ProcessingResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failure(&mut self) {
        self.emails_failed += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose, Engine as _};

    #[test]
    fn test_cue_text_skips_empty_parts() {
        let message = RawMessage::new("1", "", "hr@acme.com", "We regret to inform you");
        assert_eq!(message.cue_text(), "We regret to inform you");

        let message = RawMessage::new("2", "Update", "", "");
        assert_eq!(message.cue_text(), "Update");
    }

    #[test]
    fn test_extracted_body_keeps_existing_body() {
        let payload = general_purpose::URL_SAFE.encode("from the tree");
        let message = RawMessage::new("1", "s", "a@b.com", "already here")
            .with_content(ContentNode::leaf("text/plain", payload));

        assert_eq!(message.with_extracted_body().body, "already here");
    }

    #[test]
    fn test_extracted_body_fills_from_content() {
        let payload = general_purpose::URL_SAFE.encode("from the tree");
        let message = RawMessage::new("1", "s", "a@b.com", "")
            .with_content(ContentNode::leaf("text/plain", payload));

        let prepared = message.with_extracted_body();
        assert_eq!(prepared.body, "from the tree");
        assert!(message.body.is_empty());
    }

    #[test]
    fn test_record_serializes_with_external_field_names() {
        let message = RawMessage::new("abc", "Your application", "jobs@acme.com", "");
        let record = ClassificationRecord::new(
            &message,
            ClassificationResult::backend(StatusLabel::ApplicationReceived, Some(0.5)),
            "Acme".to_string(),
        );

        let value = serde_json::to_value(&record).unwrap();
        let mut keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["classification", "company", "confidence", "email_id", "subject"]);
        assert_eq!(value["classification"], "Application Received");
    }
}
