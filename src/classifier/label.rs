use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::BackendError;

/// Status of a job application as read from one email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusLabel {
    #[serde(rename = "Application Received")]
    ApplicationReceived,
    Interview,
    Rejected,
    Unknown,
}

impl StatusLabel {
    pub const ALL: [StatusLabel; 4] = [
        StatusLabel::ApplicationReceived,
        StatusLabel::Interview,
        StatusLabel::Rejected,
        StatusLabel::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusLabel::ApplicationReceived => "Application Received",
            StatusLabel::Interview => "Interview",
            StatusLabel::Rejected => "Rejected",
            StatusLabel::Unknown => "Unknown",
        }
    }

    /// Find the label named in a free-text backend answer.
    ///
    /// Matching is case-insensitive, treats `_` and `-` as spaces and
    /// tolerates surrounding text. When several labels are named, the one
    /// appearing first in the text wins.
    pub fn parse_lenient(text: &str) -> Result<StatusLabel, BackendError> {
        let normalized = text.trim().to_lowercase().replace(['_', '-'], " ");
        let normalized = normalized.split_whitespace().collect::<Vec<_>>().join(" ");

        StatusLabel::ALL
            .iter()
            .filter_map(|label| {
                normalized
                    .find(&label.as_str().to_lowercase())
                    .map(|position| (position, *label))
            })
            .min_by_key(|(position, _)| *position)
            .map(|(_, label)| label)
            .ok_or_else(|| BackendError::UnparsableLabel(text.trim().to_string()))
    }
}

impl fmt::Display for StatusLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a label came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelSource {
    #[default]
    Backend,
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    pub label: StatusLabel,
    /// Probability of `label`; `None` when the backend reports none or the
    /// cue matcher produced the label. Never 0.0 as a stand-in for missing.
    pub confidence: Option<f64>,
    pub source: LabelSource,
}

impl ClassificationResult {
    pub fn backend(label: StatusLabel, confidence: Option<f64>) -> Self {
        ClassificationResult {
            label,
            confidence,
            source: LabelSource::Backend,
        }
    }

    pub fn fallback(label: StatusLabel) -> Self {
        ClassificationResult {
            label,
            confidence: None,
            source: LabelSource::Fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_padded_uppercase() {
        assert_eq!(StatusLabel::parse_lenient("  INTERVIEW\n").unwrap(), StatusLabel::Interview);
    }

    #[test]
    fn test_parse_with_surrounding_text() {
        assert_eq!(
            StatusLabel::parse_lenient("Label: Application   Received.").unwrap(),
            StatusLabel::ApplicationReceived
        );
        assert_eq!(
            StatusLabel::parse_lenient("application_received").unwrap(),
            StatusLabel::ApplicationReceived
        );
        assert_eq!(StatusLabel::parse_lenient("rejected").unwrap(), StatusLabel::Rejected);
        assert_eq!(StatusLabel::parse_lenient("Unknown").unwrap(), StatusLabel::Unknown);
    }

    #[test]
    fn test_parse_earliest_label_wins() {
        assert_eq!(
            StatusLabel::parse_lenient("Rejected (not Interview)").unwrap(),
            StatusLabel::Rejected
        );
    }

    #[test]
    fn test_parse_garbage_is_error() {
        assert!(matches!(
            StatusLabel::parse_lenient("garbage"),
            Err(BackendError::UnparsableLabel(text)) if text == "garbage"
        ));
        assert!(StatusLabel::parse_lenient("").is_err());
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&StatusLabel::ApplicationReceived).unwrap(),
            "\"Application Received\""
        );
        let label: StatusLabel = serde_json::from_str("\"Rejected\"").unwrap();
        assert_eq!(label, StatusLabel::Rejected);
    }
}
