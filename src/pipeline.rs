use log::{debug, info};
use std::sync::Arc;

use crate::classifier::{self, LabelClassifier};
use crate::company::{CompanyExtractor, SuffixRecognizer};
use crate::config::Config;
use crate::email::{ClassificationRecord, RawMessage};
use crate::error::PipelineError;

/// Turns raw messages into classification records: body extraction, status
/// label, company name. One record per message, in input order.
#[derive(Clone)]
pub struct Pipeline {
    classifier: LabelClassifier,
    companies: CompanyExtractor,
}

impl Pipeline {
    pub fn new(classifier: LabelClassifier, companies: CompanyExtractor) -> Self {
        Pipeline { classifier, companies }
    }

    /// Pipeline wired from configuration: Cohere backend, suffix-based
    /// entity recognition unless disabled.
    pub fn from_config(config: &Config) -> Result<Self, PipelineError> {
        config.classifier.validate()?;

        let companies = if config.entity_recognition {
            CompanyExtractor::with_recognizer(Arc::new(SuffixRecognizer))
        } else {
            CompanyExtractor::new()
        };

        Ok(Pipeline::new(classifier::build_classifier(&config.classifier), companies))
    }

    pub async fn process(&self, messages: &[RawMessage]) -> Result<Vec<ClassificationRecord>, PipelineError> {
        if messages.is_empty() {
            debug!("No emails to classify");
            return Ok(Vec::new());
        }

        info!("Classifying {} email(s) with {}", messages.len(), self.classifier.backend_name());

        let prepared: Vec<RawMessage> = messages.iter().map(RawMessage::with_extracted_body).collect();
        let results = self.classifier.classify_batch(&prepared).await?;

        let records: Vec<ClassificationRecord> = prepared
            .iter()
            .zip(results)
            .map(|(message, result)| {
                let company = self.companies.extract(message);
                ClassificationRecord::new(message, result, company)
            })
            .collect();

        let fallbacks = records.iter().filter(|r| r.is_fallback()).count();
        info!(
            "✅ Classified {} email(s) ({} via keyword fallback)",
            records.len(),
            fallbacks
        );

        Ok(records)
    }

    /// Backend inputs for each message, as they are sent on the wire.
    pub fn backend_inputs(&self, messages: &[RawMessage]) -> Vec<String> {
        messages
            .iter()
            .map(|message| self.classifier.render_input(&message.with_extracted_body()))
            .collect()
    }
}
