use async_trait::async_trait;
use log::debug;

use super::cohere::{ClassifyRequest, CohereClient, GenerateRequest, LabeledExample};
use super::label::{ClassificationResult, StatusLabel};
use crate::email::RawMessage;
use crate::error::BackendError;

/// Largest `inputs` array accepted by one classify call.
pub const CLASSIFY_BATCH_LIMIT: usize = 96;

/// Raw answer of a backend for one input.
#[derive(Debug, Clone, PartialEq)]
pub enum Prediction {
    /// Free text from a generative model.
    Generated(String),
    /// Label picked from a fixed set, with the probability of that label.
    Labelled { label: String, confidence: Option<f64> },
}

impl Prediction {
    /// Canonicalize into the closed label vocabulary.
    pub fn into_result(self) -> Result<ClassificationResult, BackendError> {
        match self {
            Prediction::Generated(text) => {
                if text.trim().is_empty() {
                    return Err(BackendError::EmptyGeneration);
                }
                let label = StatusLabel::parse_lenient(&text)?;
                Ok(ClassificationResult::backend(label, None))
            }
            Prediction::Labelled { label, confidence } => {
                let label = StatusLabel::parse_lenient(&label)?;
                let confidence = confidence.filter(|c| (0.0..=1.0).contains(c));
                Ok(ClassificationResult::backend(label, confidence))
            }
        }
    }
}

/// Capability shared by every classification backend.
///
/// `predict` must return exactly one prediction per input, in input order.
#[async_trait]
pub trait ClassificationBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Backend-specific input string for one message.
    fn render_input(&self, message: &RawMessage) -> String;

    /// How many inputs one `predict` call accepts.
    fn batch_limit(&self) -> usize {
        1
    }

    async fn predict(&self, inputs: &[String]) -> Result<Vec<Prediction>, BackendError>;
}

/// Prompt for the fine-tuned generative model. Field order and labels are
/// what the model was tuned on.
pub fn build_prompt(message: &RawMessage) -> String {
    format!(
        "You label job application emails into exactly one class from this set: \
         Application Received, Interview, Rejected.\n\
         Reply with only the class name, nothing else.\n\
         Subject: {}\n\
         Sender: {}\n\
         Body:\n\
         {}\n",
        message.subject, message.sender, message.body
    )
}

/// Input line for the classify endpoint.
pub fn build_classify_input(message: &RawMessage) -> String {
    format!(
        "Email ID: {} Subject: {} Sender: {} Body: {}",
        message.id, message.subject, message.sender, message.body
    )
}

pub struct GenerativeBackend {
    client: CohereClient,
    model: String,
    max_tokens: u32,
    stop_sequences: Vec<String>,
}

impl GenerativeBackend {
    pub fn new(client: CohereClient, model: impl Into<String>, max_tokens: u32) -> Self {
        GenerativeBackend {
            client,
            model: model.into(),
            max_tokens,
            stop_sequences: vec!["\n".to_string()],
        }
    }
}

#[async_trait]
impl ClassificationBackend for GenerativeBackend {
    fn name(&self) -> &str {
        "cohere-generate"
    }

    fn render_input(&self, message: &RawMessage) -> String {
        build_prompt(message)
    }

    async fn predict(&self, inputs: &[String]) -> Result<Vec<Prediction>, BackendError> {
        let mut predictions = Vec::with_capacity(inputs.len());

        for prompt in inputs {
            let response = self
                .client
                .generate(&GenerateRequest {
                    model: &self.model,
                    prompt,
                    max_tokens: self.max_tokens,
                    temperature: 0.0,
                    stop_sequences: &self.stop_sequences,
                })
                .await?;

            let text = response
                .generations
                .into_iter()
                .next()
                .map(|generation| generation.text)
                .unwrap_or_default();

            debug!("Generated label text: {:?}", text);
            predictions.push(Prediction::Generated(text));
        }

        Ok(predictions)
    }
}

pub struct DiscriminativeBackend {
    client: CohereClient,
    model: String,
    examples: Vec<LabeledExample>,
}

impl DiscriminativeBackend {
    pub fn new(client: CohereClient, model: impl Into<String>, examples: Vec<LabeledExample>) -> Self {
        DiscriminativeBackend {
            client,
            model: model.into(),
            examples,
        }
    }
}

#[async_trait]
impl ClassificationBackend for DiscriminativeBackend {
    fn name(&self) -> &str {
        "cohere-classify"
    }

    fn render_input(&self, message: &RawMessage) -> String {
        build_classify_input(message)
    }

    fn batch_limit(&self) -> usize {
        CLASSIFY_BATCH_LIMIT
    }

    async fn predict(&self, inputs: &[String]) -> Result<Vec<Prediction>, BackendError> {
        let response = self
            .client
            .classify(&ClassifyRequest {
                model: &self.model,
                inputs,
                examples: &self.examples,
            })
            .await?;

        debug!("Received {} classification(s)", response.classifications.len());

        // A missing prediction stays an unparsable item so only that
        // message falls back
        Ok(response
            .classifications
            .into_iter()
            .map(|classification| Prediction::Labelled {
                label: classification.prediction.unwrap_or_default(),
                confidence: classification.confidence,
            })
            .collect())
    }
}
