/// Status classification: backend call with keyword-cue fallback
pub mod backend;
pub mod cohere;
pub mod cues;
pub mod label;
pub mod label_classifier;

use log::info;
use std::sync::Arc;

pub use backend::{ClassificationBackend, DiscriminativeBackend, GenerativeBackend, Prediction};
pub use cues::{match_cues, CUE_TABLE};
pub use label::{ClassificationResult, LabelSource, StatusLabel};
pub use label_classifier::LabelClassifier;

use crate::config::{ClassifierConfig, ClassifierMode};
use cohere::CohereClient;

/// Build the configured backend handle and wrap it in a classifier.
pub fn build_classifier(config: &ClassifierConfig) -> LabelClassifier {
    let client = CohereClient::new(config.api_key.clone(), config.base_url.clone());

    let backend: Arc<dyn ClassificationBackend> = match config.mode {
        ClassifierMode::Generate => Arc::new(GenerativeBackend::new(
            client,
            config.model_id.clone(),
            config.max_tokens,
        )),
        ClassifierMode::Classify => Arc::new(DiscriminativeBackend::new(
            client,
            config.model_id.clone(),
            config.examples.clone(),
        )),
    };

    info!(
        "🏷️  Classification backend: {} (model {}, timeout {:?}, concurrency {})",
        backend.name(),
        config.model_id,
        config.timeout,
        config.concurrency
    );

    LabelClassifier::new(backend)
        .with_timeout(config.timeout)
        .with_concurrency(config.concurrency)
}
