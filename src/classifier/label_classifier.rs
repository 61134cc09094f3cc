use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, StreamExt};
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;

use super::backend::ClassificationBackend;
use super::cues::match_cues;
use super::label::ClassificationResult;
use crate::email::RawMessage;
use crate::error::{BackendError, PipelineError};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Labels messages with a backend, falling back to keyword cues whenever
/// the backend fails or answers outside the label vocabulary.
#[derive(Clone)]
pub struct LabelClassifier {
    backend: Arc<dyn ClassificationBackend>,
    timeout: Duration,
    concurrency: usize,
}

/// Results for one backend invocation, plus the error that forced the
/// fallback if any.
struct ChunkOutcome {
    results: Vec<ClassificationResult>,
    error: Option<BackendError>,
}

impl LabelClassifier {
    pub fn new(backend: Arc<dyn ClassificationBackend>) -> Self {
        LabelClassifier {
            backend,
            timeout: DEFAULT_TIMEOUT,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn render_input(&self, message: &RawMessage) -> String {
        self.backend.render_input(message)
    }

    /// Classify one message. Never fails.
    pub async fn classify(&self, message: &RawMessage) -> ClassificationResult {
        let mut outcome = self.classify_chunk(std::slice::from_ref(message)).await;
        outcome
            .results
            .pop()
            .unwrap_or_else(|| Self::fallback(message))
    }

    /// Classify a batch, one result per message in input order.
    ///
    /// Messages are grouped up to the backend's batch limit and the groups
    /// are sent concurrently. Only a total outage, where every invocation
    /// failed because the backend was unreachable, is an error.
    pub async fn classify_batch(
        &self,
        messages: &[RawMessage],
    ) -> Result<Vec<ClassificationResult>, PipelineError> {
        if messages.is_empty() {
            return Ok(Vec::new());
        }

        let chunk_size = self.backend.batch_limit().max(1);
        // Boxed up front so the batch future stays Send for spawned runs
        let invocations: Vec<BoxFuture<'_, ChunkOutcome>> = messages
            .chunks(chunk_size)
            .map(|chunk| self.classify_chunk(chunk).boxed())
            .collect();
        let outcomes: Vec<ChunkOutcome> = stream::iter(invocations)
            .buffered(self.concurrency)
            .collect()
            .await;

        let attempts = outcomes.len();
        if outcomes
            .iter()
            .all(|outcome| outcome.error.as_ref().is_some_and(BackendError::is_outage))
        {
            let last = outcomes
                .into_iter()
                .rev()
                .find_map(|outcome| outcome.error)
                .unwrap_or_else(|| BackendError::Unavailable("no response".into()));
            return Err(PipelineError::BackendUnavailable { attempts, last });
        }

        Ok(outcomes.into_iter().flat_map(|outcome| outcome.results).collect())
    }

    async fn classify_chunk(&self, chunk: &[RawMessage]) -> ChunkOutcome {
        let inputs: Vec<String> = chunk.iter().map(|m| self.backend.render_input(m)).collect();

        let predictions = match tokio::time::timeout(self.timeout, self.backend.predict(&inputs)).await {
            Ok(Ok(predictions)) if predictions.len() == chunk.len() => predictions,
            Ok(Ok(predictions)) => {
                return self.fallback_chunk(
                    chunk,
                    BackendError::LengthMismatch {
                        expected: chunk.len(),
                        actual: predictions.len(),
                    },
                )
            }
            Ok(Err(e)) => return self.fallback_chunk(chunk, e),
            Err(_) => return self.fallback_chunk(chunk, BackendError::Timeout(self.timeout)),
        };

        let results = chunk
            .iter()
            .zip(predictions)
            .map(|(message, prediction)| match prediction.into_result() {
                Ok(result) => {
                    debug!("Email {} labelled {} by {}", message.id, result.label, self.backend.name());
                    result
                }
                Err(e) => {
                    warn!("Email {}: {} - using keyword cues", message.id, e);
                    Self::fallback(message)
                }
            })
            .collect();

        ChunkOutcome { results, error: None }
    }

    fn fallback_chunk(&self, chunk: &[RawMessage], error: BackendError) -> ChunkOutcome {
        warn!(
            "{} failed for {} email(s): {} - using keyword cues",
            self.backend.name(),
            chunk.len(),
            error
        );

        ChunkOutcome {
            results: chunk.iter().map(Self::fallback).collect(),
            error: Some(error),
        }
    }

    fn fallback(message: &RawMessage) -> ClassificationResult {
        ClassificationResult::fallback(match_cues(&message.cue_text()))
    }
}
