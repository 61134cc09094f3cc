//! Error types shared by the interpretation pipeline.
//!
//! Only [`PipelineError`] ever escapes a batch run. Everything else is
//! recovered where it happens: payload decoding falls back to an empty body,
//! backend failures fall back to the cue matcher.

use std::time::Duration;
use thiserror::Error;

/// Invalid or missing process configuration. Always fatal, raised before
/// the first backend call.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variables: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    #[error("invalid value for {name}: '{value}'")]
    Invalid { name: &'static str, value: String },

    #[error("unable to load labelled examples from {path}: {reason}")]
    Examples { path: String, reason: String },
}

/// A body payload that could not be turned into text.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("payload is not valid base64")]
    Base64,

    #[error("payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Failure of a single classification backend invocation.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend could not be reached at all, or refused our credentials.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("backend returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("backend call timed out after {0:?}")]
    Timeout(Duration),

    #[error("malformed backend response: {0}")]
    Malformed(String),

    #[error("backend returned an empty generation")]
    EmptyGeneration,

    #[error("backend returned {actual} result(s) for {expected} input(s)")]
    LengthMismatch { expected: usize, actual: usize },

    /// The response was well-formed but named none of the known labels.
    #[error("unparsable label: '{0}'")]
    UnparsableLabel(String),
}

impl BackendError {
    /// Outage-class errors count towards a total backend outage.
    pub fn is_outage(&self) -> bool {
        matches!(self, BackendError::Unavailable(_))
    }
}

/// Failures that abort a whole batch.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("classification backend unavailable for all {attempts} invocation(s): {last}")]
    BackendUnavailable { attempts: usize, last: BackendError },
}
