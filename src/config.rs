use log::warn;
use serde::Deserialize;
use std::time::Duration;

use crate::classifier::cohere::{LabeledExample, DEFAULT_BASE_URL};
use crate::classifier::label_classifier::{DEFAULT_CONCURRENCY, DEFAULT_TIMEOUT};
use crate::error::ConfigError;

#[derive(Debug, Clone)]
pub struct Config {
    pub classifier: ClassifierConfig,
    pub gmail: Option<GmailConfig>,
    pub entity_recognition: bool,
    pub data_dir: String,
    pub scheduler: SchedulerConfig,
    pub slack: Option<SlackConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierMode {
    /// Free-text generation parsed into a label
    Generate,
    /// Label picked from a fixed set, with confidence
    Classify,
}

impl std::str::FromStr for ClassifierMode {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "generate" | "generative" => Ok(ClassifierMode::Generate),
            "classify" | "discriminative" => Ok(ClassifierMode::Classify),
            _ => Err(ConfigError::Invalid {
                name: "CLASSIFIER_MODE",
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Clone)]
pub struct ClassifierConfig {
    pub api_key: String,
    pub model_id: String,
    pub base_url: String,
    pub mode: ClassifierMode,
    pub max_tokens: u32,
    pub timeout: Duration,
    pub concurrency: usize,
    pub examples: Vec<LabeledExample>,
}

impl std::fmt::Debug for ClassifierConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierConfig")
            .field("api_key", &"***")
            .field("model_id", &self.model_id)
            .field("base_url", &self.base_url)
            .field("mode", &self.mode)
            .field("max_tokens", &self.max_tokens)
            .field("timeout", &self.timeout)
            .field("concurrency", &self.concurrency)
            .field("examples", &self.examples.len())
            .finish()
    }
}

impl ClassifierConfig {
    /// Reject settings that would make every backend call fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let missing: Vec<&'static str> = [("COHERE_API_KEY", &self.api_key), ("FT_MODEL_ID", &self.model_id)]
            .into_iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name)
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        if self.timeout.is_zero() {
            return Err(ConfigError::Invalid {
                name: "CLASSIFIER_TIMEOUT_SECS",
                value: "0".to_string(),
            });
        }
        if self.concurrency == 0 {
            return Err(ConfigError::Invalid {
                name: "CLASSIFIER_CONCURRENCY",
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct GmailConfig {
    pub credentials_path: String,
    pub token_cache_path: String,
    pub query: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SchedulerConfig {
    pub enabled: bool,
    pub schedule_times: Vec<String>, // Format: "HH:MM" (e.g., ["08:00", "18:00"])
}

#[derive(Debug, Deserialize, Clone)]
pub struct SlackConfig {
    pub bot_token: String,
    pub channel_id: String,
}

const REQUIRED_VARS: [&str; 2] = ["COHERE_API_KEY", "FT_MODEL_ID"];

impl Config {
    /// Load configuration from the process environment.
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        // Check required variables together so the user sees every missing one
        let missing: Vec<&'static str> = REQUIRED_VARS
            .iter()
            .copied()
            .filter(|name| var(*name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        let examples = match var("CLASSIFIER_EXAMPLES_PATH") {
            Some(path) => load_examples(&path)?,
            None => Vec::new(),
        };

        let classifier = ClassifierConfig {
            api_key: var("COHERE_API_KEY").unwrap_or_default(),
            model_id: var("FT_MODEL_ID").unwrap_or_default(),
            base_url: var("COHERE_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            mode: match var("CLASSIFIER_MODE") {
                Some(mode) => mode.parse()?,
                None => ClassifierMode::Generate,
            },
            max_tokens: parse_or("CLASSIFIER_MAX_TOKENS", var("CLASSIFIER_MAX_TOKENS"), 16)?,
            timeout: Duration::from_secs(parse_or(
                "CLASSIFIER_TIMEOUT_SECS",
                var("CLASSIFIER_TIMEOUT_SECS"),
                DEFAULT_TIMEOUT.as_secs(),
            )?),
            concurrency: parse_or(
                "CLASSIFIER_CONCURRENCY",
                var("CLASSIFIER_CONCURRENCY"),
                DEFAULT_CONCURRENCY,
            )?,
            examples,
        };
        classifier.validate()?;

        let gmail = var("GMAIL_CREDENTIALS_PATH").map(|credentials_path| GmailConfig {
            credentials_path,
            token_cache_path: var("GMAIL_TOKEN_CACHE_PATH")
                .unwrap_or_else(|| "./gmail-token-cache.json".to_string()),
            query: var("GMAIL_QUERY").unwrap_or_else(|| "subject:Thank you".to_string()),
        });

        let slack = match (var("SLACK_BOT_TOKEN"), var("SLACK_CHANNEL_ID")) {
            (Some(bot_token), Some(channel_id)) => Some(SlackConfig {
                bot_token,
                channel_id,
            }),
            _ => {
                warn!("SLACK_BOT_TOKEN or SLACK_CHANNEL_ID not set - Slack notifications disabled");
                None
            }
        };

        Ok(Config {
            classifier,
            gmail,
            entity_recognition: parse_or("ENTITY_RECOGNITION", var("ENTITY_RECOGNITION"), true)?,
            data_dir: var("DATA_DIR").unwrap_or_else(|| "./data".to_string()),
            scheduler: SchedulerConfig {
                enabled: parse_or("SCHEDULER_ENABLED", var("SCHEDULER_ENABLED"), false)?,
                schedule_times: var("SCHEDULER_TIMES")
                    .unwrap_or_else(|| "08:00".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            slack,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    name: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

fn load_examples(path: &str) -> Result<Vec<LabeledExample>, ConfigError> {
    let to_error = |reason: String| ConfigError::Examples {
        path: path.to_string(),
        reason,
    };

    let content = std::fs::read_to_string(path).map_err(|e| to_error(e.to_string()))?;
    serde_json::from_str(&content).map_err(|e| to_error(e.to_string()))
}
