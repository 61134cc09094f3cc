use anyhow::{Context, Result};
use log::{error, info, warn};
use std::path::{Path, PathBuf};

use super::common::{ClassificationRecord, ProcessingResult, RawMessage};
use super::mime;
use crate::artifacts::ArtifactWriter;
use crate::config::Config;
use crate::gmail_client::GmailClient;
use crate::pipeline::Pipeline;
use crate::slack_notifier::SlackNotifier;

/// Where a run reads its messages from.
#[derive(Debug, Clone)]
pub enum MessageSource {
    /// Gmail search with the configured query
    Gmail,
    /// JSON array of raw messages
    JsonFile(PathBuf),
    /// Directory of `.eml` files; the file stem is the message id
    EmlDir(PathBuf),
}

impl MessageSource {
    pub fn describe(&self) -> String {
        match self {
            MessageSource::Gmail => "Gmail".to_string(),
            MessageSource::JsonFile(path) => format!("JSON file {}", path.display()),
            MessageSource::EmlDir(path) => format!("EML directory {}", path.display()),
        }
    }
}

/// One tracker run: fetch messages, classify, persist, report.
pub struct JobTracker {
    config: Config,
    source: MessageSource,
    pipeline: Pipeline,
    slack: Option<SlackNotifier>,
    dry_run: bool,
}

impl JobTracker {
    pub fn new(config: Config, source: MessageSource) -> Result<Self> {
        info!("Initializing job tracker ({})", source.describe());

        let slack = if let Some(slack_config) = &config.slack {
            match SlackNotifier::new(slack_config) {
                Ok(notifier) => {
                    info!("✅ Slack notifications enabled");
                    Some(notifier)
                }
                Err(e) => {
                    warn!("⚠️  Unable to initialize Slack notifier: {} - notifications disabled", e);
                    None
                }
            }
        } else {
            info!("ℹ️  Slack notifications not configured");
            None
        };

        Ok(JobTracker {
            pipeline: Pipeline::from_config(&config)?,
            config,
            source,
            slack,
            dry_run: false,
        })
    }

    pub fn new_dry_run(config: Config, source: MessageSource) -> Result<Self> {
        info!("🧪 Initializing job tracker in dry-run mode ({})", source.describe());

        Ok(JobTracker {
            pipeline: Pipeline::from_config(&config)?,
            config,
            source,
            slack: None, // No Slack notifications in dry-run mode
            dry_run: true,
        })
    }

    /// Replace the configured pipeline.
    pub fn with_pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub async fn run(&self, limit: Option<usize>) -> Result<ProcessingResult> {
        if self.dry_run {
            println!("\n{}", "=".repeat(80));
            println!("🧪 MODE DRY-RUN - JOB APPLICATION EMAILS");
            println!("{}", "=".repeat(80));
        }

        let mut result = ProcessingResult::new();
        let messages = self.fetch_messages(limit, &mut result).await?;

        if messages.is_empty() {
            if self.dry_run {
                println!("❌ No emails found ({})", self.source.describe());
            } else {
                info!("No emails found ({})", self.source.describe());
            }
            return Ok(result);
        }

        let records = match self.pipeline.process(&messages).await {
            Ok(records) => records,
            Err(e) => {
                error!("❌ Classification aborted: {}", e);
                if let Some(slack) = &self.slack {
                    if let Err(slack_error) = slack.notify_error(&e.to_string()).await {
                        warn!("{}", slack_error);
                    }
                }
                return Err(e).context("Classification run failed");
            }
        };

        result.emails_processed += records.len();
        result.fallbacks = records.iter().filter(|r| r.is_fallback()).count();

        if self.dry_run {
            print_records(&records);
        } else {
            let writer = ArtifactWriter::new(&self.config.data_dir)?;
            writer.write_all(&self.pipeline.backend_inputs(&messages), &records)?;

            if let Some(slack) = &self.slack {
                if let Err(e) = slack.notify_batch(&records).await {
                    warn!("⚠️  {}", e);
                }
            }
        }

        info!(
            "Processing completed: {} emails classified, {} failed to load, {} keyword fallback(s)",
            result.emails_processed, result.emails_failed, result.fallbacks
        );

        Ok(result)
    }

    async fn fetch_messages(&self, limit: Option<usize>, result: &mut ProcessingResult) -> Result<Vec<RawMessage>> {
        let mut messages = match &self.source {
            MessageSource::Gmail => {
                let gmail_config = self
                    .config
                    .gmail
                    .as_ref()
                    .context("GMAIL_CREDENTIALS_PATH is required to read from Gmail")?;

                let gmail = GmailClient::new(gmail_config)
                    .await
                    .context("Unable to connect to Gmail API")?;
                let message_ids = gmail.search_messages(&gmail_config.query, limit).await?;

                let mut messages = Vec::with_capacity(message_ids.len());
                for message_id in &message_ids {
                    match gmail.fetch_message(message_id).await {
                        Ok(message) => messages.push(message),
                        Err(e) => {
                            error!("Error retrieving email {}: {:#}", message_id, e);
                            result.failure();
                        }
                    }
                }
                messages
            }
            MessageSource::JsonFile(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Unable to read {}", path.display()))?;
                serde_json::from_str::<Vec<RawMessage>>(&content)
                    .with_context(|| format!("Invalid message file {}", path.display()))?
            }
            MessageSource::EmlDir(dir) => load_eml_dir(dir, result)?,
        };

        if let Some(limit) = limit {
            messages.truncate(limit);
        }
        Ok(messages)
    }
}

fn load_eml_dir(dir: &Path, result: &mut ProcessingResult) -> Result<Vec<RawMessage>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("Unable to read directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .map(|ext| ext.eq_ignore_ascii_case("eml"))
                .unwrap_or(false)
        })
        .collect();
    paths.sort();

    let mut messages = Vec::with_capacity(paths.len());
    for path in paths {
        let id = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_default();

        let parsed = std::fs::read(&path)
            .ok()
            .and_then(|raw| mime::raw_message(&id, &raw));
        match parsed {
            Some(message) => messages.push(message),
            None => {
                warn!("Skipping unreadable email file {}", path.display());
                result.failure();
            }
        }
    }

    Ok(messages)
}

fn print_records(records: &[ClassificationRecord]) {
    for (index, record) in records.iter().enumerate() {
        println!("📧 Email {}/{} (ID: {})", index + 1, records.len(), record.email_id);
        println!("   Subject: {}", record.subject);
        println!("   Status: {}", record.classification);
        match record.confidence {
            Some(confidence) => println!("   Confidence: {:.2}", confidence),
            None if record.is_fallback() => println!("   Confidence: - (keyword fallback)"),
            None => println!("   Confidence: -"),
        }
        println!("   Company: {}\n", record.company);
    }

    println!("{}", "=".repeat(80));
    println!("🏁 Analysis completed: {} emails classified", records.len());
    println!("{}", "=".repeat(80));
}
