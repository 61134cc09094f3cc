use anyhow::{Context, Result};
use log::{error, info};
use slack_morphism::prelude::*;

use crate::classifier::StatusLabel;
use crate::config::SlackConfig;
use crate::email::ClassificationRecord;

pub struct SlackNotifier {
    client: SlackClient<SlackClientHyperHttpsConnector>,
    token: SlackApiToken,
    channel_id: SlackChannelId,
}

impl SlackNotifier {
    pub fn new(config: &SlackConfig) -> Result<Self> {
        info!("Initializing Slack notifier");

        let client = SlackClient::new(SlackClientHyperHttpsConnector::new()?);
        let token = SlackApiToken::new(config.bot_token.clone().into());
        let channel_id = SlackChannelId::new(config.channel_id.clone());

        Ok(SlackNotifier {
            client,
            token,
            channel_id,
        })
    }

    pub async fn send_message(&self, text: &str) -> Result<()> {
        let request = SlackApiChatPostMessageRequest::new(
            self.channel_id.clone(),
            SlackMessageContent::new().with_text(text.to_string()),
        );

        let session = self.client.open_session(&self.token);

        match session.chat_post_message(&request).await {
            Ok(response) => {
                info!("✅ Slack message sent: {:?}", response.ts);
                Ok(())
            }
            Err(e) => {
                error!("❌ Error sending Slack message: {}", e);
                Err(anyhow::anyhow!("Unable to send Slack message: {}", e))
            }
        }
    }

    /// Summary of a classified batch.
    pub async fn notify_batch(&self, records: &[ClassificationRecord]) -> Result<()> {
        info!("Sending Slack summary for {} record(s)", records.len());
        self.send_message(&batch_summary(records))
            .await
            .context("Unable to send Slack batch summary")
    }

    pub async fn notify_error(&self, error_message: &str) -> Result<()> {
        let text = format!("❌ *Job tracker run failed*\n```{}```", error_message);
        self.send_message(&text)
            .await
            .context("Unable to send Slack error message")
    }
}

/// Slack text for a batch: per-label counts, then one line per email.
pub fn batch_summary(records: &[ClassificationRecord]) -> String {
    let mut text = format!("📬 *{} job email(s) classified*\n", records.len());

    for label in StatusLabel::ALL {
        let count = records.iter().filter(|r| r.classification == label).count();
        if count > 0 {
            text.push_str(&format!("• {}: *{}*\n", label, count));
        }
    }

    if !records.is_empty() {
        text.push('\n');
    }
    for record in records {
        let marker = if record.is_fallback() { " _(keywords)_" } else { "" };
        text.push_str(&format!(
            "  - {} | {} | {}{}\n",
            record.company, record.classification, record.subject, marker
        ));
    }

    text
}
