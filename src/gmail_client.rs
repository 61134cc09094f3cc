use anyhow::{Context, Result};
use base64::{engine::general_purpose, Engine as _};
use google_gmail1::api::{MessagePart, Scope};
use google_gmail1::{hyper, hyper_rustls, oauth2, Gmail};
use log::{debug, info};

use crate::config::GmailConfig;
use crate::email::{ContentNode, RawMessage};

/// Gmail caps a single list page at 500 ids
const MAX_PAGE_SIZE: usize = 500;

pub struct GmailClient {
    hub: Gmail<hyper_rustls::HttpsConnector<hyper::client::HttpConnector>>,
}

impl GmailClient {
    pub async fn new(config: &GmailConfig) -> Result<Self> {
        info!("Connecting to Gmail API via OAuth2");

        let secret = oauth2::read_application_secret(&config.credentials_path)
            .await
            .context("Unable to read OAuth2 client credentials file")?;

        let auth = oauth2::InstalledFlowAuthenticator::builder(
            secret,
            oauth2::InstalledFlowReturnMethod::HTTPRedirect,
        )
        .persist_tokens_to_disk(&config.token_cache_path)
        .build()
        .await
        .context("Unable to create OAuth2 authenticator")?;

        let connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()?
            .https_or_http()
            .enable_http1()
            .build();

        let client = hyper::Client::builder().build(connector);
        let hub = Gmail::new(client, auth);

        info!("✅ Gmail API connection established successfully");

        Ok(GmailClient { hub })
    }

    /// Message ids matching a Gmail search query, newest first.
    pub async fn search_messages(&self, query: &str, limit: Option<usize>) -> Result<Vec<String>> {
        info!("Searching for emails matching '{}'", query);

        let mut message_ids = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let remaining = limit.map(|limit| limit.saturating_sub(message_ids.len()));
            if remaining == Some(0) {
                break;
            }
            let page_size = remaining.unwrap_or(MAX_PAGE_SIZE).min(MAX_PAGE_SIZE);

            let mut request = self
                .hub
                .users()
                .messages_list("me")
                .q(query)
                .max_results(page_size as u32)
                .add_scope(Scope::Readonly);
            if let Some(token) = &page_token {
                request = request.page_token(token);
            }

            let (_, response) = request.doit().await.context("Error searching for emails")?;

            message_ids.extend(
                response
                    .messages
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|msg| msg.id),
            );

            match response.next_page_token {
                Some(token) => {
                    debug!("Fetching next result page ({} ids so far)", message_ids.len());
                    page_token = Some(token);
                }
                None => break,
            }
        }

        if let Some(limit) = limit {
            message_ids.truncate(limit);
        }

        info!("Found {} email(s) matching '{}'", message_ids.len(), query);
        Ok(message_ids)
    }

    /// Full message: headers, receive time and the MIME part tree.
    pub async fn fetch_message(&self, message_id: &str) -> Result<RawMessage> {
        debug!("Retrieving email {}", message_id);

        let (_, message) = self
            .hub
            .users()
            .messages_get("me", message_id)
            .format("full")
            .add_scope(Scope::Readonly)
            .doit()
            .await
            .with_context(|| format!("Unable to retrieve email {}", message_id))?;

        let payload = message.payload.unwrap_or_default();

        let mut subject = String::new();
        let mut sender = String::new();
        for header in payload.headers.iter().flatten() {
            if let (Some(name), Some(value)) = (&header.name, &header.value) {
                if name.eq_ignore_ascii_case("Subject") {
                    subject = value.clone();
                } else if name.eq_ignore_ascii_case("From") {
                    sender = value.clone();
                }
            }
        }

        let mut raw = RawMessage::new(
            message.id.unwrap_or_else(|| message_id.to_string()),
            subject,
            sender,
            "",
        )
        .with_content(content_from_part(&payload));

        if let Some(received_at) = message
            .internal_date
            .and_then(chrono::DateTime::from_timestamp_millis)
        {
            raw = raw.with_received_at(received_at);
        }

        Ok(raw)
    }
}

/// Gmail part tree to content tree. Leaf data arrives decoded and is
/// re-encoded as URL-safe base64.
pub fn content_from_part(part: &MessagePart) -> ContentNode {
    match &part.parts {
        Some(children) if !children.is_empty() => {
            ContentNode::container(children.iter().map(content_from_part).collect())
        }
        _ => {
            let mime_type = part.mime_type.clone().unwrap_or_default();
            let payload = part
                .body
                .as_ref()
                .and_then(|body| body.data.as_deref())
                .map(|data| general_purpose::URL_SAFE.encode(data))
                .unwrap_or_default();
            ContentNode::leaf(mime_type, payload)
        }
    }
}
