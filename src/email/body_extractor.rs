use base64::{engine::general_purpose, Engine as _};
use log::{debug, warn};
use regex::Regex;
use std::sync::OnceLock;

use super::common::ContentNode;
use crate::error::ExtractionError;

/// Walk a content tree and return the first readable text part.
///
/// Containers are searched child by child in order; the first child that
/// yields non-blank text wins, so a `text/plain` alternative is preferred
/// over the `text/html` one that usually follows it.
pub fn extract_body(node: &ContentNode) -> String {
    match node {
        ContentNode::Container { children } => children
            .iter()
            .map(extract_body)
            .find(|text| !text.trim().is_empty())
            .unwrap_or_default(),
        ContentNode::Leaf { mime_type, payload } => match essence(mime_type).as_str() {
            "text/plain" => decode_or_empty(payload, mime_type),
            "text/html" => html_to_text(&decode_or_empty(payload, mime_type)),
            other => {
                debug!("Skipping {} part", other);
                String::new()
            }
        },
    }
}

/// `Text/HTML; charset=utf-8` -> `text/html`
fn essence(mime_type: &str) -> String {
    mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn decode_or_empty(payload: &str, mime_type: &str) -> String {
    match decode_payload(payload) {
        Ok(text) => text,
        Err(e) => {
            warn!("Unable to decode {} payload: {}", mime_type, e);
            String::new()
        }
    }
}

/// Decode a part payload. Gmail uses the URL-safe alphabet, raw MIME the
/// standard one; padding is optional in both.
pub fn decode_payload(payload: &str) -> Result<String, ExtractionError> {
    let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();

    let engines = [
        &general_purpose::URL_SAFE,
        &general_purpose::URL_SAFE_NO_PAD,
        &general_purpose::STANDARD,
        &general_purpose::STANDARD_NO_PAD,
    ];

    let bytes = engines
        .iter()
        .find_map(|engine| engine.decode(&cleaned).ok())
        .ok_or(ExtractionError::Base64)?;

    Ok(String::from_utf8(bytes)?)
}

fn html_patterns() -> &'static (Regex, Regex, Regex) {
    static PATTERNS: OnceLock<(Regex, Regex, Regex)> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        (
            // Invisible content
            Regex::new(r"(?is)<!--.*?-->|<script\b.*?</script\s*>|<style\b.*?</style\s*>|<head\b.*?</head\s*>")
                .expect("valid invisible-content pattern"),
            // Block-level boundaries
            Regex::new(r"(?i)</?(?:p|div|br|li|ul|ol|tr|td|th|table|h[1-6]|blockquote|hr|section|article|header|footer|pre)\b[^>]*>")
                .expect("valid block-tag pattern"),
            Regex::new(r"<[^>]*>").expect("valid tag pattern"),
        )
    })
}

/// Readable-text projection of an HTML document: one line per block,
/// surrounding whitespace trimmed, blank lines dropped.
pub fn html_to_text(html: &str) -> String {
    let (invisible, blocks, tags) = html_patterns();

    let text = invisible.replace_all(html, "");
    let text = blocks.replace_all(&text, "\n");
    let text = tags.replace_all(&text, "");
    let text = decode_entities(&text);

    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn decode_entities(text: &str) -> String {
    static ENTITY: OnceLock<Regex> = OnceLock::new();
    let entity = ENTITY.get_or_init(|| {
        Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").expect("valid entity pattern")
    });

    entity
        .replace_all(text, |caps: &regex::Captures| {
            let name = &caps[1];
            let decoded = match name {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some(' '),
                _ if name.starts_with("#x") || name.starts_with("#X") => {
                    u32::from_str_radix(&name[2..], 16).ok().and_then(char::from_u32)
                }
                _ if name.starts_with('#') => name[1..].parse().ok().and_then(char::from_u32),
                _ => None,
            };
            decoded.map(String::from).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
