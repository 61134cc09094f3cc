//! RFC 822 messages (`.eml` files) turned into [`RawMessage`]s.
use base64::{engine::general_purpose, Engine as _};
use log::debug;
use mail_parser::{Message, MessageParser, MimeHeaders, PartType};

use super::common::{ContentNode, RawMessage};

/// Parse raw RFC 822 bytes into a message. The body is left empty; the
/// pipeline fills it from the content tree.
pub fn raw_message(id: &str, raw: &[u8]) -> Option<RawMessage> {
    let parsed = MessageParser::default().parse(raw)?;

    let sender = parsed
        .from()
        .and_then(|addrs| addrs.first())
        .map(|addr| match (&addr.name, &addr.address) {
            (Some(name), Some(email)) => format!("{} <{}>", name, email),
            (None, Some(email)) => email.to_string(),
            _ => String::new(),
        })
        .unwrap_or_default();

    let received_at = parsed
        .date()
        .and_then(|date| chrono::DateTime::from_timestamp(date.to_timestamp(), 0));

    let mut message = RawMessage::new(
        id,
        parsed.subject().unwrap_or_default(),
        sender,
        String::new(),
    );
    message.content = Some(tree_from(&parsed, 0));
    message.received_at = received_at;

    Some(message)
}

/// Content tree of a raw RFC 822 message.
pub fn content_tree(raw: &[u8]) -> Option<ContentNode> {
    let parsed = MessageParser::default().parse(raw)?;
    Some(tree_from(&parsed, 0))
}

fn tree_from(message: &Message, part_id: usize) -> ContentNode {
    let Some(part) = message.parts.get(part_id) else {
        return ContentNode::container(Vec::new());
    };

    let mime_type = part
        .content_type()
        .map(|ct| match &ct.c_subtype {
            Some(subtype) => format!("{}/{}", ct.c_type, subtype),
            None => ct.c_type.to_string(),
        })
        .unwrap_or_else(|| "text/plain".to_string());

    match &part.body {
        PartType::Multipart(children) => {
            ContentNode::container(children.iter().map(|id| tree_from(message, *id)).collect())
        }
        PartType::Text(text) => {
            ContentNode::leaf(mime_type, general_purpose::URL_SAFE.encode(text.as_bytes()))
        }
        PartType::Html(html) => {
            ContentNode::leaf(mime_type, general_purpose::URL_SAFE.encode(html.as_bytes()))
        }
        PartType::Binary(bytes) | PartType::InlineBinary(bytes) => {
            ContentNode::leaf(mime_type, general_purpose::URL_SAFE.encode(bytes))
        }
        PartType::Message(_) => {
            debug!("Skipping attached message in part {}", part_id);
            ContentNode::leaf("message/rfc822", String::new())
        }
    }
}
