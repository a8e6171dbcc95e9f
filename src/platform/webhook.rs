//! Inbound webhook payloads and their signature check.
//!
//! LINE signs every delivery with `X-Line-Signature`, the base64-encoded
//! HMAC-SHA256 of the raw request body keyed by the channel secret. The body
//! is only deserialized once the signature has been verified.

use base64::{engine::general_purpose::STANDARD, Engine};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the webhook signature.
pub const SIGNATURE_HEADER: &str = "x-line-signature";

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("invalid webhook signature")]
    InvalidSignature,
    #[error("malformed webhook payload: {0}")]
    Payload(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct WebhookPayload {
    // Decoded one by one so a single odd event cannot sink the delivery.
    events: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventType {
    Message,
    Join,
    Leave,
    Follow,
    Unfollow,
    Postback,
    Beacon,
    MemberJoined,
    MemberLeft,
    #[serde(other)]
    Unknown,
}

/// Where an event originated. Exactly one of a direct chat, a group or a room.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Source {
    User {
        #[serde(rename = "userId")]
        user_id: String,
    },
    Group {
        #[serde(rename = "groupId")]
        group_id: String,
        #[serde(rename = "userId")]
        user_id: Option<String>,
    },
    Room {
        #[serde(rename = "roomId")]
        room_id: String,
        #[serde(rename = "userId")]
        user_id: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

/// Message payload. Only text carries content the bot acts on.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
    Text {
        text: String,
    },
    Image,
    Video,
    Audio,
    File,
    Location,
    Sticker,
    #[serde(other)]
    Unsupported,
}

/// A single event from a webhook delivery.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: EventType,
    /// Absent on events that cannot be replied to (leave, unfollow, ...).
    #[serde(default)]
    pub reply_token: Option<String>,
    #[serde(default)]
    pub source: Option<Source>,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub webhook_event_id: Option<String>,
}

/// Verifies and decodes webhook deliveries for one channel.
#[derive(Clone)]
pub struct WebhookParser {
    channel_secret: String,
}

impl WebhookParser {
    pub fn new(channel_secret: impl Into<String>) -> Self {
        Self {
            channel_secret: channel_secret.into(),
        }
    }

    /// Check the signature, then decode the events in delivery order.
    ///
    /// Events that do not decode are logged and skipped; only a malformed
    /// envelope fails the whole delivery.
    pub fn parse_request(
        &self,
        signature: Option<&str>,
        body: &[u8],
    ) -> Result<Vec<Event>, ParseError> {
        let signature = signature.ok_or(ParseError::InvalidSignature)?;
        if !self.verify_signature(signature, body) {
            return Err(ParseError::InvalidSignature);
        }

        let payload: WebhookPayload = serde_json::from_slice(body)?;
        let events = payload
            .events
            .into_iter()
            .enumerate()
            .filter_map(|(index, raw)| match serde_json::from_value(raw) {
                Ok(event) => Some(event),
                Err(e) => {
                    warn!("Skipping undecodable webhook event #{}: {}", index, e);
                    None
                }
            })
            .collect();
        Ok(events)
    }

    pub fn verify_signature(&self, signature: &str, body: &[u8]) -> bool {
        let Ok(expected) = STANDARD.decode(signature.trim()) else {
            return false;
        };
        let Ok(mut mac) = HmacSha256::new_from_slice(self.channel_secret.as_bytes()) else {
            return false;
        };
        mac.update(body);
        // Constant-time comparison
        mac.verify_slice(&expected).is_ok()
    }

    /// Signature LINE would send for `body`.
    #[cfg(test)]
    pub(crate) fn signature_for(&self, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(self.channel_secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(body);
        STANDARD.encode(mac.finalize().into_bytes())
    }
}
