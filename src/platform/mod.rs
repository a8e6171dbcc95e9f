#[cfg(test)]
pub mod fake;
pub mod line;
pub mod webhook;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Profile of a user as returned by the member-profile endpoints.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub display_name: String,
    pub user_id: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub status_message: String,
    #[serde(default)]
    pub picture_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    pub group_id: String,
    pub group_name: String,
    #[serde(default)]
    pub picture_url: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct MemberCount {
    pub count: u64,
}

/// A message object sent back to a conversation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutgoingMessage {
    Text {
        text: String,
    },
    Image {
        #[serde(rename = "originalContentUrl")]
        original_content_url: String,
        #[serde(rename = "previewImageUrl")]
        preview_image_url: String,
    },
}

impl OutgoingMessage {
    pub fn text(text: impl Into<String>) -> Self {
        OutgoingMessage::Text { text: text.into() }
    }

    /// Image message using the same URL for the full image and its preview.
    pub fn image(url: impl Into<String>) -> Self {
        let url = url.into();
        OutgoingMessage::Image {
            original_content_url: url.clone(),
            preview_image_url: url,
        }
    }
}

/// Outbound operations the dispatcher needs from the messaging platform.
///
/// Implementations must be safe to share across concurrent webhook
/// deliveries; every method is a single request with no retries.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    async fn reply_message(&self, reply_token: &str, messages: &[OutgoingMessage]) -> Result<()>;

    async fn group_member_profile(&self, group_id: &str, user_id: &str) -> Result<UserProfile>;

    async fn room_member_profile(&self, room_id: &str, user_id: &str) -> Result<UserProfile>;

    async fn group_summary(&self, group_id: &str) -> Result<GroupSummary>;

    async fn group_member_count(&self, group_id: &str) -> Result<MemberCount>;

    async fn room_member_count(&self, room_id: &str) -> Result<MemberCount>;

    async fn leave_group(&self, group_id: &str) -> Result<()>;

    async fn leave_room(&self, room_id: &str) -> Result<()>;
}
