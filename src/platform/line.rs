use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::config::LineConfig;
use crate::platform::{GroupSummary, MemberCount, OutgoingMessage, PlatformClient, UserProfile};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplyRequest<'a> {
    reply_token: &'a str,
    messages: &'a [OutgoingMessage],
}

/// LINE Messaging API client authorised by a channel access token.
pub struct LineClient {
    client: reqwest::Client,
    access_token: String,
    base_url: String,
}

impl LineClient {
    pub fn new(config: &LineConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            access_token: config.channel_access_token.clone(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", path))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("LINE API error ({}) on {}: {}", status, path, error_body);
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse response from {}", path))
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: Option<&B>) -> Result<()> {
        let url = self.url(path);
        debug!("POST {}", url);

        let mut request = self.client.post(&url).bearer_auth(&self.access_token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", path))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("LINE API error ({}) on {}: {}", status, path, error_body);
        }

        Ok(())
    }
}

#[async_trait]
impl PlatformClient for LineClient {
    async fn reply_message(&self, reply_token: &str, messages: &[OutgoingMessage]) -> Result<()> {
        let request = ReplyRequest {
            reply_token,
            messages,
        };
        self.post("/v2/bot/message/reply", Some(&request)).await
    }

    async fn group_member_profile(&self, group_id: &str, user_id: &str) -> Result<UserProfile> {
        self.get(&format!("/v2/bot/group/{}/member/{}", group_id, user_id))
            .await
    }

    async fn room_member_profile(&self, room_id: &str, user_id: &str) -> Result<UserProfile> {
        self.get(&format!("/v2/bot/room/{}/member/{}", room_id, user_id))
            .await
    }

    async fn group_summary(&self, group_id: &str) -> Result<GroupSummary> {
        self.get(&format!("/v2/bot/group/{}/summary", group_id))
            .await
    }

    async fn group_member_count(&self, group_id: &str) -> Result<MemberCount> {
        self.get(&format!("/v2/bot/group/{}/members/count", group_id))
            .await
    }

    async fn room_member_count(&self, room_id: &str) -> Result<MemberCount> {
        self.get(&format!("/v2/bot/room/{}/members/count", room_id))
            .await
    }

    async fn leave_group(&self, group_id: &str) -> Result<()> {
        self.post::<()>(&format!("/v2/bot/group/{}/leave", group_id), None)
            .await
    }

    async fn leave_room(&self, room_id: &str) -> Result<()> {
        self.post::<()>(&format!("/v2/bot/room/{}/leave", room_id), None)
            .await
    }
}
