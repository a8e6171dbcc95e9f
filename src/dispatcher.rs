use std::sync::Arc;

use anyhow::{anyhow, Result};
use tracing::{debug, error, info, warn};

use crate::platform::webhook::{Event, EventType, Message, Source};
use crate::platform::{OutgoingMessage, PlatformClient, UserProfile};
use crate::replies;

/// Routes webhook events to canned replies.
///
/// Holds no per-request state, so one instance serves every delivery.
/// Failures are logged and never escape a single event.
#[derive(Clone)]
pub struct Dispatcher {
    client: Arc<dyn PlatformClient>,
}

impl Dispatcher {
    pub fn new(client: Arc<dyn PlatformClient>) -> Self {
        Self { client }
    }

    /// Handle `events` one after another, in delivery order.
    pub async fn dispatch(&self, events: &[Event]) {
        for event in events {
            self.handle_event(event).await;
        }
    }

    async fn handle_event(&self, event: &Event) {
        debug!(
            "Handling {:?} event {} (timestamp {})",
            event.kind,
            event.webhook_event_id.as_deref().unwrap_or("-"),
            event.timestamp
        );

        let source = match &event.source {
            Some(Source::Unknown) | None => {
                debug!("Ignoring {:?} event without a known source", event.kind);
                return;
            }
            Some(source) => source,
        };

        match event.kind {
            EventType::Message => match &event.message {
                Some(Message::Text { text }) => {
                    if let Some(token) = reply_token(event) {
                        self.handle_text(token, source, text).await;
                    }
                }
                Some(
                    Message::Image
                    | Message::Video
                    | Message::Audio
                    | Message::File
                    | Message::Location
                    | Message::Sticker
                    | Message::Unsupported,
                )
                | None => debug!("Ignoring non-text message"),
            },
            EventType::Join => {
                if let Some(token) = reply_token(event) {
                    self.handle_join(token, source).await;
                }
            }
            EventType::Leave
            | EventType::Follow
            | EventType::Unfollow
            | EventType::Postback
            | EventType::Beacon
            | EventType::MemberJoined
            | EventType::MemberLeft
            | EventType::Unknown => debug!("Ignoring {:?} event", event.kind),
        }
    }

    async fn handle_text(&self, reply_token: &str, source: &Source, text: &str) {
        if let Source::User { user_id } = source {
            info!("Text message from user {}", user_id);
            self.reply(reply_token, &replies::echo_reply(text)).await;
            return;
        }

        if replies::is_farewell(text) {
            info!("Farewell requested in {}", describe(source));
            self.reply(reply_token, &replies::farewell_reply()).await;
            self.leave(source).await;
            return;
        }

        match self.member_profile(source).await {
            Ok(profile) => {
                self.reply(reply_token, &replies::profile_reply(&profile))
                    .await
            }
            // No fallback reply when the profile is unavailable.
            Err(e) => warn!(
                "Failed to fetch member profile in {}: {:#}",
                describe(source),
                e
            ),
        }
    }

    async fn handle_join(&self, reply_token: &str, source: &Source) {
        match source {
            Source::Group { group_id, .. } => {
                info!("Joined group {}", group_id);
                let summary = match self.client.group_summary(group_id).await {
                    Ok(summary) => summary,
                    Err(e) => {
                        warn!("Failed to fetch summary of group {}: {:#}", group_id, e);
                        return;
                    }
                };
                debug!("Group {} is named {}", summary.group_id, summary.group_name);
                let members = match self.client.group_member_count(group_id).await {
                    Ok(members) => members,
                    Err(e) => {
                        warn!("Failed to fetch member count of group {}: {:#}", group_id, e);
                        return;
                    }
                };
                self.reply(reply_token, &replies::group_join_reply(&summary, members))
                    .await;
            }
            Source::Room { room_id, .. } => {
                info!("Joined room {}", room_id);
                match self.client.room_member_count(room_id).await {
                    Ok(members) => {
                        self.reply(reply_token, &replies::room_join_reply(members))
                            .await
                    }
                    Err(e) => warn!("Failed to fetch member count of room {}: {:#}", room_id, e),
                }
            }
            Source::User { .. } | Source::Unknown => {
                debug!("Ignoring join event from {}", describe(source))
            }
        }
    }

    async fn member_profile(&self, source: &Source) -> Result<UserProfile> {
        match source {
            Source::Group {
                group_id,
                user_id: Some(user_id),
            } => self.client.group_member_profile(group_id, user_id).await,
            Source::Room {
                room_id,
                user_id: Some(user_id),
            } => self.client.room_member_profile(room_id, user_id).await,
            Source::Group { user_id: None, .. } | Source::Room { user_id: None, .. } => {
                Err(anyhow!("event carries no sender user id"))
            }
            Source::User { .. } | Source::Unknown => {
                Err(anyhow!("{} has no member profile", describe(source)))
            }
        }
    }

    /// Leave a group or room. Best effort: a failure is only logged.
    async fn leave(&self, source: &Source) {
        let result = match source {
            Source::Group { group_id, .. } => self.client.leave_group(group_id).await,
            Source::Room { room_id, .. } => self.client.leave_room(room_id).await,
            Source::User { .. } | Source::Unknown => return,
        };
        if let Err(e) = result {
            warn!("Failed to leave {}: {:#}", describe(source), e);
        }
    }

    async fn reply(&self, reply_token: &str, messages: &[OutgoingMessage]) {
        if let Err(e) = self.client.reply_message(reply_token, messages).await {
            error!("Failed to send reply: {:#}", e);
        }
    }
}

fn reply_token(event: &Event) -> Option<&str> {
    let token = event.reply_token.as_deref().filter(|t| !t.is_empty());
    if token.is_none() {
        debug!("Ignoring {:?} event without a reply token", event.kind);
    }
    token
}

fn describe(source: &Source) -> String {
    match source {
        Source::User { user_id } => format!("direct chat {}", user_id),
        Source::Group { group_id, .. } => format!("group {}", group_id),
        Source::Room { room_id, .. } => format!("room {}", room_id),
        Source::Unknown => "unknown source".to_string(),
    }
}
