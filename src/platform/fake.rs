//! In-memory `PlatformClient` that records every call.

use std::collections::HashSet;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use crate::platform::{GroupSummary, MemberCount, OutgoingMessage, PlatformClient, UserProfile};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Reply {
        token: String,
        messages: Vec<OutgoingMessage>,
    },
    GroupMemberProfile {
        group_id: String,
        user_id: String,
    },
    RoomMemberProfile {
        room_id: String,
        user_id: String,
    },
    GroupSummary(String),
    GroupMemberCount(String),
    RoomMemberCount(String),
    LeaveGroup(String),
    LeaveRoom(String),
}

/// Operation names accepted by [`FakeClient::failing`].
pub mod op {
    pub const REPLY: &str = "reply";
    pub const GROUP_PROFILE: &str = "group_profile";
    pub const ROOM_PROFILE: &str = "room_profile";
    pub const GROUP_SUMMARY: &str = "group_summary";
    pub const GROUP_COUNT: &str = "group_count";
    pub const ROOM_COUNT: &str = "room_count";
    pub const LEAVE_GROUP: &str = "leave_group";
    pub const LEAVE_ROOM: &str = "leave_room";
}

pub struct FakeClient {
    calls: Mutex<Vec<Call>>,
    failing: HashSet<&'static str>,
    failing_tokens: HashSet<String>,
    pub profile: UserProfile,
    pub summary: GroupSummary,
    pub group_count: u64,
    pub room_count: u64,
}

impl Default for FakeClient {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failing: HashSet::new(),
            failing_tokens: HashSet::new(),
            profile: UserProfile {
                display_name: "Ann".to_string(),
                user_id: "U1".to_string(),
                language: "en".to_string(),
                status_message: "busy".to_string(),
                picture_url: "https://example.com/ann.png".to_string(),
            },
            summary: GroupSummary {
                group_id: "G1".to_string(),
                group_name: "Team".to_string(),
                picture_url: "https://example.com/team.png".to_string(),
            },
            group_count: 5,
            room_count: 3,
        }
    }
}

impl FakeClient {
    /// A client whose listed operations always fail.
    pub fn failing(ops: &[&'static str]) -> Self {
        Self {
            failing: ops.iter().copied().collect(),
            ..Self::default()
        }
    }

    /// A client that fails replies for the given reply tokens only.
    pub fn failing_replies(tokens: &[&str]) -> Self {
        Self {
            failing_tokens: tokens.iter().map(|t| t.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Reply attempts in the order they were made, failed ones included.
    pub fn replies(&self) -> Vec<(String, Vec<OutgoingMessage>)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Reply { token, messages } => Some((token, messages)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call, op: &str) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        if self.failing.contains(op) {
            anyhow::bail!("{} failed", op);
        }
        Ok(())
    }
}

#[async_trait]
impl PlatformClient for FakeClient {
    async fn reply_message(&self, reply_token: &str, messages: &[OutgoingMessage]) -> Result<()> {
        self.record(
            Call::Reply {
                token: reply_token.to_string(),
                messages: messages.to_vec(),
            },
            op::REPLY,
        )?;
        if self.failing_tokens.contains(reply_token) {
            anyhow::bail!("reply token {} rejected", reply_token);
        }
        Ok(())
    }

    async fn group_member_profile(&self, group_id: &str, user_id: &str) -> Result<UserProfile> {
        self.record(
            Call::GroupMemberProfile {
                group_id: group_id.to_string(),
                user_id: user_id.to_string(),
            },
            op::GROUP_PROFILE,
        )?;
        Ok(self.profile.clone())
    }

    async fn room_member_profile(&self, room_id: &str, user_id: &str) -> Result<UserProfile> {
        self.record(
            Call::RoomMemberProfile {
                room_id: room_id.to_string(),
                user_id: user_id.to_string(),
            },
            op::ROOM_PROFILE,
        )?;
        Ok(self.profile.clone())
    }

    async fn group_summary(&self, group_id: &str) -> Result<GroupSummary> {
        self.record(Call::GroupSummary(group_id.to_string()), op::GROUP_SUMMARY)?;
        Ok(self.summary.clone())
    }

    async fn group_member_count(&self, group_id: &str) -> Result<MemberCount> {
        self.record(Call::GroupMemberCount(group_id.to_string()), op::GROUP_COUNT)?;
        Ok(MemberCount {
            count: self.group_count,
        })
    }

    async fn room_member_count(&self, room_id: &str) -> Result<MemberCount> {
        self.record(Call::RoomMemberCount(room_id.to_string()), op::ROOM_COUNT)?;
        Ok(MemberCount {
            count: self.room_count,
        })
    }

    async fn leave_group(&self, group_id: &str) -> Result<()> {
        self.record(Call::LeaveGroup(group_id.to_string()), op::LEAVE_GROUP)
    }

    async fn leave_room(&self, room_id: &str) -> Result<()> {
        self.record(Call::LeaveRoom(room_id.to_string()), op::LEAVE_ROOM)
    }
}
