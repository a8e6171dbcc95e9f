//! Canned replies sent by the dispatcher.

use crate::platform::{GroupSummary, MemberCount, OutgoingMessage, UserProfile};

/// Keyword that makes the bot leave a group or room, matched ignoring case.
pub const FAREWELL_KEYWORD: &str = "bye";

pub fn is_farewell(text: &str) -> bool {
    text.eq_ignore_ascii_case(FAREWELL_KEYWORD)
}

pub fn farewell_reply() -> Vec<OutgoingMessage> {
    vec![OutgoingMessage::text("Bye bye!")]
}

/// Reply to a direct one-to-one text message, echoing it verbatim.
pub fn echo_reply(text: &str) -> Vec<OutgoingMessage> {
    vec![OutgoingMessage::text(format!("Hello there :{} OK!", text))]
}

/// Describe a group or room member back to them, with their picture.
pub fn profile_reply(profile: &UserProfile) -> Vec<OutgoingMessage> {
    let text = format!(
        "Hello user {}, your ID is {}, your language is {}, and your status is: {}",
        profile.display_name, profile.user_id, profile.language, profile.status_message
    );
    vec![
        OutgoingMessage::text(text),
        OutgoingMessage::image(profile.picture_url.as_str()),
    ]
}

pub fn group_join_reply(summary: &GroupSummary, members: MemberCount) -> Vec<OutgoingMessage> {
    let text = format!(
        "Thanks for letting me join this group, the name of this group is: {}, there are: {} people in total\n",
        summary.group_name, members.count
    );
    vec![
        OutgoingMessage::text(text),
        OutgoingMessage::image(summary.picture_url.as_str()),
    ]
}

pub fn room_join_reply(members: MemberCount) -> Vec<OutgoingMessage> {
    vec![OutgoingMessage::text(format!(
        "Thanks for letting me join this chat room, the name of this chat room has: {} people\n",
        members.count
    ))]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_farewell_matches_any_case() {
        for text in ["bye", "BYE", "Bye", "bYe"] {
            assert!(is_farewell(text), "{text} should match");
        }
        for text in ["bye!", " bye", "goodbye", ""] {
            assert!(!is_farewell(text), "{text} should not match");
        }
    }

    #[test]
    fn test_echo_reply() {
        assert_eq!(
            echo_reply("ping"),
            vec![OutgoingMessage::text("Hello there :ping OK!")]
        );
    }

    #[test]
    fn test_profile_reply() {
        let profile = UserProfile {
            display_name: "Ann".to_string(),
            user_id: "U1".to_string(),
            language: "en".to_string(),
            status_message: "busy".to_string(),
            picture_url: "https://pic".to_string(),
        };

        assert_eq!(
            profile_reply(&profile),
            vec![
                OutgoingMessage::text(
                    "Hello user Ann, your ID is U1, your language is en, and your status is: busy"
                ),
                OutgoingMessage::Image {
                    original_content_url: "https://pic".to_string(),
                    preview_image_url: "https://pic".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_profile_reply_passes_empty_url_through() {
        let reply = profile_reply(&UserProfile::default());
        assert_eq!(reply[1], OutgoingMessage::image(""));
    }

    #[test]
    fn test_group_join_reply() {
        let summary = GroupSummary {
            group_id: "G1".to_string(),
            group_name: "Team".to_string(),
            picture_url: "https://g".to_string(),
        };
        assert_eq!(
            group_join_reply(&summary, MemberCount { count: 5 }),
            vec![
                OutgoingMessage::text(
                    "Thanks for letting me join this group, the name of this group is: Team, there are: 5 people in total\n"
                ),
                OutgoingMessage::image("https://g"),
            ]
        );
    }

    #[test]
    fn test_room_join_reply_is_text_only() {
        assert_eq!(
            room_join_reply(MemberCount { count: 3 }),
            vec![OutgoingMessage::text(
                "Thanks for letting me join this chat room, the name of this chat room has: 3 people\n"
            )]
        );
    }
}
