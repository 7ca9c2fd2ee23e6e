//! Payload builders for the two knock notifications.

use knock_types::{KnockId, KnockKind, PushMessage, Timestamp};

/// Silent wake-up asking a receiver's device to report its address for
/// `knock_id`.
pub fn attempt_message(knock_id: KnockId, group_name: &str) -> PushMessage {
    PushMessage {
        kind: KnockKind::KnockAttempt,
        knock_id: Some(knock_id),
        title: "Knock check".to_string(),
        body: format!("Checking who is home in {group_name}"),
        timestamp: Timestamp::now(),
    }
}

/// The user-visible knock, sent only after an address match.
pub fn confirmed_message() -> PushMessage {
    PushMessage {
        kind: KnockKind::ConfirmedKnock,
        knock_id: None,
        title: "\u{1F514} Knock Knock!".to_string(),
        body: "Someone is at the door!".to_string(),
        timestamp: Timestamp::now(),
    }
}
