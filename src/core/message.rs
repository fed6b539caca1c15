//! Chat transcript model
//!
//! Entries come from three producers merged into one append-only log in
//! arrival order: inbound chat messages, server system notifications,
//! and the local optimistic echo of an outbound send.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reserved author name for server-originated notifications.
pub const SYSTEM_USERNAME: &str = "System";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub username: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_system: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<Uuid>,
}

fn is_false(value: &bool) -> bool {
    !value
}

impl ChatMessage {
    /// Wrap a system notification as a transcript entry stamped now.
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            username: SYSTEM_USERNAME.to_string(),
            text: text.into(),
            timestamp: Utc::now(),
            is_system: true,
            client_id: None,
        }
    }

    /// Locally-synthesized echo of an outbound send, displayed before any
    /// server confirmation arrives.
    pub fn local_echo(
        username: impl Into<String>,
        text: impl Into<String>,
        client_id: Uuid,
    ) -> Self {
        Self {
            username: username.into(),
            text: text.into(),
            timestamp: Utc::now(),
            is_system: false,
            client_id: Some(client_id),
        }
    }

    /// Whether this entry was authored by `username`. Derived per render,
    /// never stored: two people sharing a username are indistinguishable
    /// here, a documented limitation of the protocol.
    pub fn is_from(&self, username: &str) -> bool {
        !self.is_system && self.username == username
    }

    /// Clock-time display form of the timestamp.
    pub fn time_label(&self) -> String {
        self.timestamp
            .with_timezone(&Local)
            .format("%H:%M")
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_entries_carry_the_reserved_author() {
        let message = ChatMessage::system("bob joined");
        assert_eq!(message.username, SYSTEM_USERNAME);
        assert_eq!(message.text, "bob joined");
        assert!(message.is_system);
        assert!(message.client_id.is_none());
    }

    #[test]
    fn system_entries_are_not_attributable() {
        let message = ChatMessage::system("maintenance at noon");
        assert!(!message.is_from(SYSTEM_USERNAME));
    }

    #[test]
    fn authorship_derives_from_username_equality() {
        let message = ChatMessage::local_echo("al", "hi", Uuid::new_v4());
        assert!(message.is_from("al"));
        assert!(!message.is_from("bob"));
    }

    #[test]
    fn wire_form_omits_unset_optionals() {
        let message = ChatMessage::local_echo("al", "hi", Uuid::new_v4());
        let plain = ChatMessage {
            client_id: None,
            ..message
        };
        let json = serde_json::to_value(&plain).expect("serialize");
        let object = json.as_object().expect("object");
        assert!(object.contains_key("username"));
        assert!(object.contains_key("timestamp"));
        assert!(!object.contains_key("isSystem"));
        assert!(!object.contains_key("clientId"));
    }

    #[test]
    fn inbound_payload_without_flags_decodes() {
        let frame = r#"{"username":"bob","text":"hey","timestamp":"2026-08-08T12:00:00Z"}"#;
        let message: ChatMessage = serde_json::from_str(frame).expect("decode");
        assert_eq!(message.username, "bob");
        assert!(!message.is_system);
        assert!(message.client_id.is_none());
    }
}
