//! Websocket wire protocol
//!
//! One JSON envelope per text frame, tagged by event name.

use serde::{Deserialize, Serialize};

use crate::core::message::ChatMessage;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum WireEvent {
    /// Outbound chat text.
    SendMessage { text: String },
    /// A chat message fanned out by the server.
    ReceiveMessage(ChatMessage),
    /// Out-of-band server notification, not attributable to any user.
    SystemNotification { message: String },
}

impl WireEvent {
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn decode(frame: &str) -> serde_json::Result<Self> {
        serde_json::from_str(frame)
    }
}
