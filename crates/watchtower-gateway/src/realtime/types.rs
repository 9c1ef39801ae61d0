use axum::extract::ws::Message;

use watchtower_core::error::Result;
use watchtower_core::protocol::event::StreamEvent;

/// Event serialized once, ready to be sent N times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedMsg {
    text: String,
}

impl PreparedMsg {
    pub fn prepare(event: &StreamEvent) -> Result<Self> {
        Ok(Self { text: event.to_json()? })
    }

    /// Convert to an axum WebSocket text frame.
    /// NOTE: axum's `Message::Text` owns a `String`, so each recipient gets a clone.
    pub fn to_ws_message(&self) -> Message {
        Message::Text(self.text.clone())
    }
}
