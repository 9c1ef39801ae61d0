//! Events pushed to streaming clients.
//!
//! Events are tagged by a `type` field on the wire:
//!
//! ```json
//! {"type":"incident","service":"db","severity":"critical","message":"...","timestamp":1.0}
//! {"type":"heartbeat","timestamp":1.0}
//! ```
//!
//! They are never stored; the gateway serializes each one once and fans the
//! text out to every open stream.

use serde::{Deserialize, Serialize};

use crate::error::{Result, WatchtowerError};
use crate::protocol::catalog::Severity;
use crate::protocol::unix_now;

/// Anything that can travel on the alert stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    Incident(IncidentEvent),
    Heartbeat(HeartbeatEvent),
}

impl StreamEvent {
    /// Encode to the JSON text sent in a WebSocket text frame.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| WatchtowerError::Internal(format!("event encode failed: {e}")))
    }
}

/// A simulated service incident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IncidentEvent {
    pub service: String,
    pub severity: Severity,
    pub message: String,
    pub timestamp: f64,
}

impl IncidentEvent {
    /// Critical incident for `service`, stamped now.
    pub fn critical(service: impl Into<String>) -> Self {
        let service = service.into();
        Self {
            message: format!("{service} is experiencing issues"),
            service,
            severity: Severity::Critical,
            timestamp: unix_now(),
        }
    }
}

impl From<IncidentEvent> for StreamEvent {
    fn from(ev: IncidentEvent) -> Self {
        StreamEvent::Incident(ev)
    }
}

/// Keep-alive sent on an otherwise quiet stream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeartbeatEvent {
    pub timestamp: f64,
}

impl HeartbeatEvent {
    pub fn now() -> Self {
        Self { timestamp: unix_now() }
    }
}

impl From<HeartbeatEvent> for StreamEvent {
    fn from(ev: HeartbeatEvent) -> Self {
        StreamEvent::Heartbeat(ev)
    }
}
