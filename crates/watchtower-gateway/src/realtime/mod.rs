//! Realtime runtime (egress engine) for the alert stream.
//!
//! `ConnectionRegistry` tracks open streams; `PreparedMsg` carries an event
//! serialized once for fan-out.

pub mod core;
pub mod types;

pub use self::core::{BroadcastReport, ConnectionId, ConnectionRegistry};
pub use types::PreparedMsg;
