//! Realtime core: the registry of open alert streams and its fan-out.

mod connection_registry;

pub use connection_registry::{BroadcastReport, ConnectionId, ConnectionRegistry};
