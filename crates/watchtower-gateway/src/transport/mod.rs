//! Transport layer (WebSocket).
//!
//! Exposes the `/ws/alerts` upgrade handler and the per-connection session
//! loop.

pub mod ws;
