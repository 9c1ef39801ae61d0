//! Watchtower gateway library entry.
//!
//! Wires the monitoring endpoints, the alert stream transport, the realtime
//! connection registry, and the metrics registry into one axum application.
//! Consumed by the binary (`main.rs`) and by integration tests.

pub mod api;
pub mod app_state;
pub mod config;
pub mod obs;
pub mod realtime;
pub mod router;
pub mod transport;
