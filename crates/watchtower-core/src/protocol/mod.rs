//! Wire types served by the gateway.
//!
//! - `catalog`: read-only records returned by the REST endpoints.
//! - `event`: ephemeral events pushed over the alert stream.
//!
//! Every timestamp is floating point seconds since the Unix epoch, matching
//! what dashboards already consume.

pub mod catalog;
pub mod event;

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time as seconds since the Unix epoch.
///
/// A clock set before 1970 reports `0.0` rather than failing.
pub fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}
