//! Watchtower core: transport-agnostic wire types and the shared error type.
//!
//! This crate defines the JSON contracts served by the gateway (services,
//! alerts, streamed events) together with the error surface shared across
//! crates. It carries no transport or runtime dependencies so the same types
//! can back the server, tests, and client tooling.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths surface as `WatchtowerError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{Result, WatchtowerError};
