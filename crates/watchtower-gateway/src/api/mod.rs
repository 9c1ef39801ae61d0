//! HTTP endpoints.
//!
//! - `ops`: `/`, `/health`, `/metrics`
//! - `monitor`: `/api/services`, `/api/alerts`, `/api/simulate-incident`
//! - `catalog`: the static records the monitor endpoints serve
//! - `error`: JSON error responses

pub mod catalog;
pub mod error;
pub mod monitor;
pub mod ops;

pub use error::ApiError;
