//! Structured logging setup (`tracing-subscriber`).

use tracing_subscriber::{fmt, EnvFilter};

use watchtower_core::error::{Result, WatchtowerError};

use crate::config::schema::{LogFormat, LogSection};

/// Install the global subscriber. `RUST_LOG`, when set, overrides the
/// configured filter.
pub fn init(cfg: &LogSection) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => EnvFilter::try_new(&cfg.filter)
            .map_err(|e| WatchtowerError::BadRequest(format!("log.filter invalid: {e}")))?,
    };

    let builder = fmt().with_env_filter(filter);
    let installed = match cfg.format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| WatchtowerError::Internal(format!("logging init failed: {e}")))
}
