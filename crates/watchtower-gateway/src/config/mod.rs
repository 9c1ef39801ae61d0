//! Gateway config loader (strict parsing).

pub mod schema;

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use watchtower_core::error::{Result, WatchtowerError};

pub use schema::{LogFormat, LogSection, RealtimeSection, ServerSection, WatchtowerConfig};

pub fn load_from_file(path: impl AsRef<Path>) -> Result<WatchtowerConfig> {
    let path = path.as_ref();
    let s = fs::read_to_string(path).map_err(|e| {
        WatchtowerError::Internal(format!("read config {} failed: {e}", path.display()))
    })?;
    load_from_str(&s)
}

/// Like [`load_from_file`], but a missing file yields the defaults.
/// Returns whether the file was found alongside the config.
pub fn load_or_default(path: impl AsRef<Path>) -> Result<(WatchtowerConfig, bool)> {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(s) => Ok((load_from_str(&s)?, true)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok((WatchtowerConfig::default(), false)),
        Err(e) => Err(WatchtowerError::Internal(format!(
            "read config {} failed: {e}",
            path.display()
        ))),
    }
}

pub fn load_from_str(s: &str) -> Result<WatchtowerConfig> {
    let cfg: WatchtowerConfig = serde_yaml::from_str(s)
        .map_err(|e| WatchtowerError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
