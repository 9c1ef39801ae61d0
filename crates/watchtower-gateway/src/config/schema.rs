use std::net::SocketAddr;
use std::time::Duration;

use axum::http::HeaderValue;
use serde::Deserialize;
use watchtower_core::error::{Result, WatchtowerError};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchtowerConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub realtime: RealtimeSection,

    #[serde(default)]
    pub log: LogSection,
}

impl Default for WatchtowerConfig {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerSection::default(),
            realtime: RealtimeSection::default(),
            log: LogSection::default(),
        }
    }
}

impl WatchtowerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(WatchtowerError::UnsupportedVersion);
        }
        self.server.validate()?;
        self.realtime.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Browser origins allowed to call the API with credentials.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            cors_origins: default_cors_origins(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;
        self.cors_header_values()?;
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|_| {
            WatchtowerError::BadRequest(format!(
                "server.listen must be a valid socket address, got {:?}",
                self.listen
            ))
        })
    }

    /// Origins as header values. `*` is refused: credentials forbid wildcards.
    pub fn cors_header_values(&self) -> Result<Vec<HeaderValue>> {
        self.cors_origins
            .iter()
            .map(|o| {
                if o == "*" {
                    return Err(WatchtowerError::BadRequest(
                        "server.cors_origins cannot contain \"*\" (credentials are allowed)".into(),
                    ));
                }
                HeaderValue::from_str(o).map_err(|_| {
                    WatchtowerError::BadRequest(format!("server.cors_origins: invalid origin {o:?}"))
                })
            })
            .collect()
    }
}

fn default_listen() -> String {
    "0.0.0.0:8000".into()
}
fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:5173".into()]
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RealtimeSection {
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,

    /// Upper bound on one delivery (queue push or socket write).
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,

    /// Per-connection outbound queue depth.
    #[serde(default = "default_outbound_queue")]
    pub outbound_queue: usize,

    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

impl Default for RealtimeSection {
    fn default() -> Self {
        Self {
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            send_timeout_ms: default_send_timeout_ms(),
            outbound_queue: default_outbound_queue(),
            max_connections: default_max_connections(),
        }
    }
}

impl RealtimeSection {
    pub fn validate(&self) -> Result<()> {
        if !(100..=600_000).contains(&self.heartbeat_interval_ms) {
            return Err(WatchtowerError::BadRequest(
                "realtime.heartbeat_interval_ms must be between 100 and 600000".into(),
            ));
        }
        if !(1..=60_000).contains(&self.send_timeout_ms) {
            return Err(WatchtowerError::BadRequest(
                "realtime.send_timeout_ms must be between 1 and 60000".into(),
            ));
        }
        if !(1..=65_536).contains(&self.outbound_queue) {
            return Err(WatchtowerError::BadRequest(
                "realtime.outbound_queue must be between 1 and 65536".into(),
            ));
        }
        if !(1..=1_000_000).contains(&self.max_connections) {
            return Err(WatchtowerError::BadRequest(
                "realtime.max_connections must be between 1 and 1000000".into(),
            ));
        }
        Ok(())
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }
}

fn default_heartbeat_interval_ms() -> u64 {
    5000
}
fn default_send_timeout_ms() -> u64 {
    2000
}
fn default_outbound_queue() -> usize {
    64
}
fn default_max_connections() -> usize {
    1024
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogSection {
    #[serde(default = "default_log_filter")]
    pub filter: String,

    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_filter() -> String {
    "watchtower_gateway=info,tower_http=info".into()
}
