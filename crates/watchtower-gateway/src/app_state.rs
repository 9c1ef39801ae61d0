//! Shared application state for the watchtower gateway.
//!
//! Both registries are constructed here and handed to handlers by reference;
//! nothing in the gateway is a process global, so every test can build a
//! fresh `AppState`.

use std::sync::Arc;

use tokio::sync::Semaphore;

use watchtower_core::error::Result;

use crate::config::WatchtowerConfig;
use crate::obs::{self, MetricsRegistry};
use crate::realtime::ConnectionRegistry;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    metrics: Arc<MetricsRegistry>,
    connections: Arc<ConnectionRegistry>,
    stream_slots: Arc<Semaphore>,
}

struct AppStateInner {
    cfg: WatchtowerConfig,
}

impl AppState {
    /// Build application state.
    /// Returns Result so main can report a bad config instead of panicking.
    pub fn new(cfg: WatchtowerConfig) -> Result<Self> {
        cfg.validate()?;

        let metrics = Arc::new(obs::gateway_registry());
        let connections = Arc::new(ConnectionRegistry::new(
            cfg.realtime.send_timeout(),
            Arc::clone(&metrics),
        ));

        let stream_slots = Arc::new(Semaphore::new(cfg.realtime.max_connections));

        Ok(Self {
            inner: Arc::new(AppStateInner { cfg }),
            metrics,
            connections,
            stream_slots,
        })
    }

    pub fn cfg(&self) -> &WatchtowerConfig {
        &self.inner.cfg
    }

    pub fn metrics(&self) -> Arc<MetricsRegistry> {
        Arc::clone(&self.metrics)
    }

    pub fn connections(&self) -> Arc<ConnectionRegistry> {
        Arc::clone(&self.connections)
    }

    /// One permit per open alert stream, `realtime.max_connections` in total.
    pub fn stream_slots(&self) -> Arc<Semaphore> {
        Arc::clone(&self.stream_slots)
    }
}
