use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::ws::Message;
use dashmap::DashMap;
use futures_util::stream::FuturesUnordered;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};

use watchtower_core::protocol::event::StreamEvent;

use crate::obs::{MetricsRegistry, REALTIME_BROADCAST_FAILURES, REALTIME_CONNECTIONS};
use crate::realtime::types::PreparedMsg;

/// Handle returned by [`ConnectionRegistry::register`]. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Outcome of one broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Connections in the snapshot taken at the start of the broadcast.
    pub attempted: usize,
    pub delivered: usize,
    /// Receiver gone (session already ended).
    pub closed: usize,
    /// Queue stayed full for the whole send timeout.
    pub timed_out: usize,
}

impl BroadcastReport {
    pub fn failed(&self) -> usize {
        self.closed + self.timed_out
    }
}

enum Delivery {
    Delivered,
    Closed,
    TimedOut,
}

/// Live alert-stream connections.
///
/// Each entry is the sending half of a session's outbound queue; the session
/// task owns the socket and drains the queue. Removing an entry drops the
/// registry's sender, which ends the session once no broadcast still holds a
/// clone.
pub struct ConnectionRegistry {
    conns: DashMap<ConnectionId, mpsc::Sender<Message>>,
    seq: AtomicU64,
    send_timeout: Duration,
    metrics: Arc<MetricsRegistry>,
}

impl ConnectionRegistry {
    pub fn new(send_timeout: Duration, metrics: Arc<MetricsRegistry>) -> Self {
        Self {
            conns: DashMap::new(),
            seq: AtomicU64::new(1),
            send_timeout,
            metrics,
        }
    }

    pub fn register(&self, tx: mpsc::Sender<Message>) -> ConnectionId {
        let id = ConnectionId(self.seq.fetch_add(1, Ordering::Relaxed));
        self.conns.insert(id, tx);
        self.metrics.increment_gauge(REALTIME_CONNECTIONS, &[]);
        id
    }

    /// Remove `id`. Returns false (and does nothing) if it was already gone,
    /// so a disconnect racing a failed send only counts once.
    pub fn unregister(&self, id: ConnectionId) -> bool {
        let removed = self.conns.remove(&id).is_some();
        if removed {
            self.metrics.decrement_gauge(REALTIME_CONNECTIONS, &[]);
        }
        removed
    }

    /// Drop every connection. Each session sees its queue close and ends
    /// with a close frame. Returns how many were removed.
    pub fn close_all(&self) -> usize {
        let ids: Vec<ConnectionId> = self.conns.iter().map(|r| *r.key()).collect();
        ids.into_iter().filter(|id| self.unregister(*id)).count()
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.conns.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.conns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conns.is_empty()
    }

    /// Serialize `event` once and fan it out to every connection.
    pub async fn broadcast(&self, event: &StreamEvent) -> BroadcastReport {
        match PreparedMsg::prepare(event) {
            Ok(prepared) => self.broadcast_prepared(&prepared).await,
            Err(e) => {
                tracing::error!(error = %e, "broadcast skipped: event encode failed");
                BroadcastReport::default()
            }
        }
    }

    /// Deliver an already-serialized message to every connection.
    ///
    /// Works on a snapshot of the senders, so no shard lock is held while
    /// awaiting. Sends run concurrently, each bounded by the send timeout; a
    /// connection that fails is unregistered and the rest are unaffected.
    /// Returning only after every send settles keeps per-connection order for
    /// consecutive broadcasts from one caller.
    pub async fn broadcast_prepared(&self, prepared: &PreparedMsg) -> BroadcastReport {
        let targets: Vec<(ConnectionId, mpsc::Sender<Message>)> = self
            .conns
            .iter()
            .map(|r| (*r.key(), r.value().clone()))
            .collect();

        let mut report = BroadcastReport {
            attempted: targets.len(),
            ..BroadcastReport::default()
        };

        let send_timeout = self.send_timeout;
        let mut futs = FuturesUnordered::new();
        for (id, tx) in targets {
            let msg = prepared.to_ws_message();
            futs.push(async move {
                let outcome = match timeout(send_timeout, tx.send(msg)).await {
                    Ok(Ok(())) => Delivery::Delivered,
                    Ok(Err(_)) => Delivery::Closed,
                    Err(_) => Delivery::TimedOut,
                };
                (id, outcome)
            });
        }

        while let Some((id, outcome)) = futs.next().await {
            let reason = match outcome {
                Delivery::Delivered => {
                    report.delivered += 1;
                    continue;
                }
                Delivery::Closed => {
                    report.closed += 1;
                    "closed"
                }
                Delivery::TimedOut => {
                    report.timed_out += 1;
                    "timeout"
                }
            };
            self.metrics
                .increment_counter(REALTIME_BROADCAST_FAILURES, &[("reason", reason)]);
            if self.unregister(id) {
                tracing::info!(conn = %id, %reason, "connection dropped after failed broadcast");
            }
        }

        if report.failed() > 0 {
            tracing::warn!(
                attempted = report.attempted,
                delivered = report.delivered,
                closed = report.closed,
                timed_out = report.timed_out,
                "broadcast finished with failures"
            );
        }
        report
    }
}
