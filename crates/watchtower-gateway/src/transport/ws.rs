//! Alert stream WebSocket handler.
//!
//! Responsibilities:
//! - Upgrade HTTP -> WS (malformed upgrades are rejected by the extractor)
//! - Reserve a stream slot before upgrading; refuse with 503 when none is left
//! - Register the session, then push heartbeats and broadcast events
//! - Unregister exactly once when the session ends
//!
//! Lifecycle: `Connecting` (upgrade) -> `Active` (registered) -> `Closed`.
//! The active loop waits on three sources: the outbound queue fed by
//! broadcasts, the inbound socket, and the heartbeat timer. Any delivered
//! broadcast resets the timer, so heartbeats only fill quiet periods.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::{IntoResponse, Response},
};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, OwnedSemaphorePermit};
use tokio::time::{interval_at, timeout, Duration, Instant, MissedTickBehavior};
use tracing::Instrument;

use watchtower_core::error::WatchtowerError;
use watchtower_core::protocol::event::{HeartbeatEvent, StreamEvent};

use crate::api::ApiError;
use crate::app_state::AppState;
use crate::realtime::PreparedMsg;

/// Why an active session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CloseReason {
    /// Peer sent a close frame.
    PeerClosed,
    /// Socket read/write error or end of stream.
    PeerGone,
    /// A socket write did not finish within the send timeout.
    WriteStalled,
    /// Registry dropped the connection (failed broadcast).
    Evicted,
}

// --------------------
// Entry
// --------------------
pub async fn ws_alerts(State(app): State<AppState>, ws: WebSocketUpgrade) -> Response {
    // Reserved before the upgrade; a failed upgrade drops the closure and the permit.
    let Ok(slot) = app.stream_slots().try_acquire_owned() else {
        tracing::warn!(
            cap = app.cfg().realtime.max_connections,
            "alert stream rejected: connection limit reached"
        );
        return ApiError(WatchtowerError::Unavailable("connection limit reached".into()))
            .into_response();
    };

    ws.on_upgrade(move |socket| run_session(app, socket, slot))
}

// --------------------
// Core session loop
// --------------------
async fn run_session(app: AppState, socket: WebSocket, slot: OwnedSemaphorePermit) {
    let rt = app.cfg().realtime.clone();
    let connections = app.connections();

    let (out_tx, out_rx) = mpsc::channel::<Message>(rt.outbound_queue);
    let id = connections.register(out_tx);

    let span = tracing::info_span!("alert_stream", conn = %id);
    async move {
        tracing::info!(open = connections.len(), "stream opened");

        let reason = drive(socket, out_rx, rt.heartbeat_interval(), rt.send_timeout()).await;

        // Eviction already removed the entry; unregister is a no-op then.
        connections.unregister(id);
        drop(slot);
        tracing::info!(?reason, open = connections.len(), "stream closed");
    }
    .instrument(span)
    .await
}

async fn drive(
    socket: WebSocket,
    mut out_rx: mpsc::Receiver<Message>,
    heartbeat_every: Duration,
    send_timeout: Duration,
) -> CloseReason {
    let (mut ws_tx, mut ws_rx) = socket.split();

    let mut heartbeat = interval_at(Instant::now() + heartbeat_every, heartbeat_every);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let reason = loop {
        tokio::select! {
            // broadcasts queued by the registry
            maybe_out = out_rx.recv() => {
                let Some(msg) = maybe_out else { break CloseReason::Evicted; };
                if let Err(reason) = write(&mut ws_tx, msg, send_timeout).await {
                    break reason;
                }
                heartbeat.reset();
            }

            // inbound reader: only used to notice the peer leaving
            incoming = ws_rx.next() => {
                match incoming {
                    None | Some(Err(_)) => break CloseReason::PeerGone,
                    Some(Ok(Message::Close(_))) => break CloseReason::PeerClosed,
                    Some(Ok(_)) => {}
                }
            }

            _ = heartbeat.tick() => {
                let event = StreamEvent::from(HeartbeatEvent::now());
                match PreparedMsg::prepare(&event) {
                    Ok(prepared) => {
                        if let Err(reason) = write(&mut ws_tx, prepared.to_ws_message(), send_timeout).await {
                            break reason;
                        }
                    }
                    Err(e) => tracing::error!(error = %e, "heartbeat encode failed"),
                }
            }
        }
    };

    if reason != CloseReason::PeerGone {
        let _ = timeout(send_timeout, ws_tx.close()).await;
    }
    reason
}

async fn write(
    ws_tx: &mut SplitSink<WebSocket, Message>,
    msg: Message,
    send_timeout: Duration,
) -> Result<(), CloseReason> {
    match timeout(send_timeout, ws_tx.send(msg)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(_)) => Err(CloseReason::PeerGone),
        Err(_) => Err(CloseReason::WriteStalled),
    }
}
