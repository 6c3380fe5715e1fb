use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Notify};
use tokio::time::{interval, timeout};

use crate::config::HeartbeatConfig;
use crate::relay::events::ServerEvent;
use crate::state::AppState;
use crate::ws::protocol;

/// Run the actor-per-connection pattern for a WebSocket.
///
/// Splits the WebSocket into reader and writer halves:
/// - Writer task: owns the sink, forwards relay events and control frames
/// - Ping task: sends periodic pings and flags the connection stale on pong timeout
/// - Reader loop: decodes incoming frames and dispatches them to the relay
///
/// When the reader loop ends for any reason the relay's disconnect handler runs.
pub async fn run_connection(socket: WebSocket, state: AppState) {
    let (ws_sender, mut ws_receiver) = socket.split();
    let (event_tx, event_rx) = mpsc::unbounded_channel::<ServerEvent>();
    let (frame_tx, frame_rx) = mpsc::unbounded_channel::<Message>();

    let relay = state.relay.clone();
    let connection_id = relay.connect(event_tx);

    let writer_handle = tokio::spawn(writer_task(ws_sender, event_rx, frame_rx));

    // Track pong reception
    let (pong_tx, pong_rx) = mpsc::unbounded_channel::<()>();
    let stale = Arc::new(Notify::new());
    let ping_handle = (state.heartbeat.interval_secs > 0).then(|| {
        tokio::spawn(ping_task(
            state.heartbeat,
            frame_tx.clone(),
            pong_rx,
            stale.clone(),
        ))
    });

    // Reader loop: process incoming WebSocket messages
    loop {
        let next = tokio::select! {
            next = ws_receiver.next() => next,
            _ = stale.notified() => {
                tracing::warn!(connection_id = %connection_id, "Pong timeout, closing connection");
                break;
            }
        };

        match next {
            Some(Ok(msg)) => match msg {
                Message::Text(text) => {
                    protocol::handle_text_message(text.as_str(), &relay, &connection_id).await;
                }
                Message::Binary(data) => {
                    protocol::handle_binary_message(&data, &relay, &connection_id).await;
                }
                Message::Pong(_) => {
                    let _ = pong_tx.send(());
                }
                Message::Ping(data) => {
                    let _ = frame_tx.send(Message::Pong(data));
                }
                Message::Close(frame) => {
                    tracing::debug!(
                        connection_id = %connection_id,
                        reason = ?frame,
                        "Client initiated close"
                    );
                    break;
                }
            },
            Some(Err(e)) => {
                tracing::warn!(
                    connection_id = %connection_id,
                    error = %e,
                    "WebSocket receive error"
                );
                break;
            }
            None => {
                tracing::debug!(connection_id = %connection_id, "WebSocket stream ended");
                break;
            }
        }
    }

    if let Some(handle) = ping_handle {
        handle.abort();
    }
    writer_handle.abort();

    relay.disconnect(&connection_id).await;
}

/// Writer task: drains control frames and relay events into the WebSocket sink.
async fn writer_task(
    mut ws_sender: SplitSink<WebSocket, Message>,
    mut events: mpsc::UnboundedReceiver<ServerEvent>,
    mut frames: mpsc::UnboundedReceiver<Message>,
) {
    loop {
        let msg = tokio::select! {
            Some(frame) = frames.recv() => frame,
            Some(event) = events.recv() => match event.encode() {
                Ok(text) => Message::Text(text.into()),
                Err(e) => {
                    tracing::warn!(event = event.name(), error = %e, "Failed to encode event");
                    continue;
                }
            },
            else => break,
        };

        let closing = matches!(msg, Message::Close(_));
        if ws_sender.send(msg).await.is_err() {
            // WebSocket send failed, connection is broken
            break;
        }
        if closing {
            break;
        }
    }
}

/// Ping task: sends a ping every interval and expects a pong within the timeout.
async fn ping_task(
    heartbeat: HeartbeatConfig,
    frame_tx: mpsc::UnboundedSender<Message>,
    mut pong_rx: mpsc::UnboundedReceiver<()>,
    stale: Arc<Notify>,
) {
    let mut ping_timer = interval(Duration::from_secs(heartbeat.interval_secs));
    let pong_timeout = Duration::from_secs(heartbeat.pong_timeout_secs);
    // Skip the first immediate tick
    ping_timer.tick().await;

    loop {
        ping_timer.tick().await;

        if frame_tx.send(Message::Ping(vec![1, 2, 3, 4].into())).is_err() {
            // Writer task has died, connection is gone
            break;
        }

        match timeout(pong_timeout, pong_rx.recv()).await {
            Ok(Some(())) => {}
            _ => {
                let _ = frame_tx.send(Message::Close(Some(CloseFrame {
                    code: 1001,
                    reason: "Pong timeout".into(),
                })));
                stale.notify_one();
                break;
            }
        }
    }
}
