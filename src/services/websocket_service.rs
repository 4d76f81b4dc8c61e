//! WebSocket connection lifecycle for hosts and players.

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dto::ws::ClientMessage,
    services::{live_service, ws_events},
    state::{ConnectionId, SharedState},
};

/// Handle the full lifecycle for one quiz WebSocket connection.
///
/// The connection stays anonymous until its first `host:join` or
/// `player:join` message binds it to a session; from then on every inbound
/// event is routed through the lifecycle engine, and the socket's
/// disappearance (for whatever reason) is reported as an unbind.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let conn: ConnectionId = Uuid::new_v4();
    debug!(conn = %conn, "socket connected");

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(inbound) => {
                    if let Err(err) = live_service::dispatch(&state, conn, &outbound_tx, inbound).await
                    {
                        debug!(conn = %conn, error = %err, "client event rejected");
                        ws_events::send_error(&outbound_tx, err.to_string());
                    }
                }
                Err(err) => {
                    warn!(conn = %conn, error = %err, "failed to parse client message");
                    ws_events::send_error(&outbound_tx, "malformed message".into());
                }
            },
            Ok(Message::Ping(payload)) => {
                let _ = outbound_tx.send(Message::Pong(payload));
            }
            Ok(Message::Close(frame)) => {
                info!(conn = %conn, "socket closed");
                let _ = outbound_tx.send(Message::Close(frame));
                break;
            }
            Ok(Message::Binary(_)) => {}
            Ok(Message::Pong(_)) => {}
            Err(err) => {
                warn!(conn = %conn, error = %err, "websocket error");
                break;
            }
        }
    }

    live_service::unbind(&state, conn).await;
    debug!(conn = %conn, "socket disconnected");

    finalize(writer_task, outbound_tx).await;
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}
