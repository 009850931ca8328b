//! WebSocket transport for classroom connections.
//!
//! Upgrades HTTP connections at `/ws` and pumps frames in both directions.
//! All protocol handling lives in [`Coordinator::handle_frame`]; this module
//! only moves text frames and keeps the connection alive.
//!
//! # Connection Lifecycle
//!
//! 1. The client upgrades and is assigned a [`ConnectionId`].
//! 2. Inbound text frames are passed to the coordinator together with the
//!    connection's outbound queue, so a `register` frame can wire the
//!    connection into the registry.
//! 3. Outbound frames queued by the coordinator are serialized and written
//!    to the socket.
//! 4. Heartbeat pings go out every 30 seconds; three unanswered pings close
//!    the connection.
//! 5. On any exit path the coordinator is told to drop the connection.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::api::AppState;
use crate::coordinator::Coordinator;
use crate::messages::OutboundMessage;
use crate::registry::ConnectionId;

/// Maximum number of missed pong responses before disconnecting.
const MAX_MISSED_PONGS: u8 = 3;

/// Interval between heartbeat pings.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// WebSocket upgrade handler.
///
/// Called when a client connects to `/ws`. Upgrades the HTTP connection
/// to a WebSocket and spawns a handler task.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    info!("New WebSocket connection request");
    let coordinator = Arc::clone(&state.coordinator);
    ws.on_upgrade(move |socket| handle_socket(socket, coordinator))
}

/// Handles a single WebSocket connection.
///
/// - Assigns a connection id and an outbound queue
/// - Feeds inbound text frames to the coordinator
/// - Writes queued outbound frames to the socket as JSON
/// - Sends heartbeat pings every 30 seconds
/// - Closes the connection after 3 missed pongs
async fn handle_socket(socket: WebSocket, coordinator: Arc<Coordinator>) {
    let id = ConnectionId::next();
    let (mut sender, mut receiver) = socket.split();

    // The registry holds a clone of `outbound` once the client registers;
    // until then only failed-registration feedback flows through it.
    let (outbound, mut queued) = mpsc::unbounded_channel::<OutboundMessage>();

    info!(conn_id = %id, "WebSocket client connected");

    let mut heartbeat_interval = interval(HEARTBEAT_INTERVAL);
    let mut missed_pongs = 0u8;

    loop {
        tokio::select! {
            // Handle incoming frames (protocol messages and pong responses)
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        coordinator.handle_frame(id, &text, &outbound).await;
                    }
                    Some(Ok(Message::Pong(_))) => {
                        missed_pongs = 0;
                        debug!(conn_id = %id, "Received pong from client");
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            debug!(conn_id = %id, "Failed to send pong, client disconnected");
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!(conn_id = %id, "Client requested close");
                        break;
                    }
                    Some(Ok(Message::Binary(_))) => {
                        // The protocol is text-only; ignore
                        debug!(conn_id = %id, "Ignoring binary message from client");
                    }
                    Some(Err(e)) => {
                        debug!(conn_id = %id, error = %e, "WebSocket error");
                        break;
                    }
                    None => {
                        debug!(conn_id = %id, "WebSocket stream ended");
                        break;
                    }
                }
            }

            // Drain frames the coordinator queued for this connection
            message = queued.recv() => {
                let Some(message) = message else { break };
                let json = match serde_json::to_string(&message) {
                    Ok(json) => json,
                    Err(e) => {
                        warn!(conn_id = %id, error = %e, "Failed to serialize outbound frame");
                        continue;
                    }
                };
                if sender.send(Message::Text(json)).await.is_err() {
                    debug!(conn_id = %id, "Failed to send frame, client disconnected");
                    break;
                }
            }

            // Send heartbeat ping
            _ = heartbeat_interval.tick() => {
                if sender.send(Message::Ping(vec![])).await.is_err() {
                    debug!(conn_id = %id, "Failed to send ping, client disconnected");
                    break;
                }
                missed_pongs += 1;
                if missed_pongs >= MAX_MISSED_PONGS {
                    info!(
                        conn_id = %id,
                        "Client missed {} pongs, closing connection", MAX_MISSED_PONGS
                    );
                    break;
                }
            }
        }
    }

    coordinator.handle_disconnect(id).await;
    info!(conn_id = %id, "WebSocket client disconnected");
}
