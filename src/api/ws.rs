//! WebSocket handler for the client-facing event stream.
//!
//! On connect the subscriber registers with the broadcast hub and receives
//! every pipeline event as a JSON text frame until disconnect. No handshake
//! is required; an initial text message (the legacy filter message some
//! clients still send) is read and ignored.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::debug;

use super::ServerState;

/// GET /ws — upgrade and stream events until disconnect.
pub async fn ws_handler(State(state): State<ServerState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: ServerState) {
    let (mut sender, mut receiver) = socket.split();
    let (id, mut events) = state.hub.register();

    // Forward hub events to the client; a failed send means the connection
    // is gone and the subscriber gets unregistered below.
    let forward = tokio::spawn(async move {
        while let Some(payload) = events.recv().await {
            if sender
                .send(Message::Text(payload.to_string()))
                .await
                .is_err()
            {
                break;
            }
        }
    });

    // Drain the client side: legacy filter messages are ignored, pings are
    // answered by the protocol layer, close ends the session.
    while let Some(Ok(message)) = receiver.next().await {
        match message {
            Message::Text(text) => {
                debug!(subscriber = id, len = text.len(), "Ignoring client message");
            }
            Message::Close(_) => break,
            Message::Binary(_) | Message::Ping(_) | Message::Pong(_) => {}
        }
    }

    state.hub.unregister(id);
    forward.abort();
    debug!(subscriber = id, "WebSocket session ended");
}
