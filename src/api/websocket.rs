use axum::{
    extract::State,
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    response::Response,
};
use futures::{sink::SinkExt, stream::StreamExt};
use serde::Serialize;
use std::sync::Arc;

use crate::api::ApiState;
use crate::snapshot::Snapshot;

/// The one event type pushed over the channel.
pub const CRYPTO_UPDATE: &str = "crypto-update";

/// Wire frame pushed to clients: `{"event":"crypto-update","data":{...}}`.
#[derive(Serialize)]
struct PushFrame<'a> {
    event: &'static str,
    data: &'a Snapshot,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ApiState>>,
) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<ApiState>) {
    let (mut sender, mut receiver) = socket.split();
    let (id, mut snapshots) = state.hub.connect();

    // Forward hub deliveries to the client, one text frame per snapshot
    let mut send_task = tokio::spawn(async move {
        while let Some(snapshot) = snapshots.recv().await {
            let frame = PushFrame {
                event: CRYPTO_UPDATE,
                data: &snapshot,
            };
            let msg = match serde_json::to_string(&frame) {
                Ok(msg) => msg,
                Err(err) => {
                    tracing::error!(error = %err, "snapshot serialization failed");
                    continue;
                }
            };
            if sender.send(Message::Text(msg)).await.is_err() {
                break;
            }
        }
    });

    // Drain the client side; clients send nothing we act on except Close
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    }

    state.hub.disconnect(id);
}
