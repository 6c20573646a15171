//! Live feed. Each socket gets the current snapshot on connect and then every
//! `state_update` the table broadcasts. Inbound messages are ignored; actions
//! go through `POST /event`.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use hexboard_protocol::{Push, StateSnapshot};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::AppState;

pub async fn handle_ws(State(state): State<Arc<AppState>>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state))
}

async fn run_ws(mut socket: WebSocket, state: Arc<AppState>) {
    // Subscribe before reading the snapshot so nothing falls in between.
    let mut updates = state.subscribe();
    let current = state.snapshot().await;
    if send_state(&mut socket, &current).await.is_err() {
        return;
    }
    info!(rev = current.rev, "ws: client connected");

    loop {
        tokio::select! {
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        debug!(error = %e, "ws: receive failed");
                        break;
                    }
                    Some(Ok(_)) => {}
                }
            }
            update = updates.recv() => {
                match update {
                    Ok(snapshot) => {
                        if send_state(&mut socket, &snapshot).await.is_err() {
                            break;
                        }
                    }
                    // Every push is a full snapshot, so dropped ones are harmless.
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "ws: client lagged behind");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }
    info!("ws: client disconnected");
}

async fn send_state(socket: &mut WebSocket, snapshot: &StateSnapshot) -> Result<(), axum::Error> {
    let push = Push::state_update(snapshot.clone());
    let text = match serde_json::to_string(&push) {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "ws: encode push failed");
            return Ok(());
        }
    };
    socket.send(Message::Text(text.into())).await
}
