//! `WebSocket` handler: one task per session.
//!
//! Clients connect to `GET /ws`. The task registers an outbox with the hub,
//! then forwards hub events to the socket and client `brick-click` frames to
//! the hub until either side goes away. Frames that do not decode are
//! dropped without a reply.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use brickwall_core::HubHandle;
use brickwall_types::{ClientEvent, ServerEvent};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` session.
///
/// # Route
///
/// `GET /ws`
pub async fn ws_wall(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

/// Decode a client text frame. Anything that is not a well-formed
/// [`ClientEvent`] yields `None`.
pub fn decode_client_frame(text: &str) -> Option<ClientEvent> {
    match serde_json::from_str(text) {
        Ok(event) => Some(event),
        Err(e) => {
            debug!(error = %e, "Dropping undecodable client frame");
            None
        }
    }
}

/// Encode a server event as a text frame.
pub fn encode_server_event(event: &ServerEvent) -> Option<Message> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Message::Text(json.into())),
        Err(e) => {
            warn!(event = event.name(), "Failed to serialize server event: {e}");
            None
        }
    }
}

/// Route one decoded client event to the hub.
fn dispatch_client_event(hub: &HubHandle, event: ClientEvent) -> bool {
    match event {
        ClientEvent::BrickClick(raw_id) => hub.click(raw_id).is_ok(),
    }
}

/// Handle the `WebSocket` lifecycle for one session.
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let session = match state.hub.connect(tx).await {
        Ok(id) => id,
        Err(e) => {
            warn!("Refusing WebSocket session: {e}");
            return;
        }
    };
    debug!(%session, "WebSocket session open");

    loop {
        tokio::select! {
            // Events from the hub, in hub order.
            event = rx.recv() => {
                let Some(event) = event else {
                    debug!(%session, "Hub closed session outbox");
                    break;
                };
                let Some(msg) = encode_server_event(&event) else {
                    continue;
                };
                if socket.send(msg).await.is_err() {
                    debug!(%session, "WebSocket client disconnected (send failed)");
                    break;
                }
            }
            // Frames from the client.
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(event) = decode_client_frame(text.as_str()) {
                            if !dispatch_client_event(&state.hub, event) {
                                warn!(%session, "Hub stopped, closing session");
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(%session, "WebSocket client disconnected");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!(%session, "WebSocket client disconnected (pong failed)");
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        debug!(%session, "WebSocket error: {e}");
                        break;
                    }
                    _ => {
                        // Binary and pong frames carry nothing for us.
                    }
                }
            }
        }
    }

    if state.hub.disconnect(session).is_err() {
        debug!(%session, "Hub already stopped at disconnect");
    }
}

#[cfg(test)]
mod tests {
    use brickwall_types::BrickId;

    use super::*;

    #[test]
    fn decodes_brick_click() {
        let event = decode_client_frame(r#"{"event":"brick-click","data":"3_4"}"#);
        assert_eq!(event, Some(ClientEvent::BrickClick(String::from("3_4"))));
    }

    #[test]
    fn drops_garbage_frames() {
        for text in [
            "",
            "not json",
            "[]",
            r#"{"event":"brick-click","data":34}"#,
            r#"{"event":"user-count","data":3}"#,
        ] {
            assert_eq!(decode_client_frame(text), None, "{text:?}");
        }
    }

    #[test]
    fn encodes_text_frames() {
        let msg = encode_server_event(&ServerEvent::BrickReturn(BrickId::new(1, 2)));
        let text = match msg {
            Some(Message::Text(text)) => text.as_str().to_owned(),
            _ => String::new(),
        };
        assert_eq!(text, r#"{"event":"brick-return","data":"1_2"}"#);
    }

    #[tokio::test(start_paused = true)]
    async fn click_is_forwarded_to_the_hub() {
        let (hub, _task) = brickwall_core::spawn_hub(&brickwall_core::config::WallConfig::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _session = hub.connect(tx).await;
        while rx.try_recv().is_ok() {}

        let event = ClientEvent::BrickClick(String::from("0_0"));
        assert!(dispatch_client_event(&hub, event));

        assert_eq!(
            rx.recv().await,
            Some(ServerEvent::BrickFall(BrickId::new(0, 0)))
        );
    }
}
