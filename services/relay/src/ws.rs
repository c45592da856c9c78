//! WebSocket ingress: bridges one client connection to one recognition
//! session.
//!
//! Inbound binary frames carry raw 16 kHz mono 16-bit PCM with arbitrary
//! framing; non-binary frames are ignored apart from close. Outbound frames
//! are the session's JSON sink messages, one object per text frame.

use crate::state::AppState;
use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use stt_client::StreamConfig;
use stt_client::session::{self, SessionParams};
use tokio::sync::mpsc;
use tracing::{Instrument, info, warn};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    pub lang: Option<String>,
}

/// Axum handler to upgrade an HTTP connection to a WebSocket.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<StreamQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, query.lang))
}

/// Main handler for an individual WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>, lang: Option<String>) {
    let session_id = Uuid::new_v4();
    let language = lang.unwrap_or_else(|| state.config.default_language.clone());
    let span = tracing::info_span!("transcribe_session", %session_id, %language);

    async move {
        info!("New WebSocket connection. Starting recognition session...");

        let mut params = SessionParams::new(
            state.credentials.clone(),
            StreamConfig::for_language(language),
        );
        params.endpoints = state.endpoints.clone();
        params.drain_grace = state.config.drain_grace;

        let (sink_tx, mut sink_rx) = mpsc::channel(32);
        let mut session = session::spawn(state.connector.clone(), params, sink_tx);

        let (mut socket_tx, mut socket_rx) = socket.split();

        // Forwards sink messages to the client until the session's side of
        // the sink closes, then closes the socket.
        let writer = tokio::spawn(async move {
            while let Some(message) = sink_rx.recv().await {
                let payload = match serde_json::to_string(&message) {
                    Ok(payload) => payload,
                    Err(e) => {
                        warn!(error = %e, "failed to serialize sink message");
                        continue;
                    }
                };
                if socket_tx.send(Message::Text(payload.into())).await.is_err() {
                    break;
                }
            }
            let _ = socket_tx.close().await;
        });

        while let Some(Ok(frame)) = socket_rx.next().await {
            match frame {
                Message::Binary(chunk) => {
                    if session.push_audio(chunk).await.is_err() {
                        break;
                    }
                }
                Message::Close(_) => break,
                // Pings are answered by axum; other frames are ignored.
                _ => {}
            }
        }

        // Reached on clean close and on abrupt disconnect alike; finishing
        // is idempotent either way.
        session.finish_audio().await;
        let final_state = session.closed().await;
        info!(?final_state, "recognition session finished");
        let _ = writer.await;
    }
    .instrument(span)
    .await
}
