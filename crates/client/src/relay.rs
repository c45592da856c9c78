//! Inbound response relay.
//!
//! Consumes backend responses as they arrive, normalizes the heterogeneous
//! payload shapes into the canonical sink messages, and forwards them in
//! arrival order. Runs as its own task so a slow sink never stalls the
//! outbound sequencer.

use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::trace;

use crate::error::SpeechError;

/// A message delivered to the external sink.
///
/// Serializes to exactly one of `{"text", "is_final"}`, `{"error"}` or
/// `{"debug"}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RelayMessage {
    Transcript { text: String, is_final: bool },
    Error { error: String },
    Debug { debug: String },
}

/// Normalizes one backend payload into a sink message.
///
/// A payload that [`interpret`] classifies as a protocol error is recovered
/// locally: forwarded verbatim as a diagnostic rather than dropped or
/// surfaced to the session.
pub fn normalize(raw: &str) -> RelayMessage {
    interpret(raw).unwrap_or_else(|err| {
        trace!(error = %err, "forwarding uninterpretable payload as diagnostic");
        RelayMessage::Debug {
            debug: raw.to_string(),
        }
    })
}

/// Interprets one backend payload.
///
/// Recognized shapes, in order: nested `{"transcription":{"text","final"}}`,
/// then flat `{"text","isFinal"}` (`is_final` is accepted too). Anything
/// else is a protocol error carrying the raw payload.
fn interpret(raw: &str) -> Result<RelayMessage, SpeechError> {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(raw) {
        if let Some(text) = value
            .get("transcription")
            .and_then(|t| t.get("text"))
            .and_then(|t| t.as_str())
        {
            let is_final = value
                .get("transcription")
                .and_then(|t| t.get("final"))
                .and_then(|f| f.as_bool())
                .unwrap_or(false);
            return Ok(RelayMessage::Transcript {
                text: text.to_string(),
                is_final,
            });
        }
        if let Some(text) = value.get("text").and_then(|t| t.as_str()) {
            let is_final = value
                .get("isFinal")
                .or_else(|| value.get("is_final"))
                .and_then(|f| f.as_bool())
                .unwrap_or(false);
            return Ok(RelayMessage::Transcript {
                text: text.to_string(),
                is_final,
            });
        }
    }
    Err(SpeechError::Protocol(raw.to_string()))
}

/// Forwards backend payloads to the sink until the stream completes.
///
/// A closed sink means the caller is gone; that ends the relay quietly
/// rather than erroring the session.
pub(crate) async fn run(
    mut inbound: BoxStream<'static, Result<String, SpeechError>>,
    sink: mpsc::Sender<RelayMessage>,
) -> Result<(), SpeechError> {
    while let Some(item) = inbound.next().await {
        let payload = item?;
        trace!(bytes = payload.len(), "backend response received");
        if sink.send(normalize(&payload)).await.is_err() {
            return Ok(());
        }
    }
    Ok(())
}
