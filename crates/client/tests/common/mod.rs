#![allow(dead_code)]

//! Scripted in-process backend for exercising negotiation and sessions
//! without a live gRPC channel.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::Status;

use stt_client::wire::{BackendConnector, OutboundMessage, StreamHandle};
use stt_client::{CredentialCandidate, EndpointCandidate, SpeechError, StreamConfig};

/// What the fake backend does with one stream attempt.
pub enum Attempt {
    /// Reject the attempt with this status.
    Reject(Status),
    /// Accept the stream; once the client closes its side, replay these
    /// payloads as the backend's responses.
    Accept(Vec<Result<String, SpeechError>>),
    /// Accept the stream but never complete the response side: the inbound
    /// stream stays open indefinitely after the client closes its side.
    AcceptAndStall,
}

/// Plays back a fixed script of attempt outcomes, in order, while recording
/// which candidates were tried and which messages were sent.
pub struct MockConnector {
    script: Mutex<VecDeque<Attempt>>,
    attempts: Mutex<Vec<(&'static str, String)>>,
    sent: Arc<Mutex<Vec<OutboundMessage>>>,
}

impl MockConnector {
    pub fn new(script: Vec<Attempt>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            attempts: Mutex::new(Vec::new()),
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// `(credential label, endpoint path)` per attempt, in order.
    pub fn attempts(&self) -> Vec<(&'static str, String)> {
        self.attempts.lock().unwrap().clone()
    }

    /// Every message the client sent on the accepted stream.
    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl BackendConnector for MockConnector {
    async fn open_stream(
        &self,
        credential: &CredentialCandidate,
        endpoint: &EndpointCandidate,
        _config: &StreamConfig,
    ) -> Result<StreamHandle, SpeechError> {
        self.attempts
            .lock()
            .unwrap()
            .push((credential.label(), endpoint.path().to_string()));

        let attempt = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .expect("more stream attempts than scripted outcomes");

        let (responses, stall) = match attempt {
            Attempt::Reject(status) => return Err(SpeechError::from_status(status)),
            Attempt::Accept(responses) => (responses, false),
            Attempt::AcceptAndStall => (Vec::new(), true),
        };

        let (out_tx, mut out_rx) = mpsc::channel::<OutboundMessage>(64);
        let (in_tx, in_rx) = mpsc::channel(64);
        let sent = self.sent.clone();
        tokio::spawn(async move {
            while let Some(message) = out_rx.recv().await {
                let terminal = matches!(message, OutboundMessage::Terminal { .. });
                sent.lock().unwrap().push(message);
                if terminal {
                    break;
                }
            }
            for item in responses {
                if in_tx.send(item).await.is_err() {
                    return;
                }
            }
            if stall {
                // Holds `in_tx` open forever so the inbound stream never
                // completes on its own.
                std::future::pending::<()>().await;
            }
        });

        Ok(StreamHandle {
            outbound: out_tx,
            inbound: ReceiverStream::new(in_rx).boxed(),
        })
    }
}

pub fn test_credentials() -> Vec<CredentialCandidate> {
    vec![
        CredentialCandidate::gateway_key_pair("key-id", "key"),
        CredentialCandidate::secret_key("secret"),
    ]
}
