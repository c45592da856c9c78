//! Session lifecycle: negotiation, streaming, drain, teardown.
//!
//! One session owns one negotiated stream at most. The controller task wires
//! the ingress queue into the outbound sequencer and the inbound relay, and
//! publishes its lifecycle state over a watch channel so callers can observe
//! progress without polling.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::candidates::{CredentialCandidate, EndpointCandidate, default_endpoints};
use crate::config::StreamConfig;
use crate::error::SpeechError;
use crate::negotiator;
use crate::queue::{self, AudioProducer, QueueItem};
use crate::relay::{self, RelayMessage};
use crate::sequencer;
use crate::wire::{BackendConnector, StreamHandle};

/// Lifecycle states in the order they can be entered.
///
/// Transitions are monotonic: the ordering below is the only legal
/// progression, and `Error` absorbs every later transition attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionState {
    Init,
    Negotiating,
    Streaming,
    Draining,
    Closed,
    Error,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Error)
    }
}

/// Everything a session needs besides the connector and the sink.
#[derive(Debug)]
pub struct SessionParams {
    pub credentials: Vec<CredentialCandidate>,
    pub endpoints: Vec<EndpointCandidate>,
    pub config: StreamConfig,
    /// Ingress queue depth, in chunks.
    pub queue_capacity: usize,
    /// How long to wait for trailing backend responses after the last audio
    /// message before giving up on them.
    pub drain_grace: Duration,
}

impl SessionParams {
    pub fn new(credentials: Vec<CredentialCandidate>, config: StreamConfig) -> Self {
        Self {
            credentials,
            endpoints: default_endpoints(),
            config,
            queue_capacity: 64,
            drain_grace: Duration::from_secs(10),
        }
    }
}

/// The caller's side of a running session.
pub struct SessionHandle {
    audio: AudioProducer,
    state: watch::Receiver<SessionState>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    /// Enqueues an audio chunk, waiting when the ingress queue is full.
    pub async fn push_audio(&self, chunk: Bytes) -> Result<(), SpeechError> {
        self.audio.push(chunk).await
    }

    /// Signals that no more audio will arrive. Idempotent.
    pub async fn finish_audio(&self) {
        self.audio.finish().await;
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Waits for the session to reach a terminal state and returns it.
    pub async fn closed(&mut self) -> SessionState {
        loop {
            let current = *self.state.borrow_and_update();
            if current.is_terminal() {
                return current;
            }
            if self.state.changed().await.is_err() {
                return *self.state.borrow();
            }
        }
    }

    /// Tears the session down without waiting for the drain.
    pub fn abort(&self) {
        self.task.abort();
    }
}

/// Starts a session task. Transcripts and errors arrive on `sink`; audio
/// goes in through the returned handle.
pub fn spawn(
    connector: Arc<dyn BackendConnector>,
    params: SessionParams,
    sink: mpsc::Sender<RelayMessage>,
) -> SessionHandle {
    let (audio, queue) = queue::channel(params.queue_capacity);
    let (state_tx, state_rx) = watch::channel(SessionState::Init);
    let task = tokio::spawn(run(connector, params, queue, sink, state_tx));
    SessionHandle {
        audio,
        state: state_rx,
        task,
    }
}

async fn run(
    connector: Arc<dyn BackendConnector>,
    params: SessionParams,
    queue: mpsc::Receiver<QueueItem>,
    sink: mpsc::Sender<RelayMessage>,
    state: watch::Sender<SessionState>,
) {
    if let Err(err) = drive(connector, &params, queue, &sink, &state).await {
        error!(error = %err, "recognition session failed");
        let _ = sink
            .send(RelayMessage::Error { error: err.to_string() })
            .await;
        advance(&state, SessionState::Error);
    }
}

async fn drive(
    connector: Arc<dyn BackendConnector>,
    params: &SessionParams,
    mut queue: mpsc::Receiver<QueueItem>,
    sink: &mpsc::Sender<RelayMessage>,
    state: &watch::Sender<SessionState>,
) -> Result<(), SpeechError> {
    // An unconfigurable session fails straight out of INIT; a watcher must
    // never see it negotiating.
    if params.credentials.is_empty() {
        return Err(SpeechError::NoCredentials);
    }

    advance(state, SessionState::Negotiating);
    let handle = negotiator::negotiate(
        connector.as_ref(),
        &params.credentials,
        &params.endpoints,
        &params.config,
    )
    .await?;

    advance(state, SessionState::Streaming);
    let StreamHandle { outbound, inbound } = handle;
    let mut relay_task = tokio::spawn(relay::run(inbound, sink.clone()));

    // The sequencer owns `outbound`; its return drops the sender, which is
    // what half-closes the request side for the one-of variant.
    let sequenced = tokio::select! {
        result = sequencer::run(&params.config, &mut queue, outbound) => Some(result),
        joined = &mut relay_task => {
            // Backend closed the stream before the audio ran out.
            join_relay(joined)?;
            None
        }
    };

    if let Some(result) = sequenced {
        if let Err(err) = result {
            relay_task.abort();
            return Err(err);
        }
        advance(state, SessionState::Draining);
        match tokio::time::timeout(params.drain_grace, &mut relay_task).await {
            Ok(joined) => join_relay(joined)?,
            Err(_) => {
                warn!(
                    grace_secs = params.drain_grace.as_secs(),
                    "backend kept the stream open past the drain grace; dropping it"
                );
                relay_task.abort();
            }
        }
    }

    advance(state, SessionState::Closed);
    info!("recognition session closed");
    Ok(())
}

fn join_relay(
    joined: Result<Result<(), SpeechError>, tokio::task::JoinError>,
) -> Result<(), SpeechError> {
    joined.map_err(|err| SpeechError::Transport(format!("relay task failed: {err}")))?
}

fn advance(state: &watch::Sender<SessionState>, next: SessionState) -> bool {
    state.send_if_modified(|current| {
        if next > *current {
            *current = next;
            true
        } else {
            false
        }
    })
}
