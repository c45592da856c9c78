//! Streaming client for a bidirectional speech-recognition backend.
//!
//! The backend's authentication scheme and RPC method identity differ across
//! deployments, so the client negotiates them against the live stream: ranked
//! credential and endpoint candidates are tried in priority order until one
//! combination yields an open stream. The crate is structured around the
//! pieces of one recognition session:
//!
//! - `queue`: bounded audio ingress queue between the caller and the session.
//! - `candidates`: ranked credential/endpoint guesses and the defaults.
//! - `negotiator`: the sequential credential-outer/endpoint-inner attempt loop.
//! - `sequencer`: turns queued audio into the backend's message sequence.
//! - `relay`: normalizes backend responses and forwards them to the sink.
//! - `session`: the state machine wiring the above together.
//! - `wire`: the gRPC transport and the two supported protocol variants.

pub mod candidates;
pub mod config;
pub mod error;
pub mod negotiator;
pub mod queue;
pub mod relay;
pub mod sequencer;
pub mod session;
pub mod wire;

pub use candidates::{CredentialCandidate, EndpointCandidate, WireVariant};
pub use config::StreamConfig;
pub use error::{ErrorClass, SpeechError};
pub use relay::RelayMessage;
pub use session::{SessionHandle, SessionParams, SessionState};
pub use wire::{BackendConnector, GrpcConnector, OutboundMessage, StreamHandle};
