//! gRPC transport and the two supported protocol variants.
//!
//! The backend is reachable through two request shapes depending on the
//! deployment generation: a one-of request where each message is either a
//! config or raw audio bytes ([`clova`]), and a typed envelope carrying a
//! JSON config and per-chunk JSON side contents ([`nest`]). The negotiated
//! endpoint decides which shape a session speaks; everything upstream of
//! this module deals in [`OutboundMessage`] only.

pub mod clova;
pub mod nest;

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::Request;
use tonic::client::Grpc;
use tonic::codec::ProstCodec;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::metadata::{AsciiMetadataKey, AsciiMetadataValue};
use tonic::transport::{Channel, ClientTlsConfig, Endpoint};
use tracing::debug;

use crate::candidates::{CredentialCandidate, EndpointCandidate, WireVariant};
use crate::config::StreamConfig;
use crate::error::SpeechError;

/// A variant-independent outbound message produced by the sequencer.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundMessage {
    /// The session parameters. Exactly one, always first.
    Config(StreamConfig),
    /// One non-empty audio chunk with its sequence id.
    Data { seq_id: i64, chunk: Bytes },
    /// End of audio. Exactly one, always last.
    Terminal { seq_id: i64 },
}

/// Both halves of one open recognition stream.
///
/// `outbound` accepts the sequenced messages; dropping it half-closes the
/// request side. `inbound` yields backend payloads until the server closes
/// or fails the stream.
pub struct StreamHandle {
    pub outbound: mpsc::Sender<OutboundMessage>,
    pub inbound: BoxStream<'static, Result<String, SpeechError>>,
}

impl std::fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandle")
            .field("outbound", &self.outbound)
            .field("inbound", &"BoxStream")
            .finish()
    }
}

/// Opens recognition streams against a backend.
///
/// The seam that lets session tests run against an in-process fake instead
/// of a live gRPC channel.
#[async_trait]
pub trait BackendConnector: Send + Sync {
    async fn open_stream(
        &self,
        credential: &CredentialCandidate,
        endpoint: &EndpointCandidate,
        config: &StreamConfig,
    ) -> Result<StreamHandle, SpeechError>;
}

/// The production connector: one shared HTTP/2 channel, one RPC per
/// negotiation attempt.
#[derive(Clone)]
pub struct GrpcConnector {
    channel: Channel,
}

impl GrpcConnector {
    /// Connects eagerly so transport problems surface before negotiation
    /// starts burning candidate attempts on them.
    pub async fn connect(uri: &str) -> Result<Self, SpeechError> {
        let endpoint = Endpoint::from_shared(uri.to_string())?
            .tls_config(ClientTlsConfig::new().with_native_roots())?
            .http2_keep_alive_interval(Duration::from_secs(20))
            .keep_alive_timeout(Duration::from_secs(10))
            .keep_alive_while_idle(true);
        let channel = endpoint.connect().await?;
        debug!(uri, "gRPC channel established");
        Ok(Self { channel })
    }
}

#[async_trait]
impl BackendConnector for GrpcConnector {
    async fn open_stream(
        &self,
        credential: &CredentialCandidate,
        endpoint: &EndpointCandidate,
        config: &StreamConfig,
    ) -> Result<StreamHandle, SpeechError> {
        let mut grpc = Grpc::new(self.channel.clone());
        grpc.ready().await?;

        let path: PathAndQuery = endpoint
            .path()
            .parse()
            .map_err(|_| SpeechError::Config(format!("invalid method path {:?}", endpoint.path())))?;

        // The request stream yields nothing until the sequencer starts
        // feeding `outbound`, so a rejected attempt consumes no audio.
        let (outbound, rx) = mpsc::channel::<OutboundMessage>(64);

        let inbound = match endpoint.variant() {
            WireVariant::OneOf => {
                let requests = ReceiverStream::new(rx)
                    .filter_map(|msg| futures_util::future::ready(clova::encode(msg)));
                let mut request = Request::new(requests);
                attach_credential(&mut request, credential)?;
                let response = grpc
                    .streaming(
                        request,
                        path,
                        ProstCodec::<clova::RecognitionRequest, clova::RecognitionResponse>::default(),
                    )
                    .await
                    .map_err(SpeechError::from_status)?;
                response
                    .into_inner()
                    .map(|item| {
                        item.map(|resp| resp.contents).map_err(SpeechError::from_status)
                    })
                    .boxed()
            }
            WireVariant::Envelope => {
                let config_json = nest::config_json(config);
                let requests = ReceiverStream::new(rx)
                    .map(move |msg| nest::encode(msg, &config_json));
                let mut request = Request::new(requests);
                attach_credential(&mut request, credential)?;
                let response = grpc
                    .streaming(
                        request,
                        path,
                        ProstCodec::<nest::NestRequest, nest::NestResponse>::default(),
                    )
                    .await
                    .map_err(SpeechError::from_status)?;
                response
                    .into_inner()
                    .map(|item| {
                        item.map(|resp| resp.contents).map_err(SpeechError::from_status)
                    })
                    .boxed()
            }
        };

        Ok(StreamHandle { outbound, inbound })
    }
}

fn attach_credential<T>(
    request: &mut Request<T>,
    credential: &CredentialCandidate,
) -> Result<(), SpeechError> {
    for (name, value) in credential.headers() {
        let key: AsciiMetadataKey = name
            .parse()
            .map_err(|_| SpeechError::Config(format!("invalid metadata key {name:?}")))?;
        let value: AsciiMetadataValue = value
            .parse()
            .map_err(|_| SpeechError::Config(format!("non-ascii value for metadata key {name:?}")))?;
        request.metadata_mut().insert(key, value);
    }
    Ok(())
}
