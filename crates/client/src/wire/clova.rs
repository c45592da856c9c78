//! One-of request variant.
//!
//! Each request message carries either the streaming config or a run of raw
//! audio bytes. There is no explicit terminal message; the stream is ended
//! by half-closing the request side, which the session does by dropping the
//! outbound sender after the terminal marker.

use crate::config::StreamConfig;
use crate::wire::OutboundMessage;

#[derive(Clone, PartialEq, prost::Message)]
pub struct StreamingConfig {
    #[prost(string, tag = "1")]
    pub language_code: String,
    /// Always `LINEAR16`; the ingress only accepts 16-bit PCM.
    #[prost(string, tag = "2")]
    pub encoding: String,
    #[prost(uint32, tag = "3")]
    pub sample_rate_hertz: u32,
    #[prost(bool, tag = "4")]
    pub word_alignment: bool,
    #[prost(bool, tag = "5")]
    pub full_text: bool,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct RecognitionRequest {
    #[prost(oneof = "recognition_request::Body", tags = "1, 2")]
    pub body: Option<recognition_request::Body>,
}

pub mod recognition_request {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Body {
        #[prost(message, tag = "1")]
        Config(super::StreamingConfig),
        #[prost(bytes = "vec", tag = "2")]
        AudioContent(Vec<u8>),
    }
}

/// Responses are a single opaque JSON payload.
#[derive(Clone, PartialEq, prost::Message)]
pub struct RecognitionResponse {
    #[prost(string, tag = "1")]
    pub contents: String,
}

impl From<&StreamConfig> for StreamingConfig {
    fn from(config: &StreamConfig) -> Self {
        Self {
            language_code: config.language.clone(),
            encoding: "LINEAR16".to_string(),
            sample_rate_hertz: config.sample_rate_hertz,
            word_alignment: config.word_alignment,
            full_text: config.full_text,
        }
    }
}

/// Maps one sequenced message to the wire, or to nothing for the terminal
/// marker (this variant ends by half-close, not by message).
pub fn encode(message: OutboundMessage) -> Option<RecognitionRequest> {
    let body = match message {
        OutboundMessage::Config(config) => {
            recognition_request::Body::Config(StreamingConfig::from(&config))
        }
        OutboundMessage::Data { chunk, .. } => {
            recognition_request::Body::AudioContent(chunk.to_vec())
        }
        OutboundMessage::Terminal { .. } => return None,
    };
    Some(RecognitionRequest { body: Some(body) })
}
