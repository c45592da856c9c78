//! Typed-envelope request variant.
//!
//! Every request message carries an explicit type tag. The config payload is
//! a JSON document rather than typed fields, and each data message carries
//! JSON side contents with the sequence id and an end-point flag. The stream
//! is ended in-band: the terminal marker becomes an empty data message with
//! the flag raised.

use serde_json::json;

use crate::config::StreamConfig;
use crate::wire::OutboundMessage;

#[derive(Clone, Copy, Debug, PartialEq, Eq, prost::Enumeration)]
#[repr(i32)]
pub enum RequestType {
    Config = 0,
    Data = 1,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct NestRequest {
    #[prost(enumeration = "RequestType", tag = "1")]
    pub r#type: i32,
    #[prost(oneof = "nest_request::Part", tags = "2, 3")]
    pub part: Option<nest_request::Part>,
}

pub mod nest_request {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Part {
        #[prost(message, tag = "2")]
        Config(super::NestConfig),
        #[prost(message, tag = "3")]
        Data(super::NestData),
    }
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct NestConfig {
    /// JSON session parameters, see [`config_json`].
    #[prost(string, tag = "1")]
    pub config: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct NestData {
    #[prost(bytes = "vec", tag = "1")]
    pub chunk: Vec<u8>,
    /// JSON side contents: `{"seqId": n, "epFlag": bool}`.
    #[prost(string, tag = "2")]
    pub extra_contents: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct NestResponse {
    #[prost(string, tag = "1")]
    pub contents: String,
}

/// Renders the session parameters as this variant's JSON config document.
/// The language is the short-form code, not the full tag.
pub fn config_json(config: &StreamConfig) -> String {
    json!({
        "transcription": {
            "language": config.short_language_code(),
        },
        "semanticEpd": {
            "skipEmptyText": config.skip_empty_text,
            "useWordEpd": config.use_word_epd,
            "usePeriodEpd": config.use_period_epd,
        },
    })
    .to_string()
}

fn extra_contents(seq_id: i64, ep_flag: bool) -> String {
    json!({ "seqId": seq_id, "epFlag": ep_flag }).to_string()
}

/// Maps one sequenced message to the wire. Unlike the one-of variant, the
/// terminal marker is a real message here: an empty chunk with the flag set.
pub fn encode(message: OutboundMessage, config_json: &str) -> NestRequest {
    match message {
        OutboundMessage::Config(_) => NestRequest {
            r#type: RequestType::Config as i32,
            part: Some(nest_request::Part::Config(NestConfig {
                config: config_json.to_string(),
            })),
        },
        OutboundMessage::Data { seq_id, chunk } => NestRequest {
            r#type: RequestType::Data as i32,
            part: Some(nest_request::Part::Data(NestData {
                chunk: chunk.to_vec(),
                extra_contents: extra_contents(seq_id, false),
            })),
        },
        OutboundMessage::Terminal { seq_id } => NestRequest {
            r#type: RequestType::Data as i32,
            part: Some(nest_request::Part::Data(NestData {
                chunk: Vec::new(),
                extra_contents: extra_contents(seq_id, true),
            })),
        },
    }
}
