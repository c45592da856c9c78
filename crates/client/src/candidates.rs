//! Ranked credential and endpoint candidates for stream negotiation.

use std::fmt;

/// One authentication scheme: an ordered set of metadata header pairs.
///
/// Header names must be lower-case; the transport rejects anything else.
#[derive(Clone)]
pub struct CredentialCandidate {
    label: &'static str,
    headers: Vec<(&'static str, String)>,
}

impl CredentialCandidate {
    /// Paired gateway key-id/key headers. Tried first.
    pub fn gateway_key_pair(key_id: &str, key: &str) -> Self {
        Self {
            label: "gateway-key-pair",
            headers: vec![
                ("x-ncp-apigw-api-keyid", key_id.to_string()),
                ("x-ncp-apigw-api-key", key.to_string()),
            ],
        }
    }

    /// A single secret-key header. Tried second.
    pub fn secret_key(key: &str) -> Self {
        Self {
            label: "secret-key",
            headers: vec![("x-clovaspeech-api-key", key.to_string())],
        }
    }

    /// A bearer-token authorization header. Tried last.
    pub fn bearer_token(token: &str) -> Self {
        Self {
            label: "bearer-token",
            headers: vec![("authorization", format!("Bearer {token}"))],
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn headers(&self) -> &[(&'static str, String)] {
        &self.headers
    }
}

impl fmt::Debug for CredentialCandidate {
    // Header values are secrets; expose the scheme and header names only.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialCandidate")
            .field("label", &self.label)
            .field(
                "headers",
                &self.headers.iter().map(|(name, _)| *name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Which of the two backend protocol variants an endpoint speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireVariant {
    /// One-of request: a message carries either a Config or raw audio bytes.
    OneOf,
    /// Typed envelope: CONFIG/DATA messages with JSON side contents.
    Envelope,
}

/// One guess at the backend's RPC method identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointCandidate {
    path: String,
    variant: WireVariant,
}

impl EndpointCandidate {
    pub fn new(path: impl Into<String>, variant: WireVariant) -> Self {
        Self {
            path: path.into(),
            variant,
        }
    }

    /// Fully-qualified gRPC method path, e.g. `/pkg.v1.Service/Method`.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn variant(&self) -> WireVariant {
        self.variant
    }
}

pub const RECOGNIZER_V1: &str = "/ncloud.ai.clovaspeech.v1.ClovaSpeechRecognizer/Recognize";
pub const RECOGNIZER_V2: &str = "/ncloud.ai.clovaspeech.v2.ClovaSpeechRecognizer/Recognize";
pub const NEST_RECOGNIZER: &str = "/com.nbp.cdncp.nest.grpc.proto.v1.NestService/recognize";

/// The namespace/version guesses probed when the backend rejects a method
/// identity, in priority order.
pub fn default_endpoints() -> Vec<EndpointCandidate> {
    vec![
        EndpointCandidate::new(RECOGNIZER_V1, WireVariant::OneOf),
        EndpointCandidate::new(RECOGNIZER_V2, WireVariant::OneOf),
        EndpointCandidate::new(NEST_RECOGNIZER, WireVariant::Envelope),
    ]
}
