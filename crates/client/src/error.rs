//! Error taxonomy for the recognition client.
//!
//! Errors carry a retry class so the negotiator can decide whether a failed
//! attempt should advance the credential, advance the endpoint, or abort.

use tonic::{Code, Status};

/// How the negotiator should react to a failed stream attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The credential was rejected; remaining endpoints for it are pointless.
    RetryCredential,
    /// The method identity was rejected; try the next endpoint candidate.
    RetryEndpoint,
    /// Not recoverable by trying another candidate.
    Fatal,
}

#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("no usable credential configured")]
    NoCredentials,
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("credential rejected by backend: {0}")]
    Auth(Status),
    #[error("method not implemented by backend: {0}")]
    Endpoint(Status),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("uninterpretable response payload: {0}")]
    Protocol(String),
    #[error("backend stream failed: {0}")]
    Fatal(Status),
    #[error("all {attempts} credential/endpoint combinations failed; last error: {last}")]
    Exhausted { attempts: usize, last: Box<SpeechError> },
}

impl SpeechError {
    /// Classifies a gRPC status from a stream attempt.
    ///
    /// Some deployments report auth/header mismatches as INTERNAL, so it is
    /// treated as credential-class alongside the explicit auth codes.
    pub fn from_status(status: Status) -> Self {
        match status.code() {
            Code::Unauthenticated | Code::PermissionDenied | Code::Internal => Self::Auth(status),
            Code::Unimplemented | Code::NotFound => Self::Endpoint(status),
            Code::Unavailable => Self::Transport(status.to_string()),
            _ => Self::Fatal(status),
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Auth(_) => ErrorClass::RetryCredential,
            Self::Endpoint(_) => ErrorClass::RetryEndpoint,
            _ => ErrorClass::Fatal,
        }
    }
}

impl From<tonic::transport::Error> for SpeechError {
    fn from(err: tonic::transport::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
