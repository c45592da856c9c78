//! Credential/endpoint negotiation.
//!
//! Tries ranked (credential, endpoint) combinations against the live backend
//! until one opens, credentials as the outer loop. Attempts are strictly
//! sequential: there is never more than one live stream per session.

use tracing::{debug, info, warn};

use crate::candidates::{CredentialCandidate, EndpointCandidate};
use crate::config::StreamConfig;
use crate::error::{ErrorClass, SpeechError};
use crate::wire::{BackendConnector, StreamHandle};

/// Finds a working (credential, endpoint) pair by sequential trial.
///
/// An endpoint-class rejection advances the endpoint only; a credential-class
/// rejection abandons the remaining endpoints for that credential. The loop
/// stops at the first open stream. A fatal error aborts immediately without
/// trying further candidates; exhausting every combination yields an
/// aggregated error carrying the last observed cause.
pub async fn negotiate(
    connector: &dyn BackendConnector,
    credentials: &[CredentialCandidate],
    endpoints: &[EndpointCandidate],
    config: &StreamConfig,
) -> Result<StreamHandle, SpeechError> {
    if credentials.is_empty() {
        return Err(SpeechError::NoCredentials);
    }
    if endpoints.is_empty() {
        return Err(SpeechError::Config("no endpoint candidates configured".to_string()));
    }

    let mut attempts = 0usize;
    let mut last: Option<SpeechError> = None;

    'credentials: for credential in credentials {
        for endpoint in endpoints {
            attempts += 1;
            debug!(
                credential = credential.label(),
                endpoint = endpoint.path(),
                attempt = attempts,
                "opening recognition stream"
            );
            match connector.open_stream(credential, endpoint, config).await {
                Ok(handle) => {
                    info!(
                        credential = credential.label(),
                        endpoint = endpoint.path(),
                        attempts,
                        "recognition stream established"
                    );
                    return Ok(handle);
                }
                Err(err) => match err.class() {
                    ErrorClass::RetryEndpoint => {
                        warn!(
                            endpoint = endpoint.path(),
                            error = %err,
                            "endpoint rejected; advancing to next endpoint"
                        );
                        last = Some(err);
                    }
                    ErrorClass::RetryCredential => {
                        warn!(
                            credential = credential.label(),
                            error = %err,
                            "credential rejected; advancing to next credential"
                        );
                        last = Some(err);
                        continue 'credentials;
                    }
                    ErrorClass::Fatal => return Err(err),
                },
            }
        }
    }

    Err(SpeechError::Exhausted {
        attempts,
        last: Box::new(last.unwrap_or(SpeechError::NoCredentials)),
    })
}
