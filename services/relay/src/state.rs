//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds all shared,
//! clonable resources like the backend connector and the loaded config.

use crate::config::Config;
use std::sync::Arc;
use stt_client::{BackendConnector, CredentialCandidate, EndpointCandidate};

/// The shared application state, created once at startup and passed to all handlers.
/// All fields are public to be accessible from other modules.
#[derive(Clone)]
pub struct AppState {
    pub connector: Arc<dyn BackendConnector>,
    pub credentials: Vec<CredentialCandidate>,
    pub endpoints: Vec<EndpointCandidate>,
    pub config: Arc<Config>,
}
