use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use stt_client::CredentialCandidate;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub backend_uri: String,
    pub api_key_id: Option<String>,
    pub api_key: Option<String>,
    pub secret_key: Option<String>,
    pub bearer_token: Option<String>,
    pub default_language: String,
    pub drain_grace: Duration,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let backend_uri = std::env::var("BACKEND_GRPC_URI")
            .map_err(|_| ConfigError::MissingVar("BACKEND_GRPC_URI".to_string()))?;

        let api_key_id = std::env::var("CLOVA_API_KEY_ID").ok();
        let api_key = std::env::var("CLOVA_API_KEY").ok();
        let secret_key = std::env::var("CLOVASPEECH_SECRET_KEY").ok();
        let bearer_token = std::env::var("CLOVA_BEARER_TOKEN").ok();

        // The gateway headers only work as a pair.
        if api_key_id.is_some() != api_key.is_some() {
            return Err(ConfigError::InvalidValue(
                "CLOVA_API_KEY_ID/CLOVA_API_KEY".to_string(),
                "both must be set to use the gateway key pair".to_string(),
            ));
        }
        if api_key.is_none() && secret_key.is_none() && bearer_token.is_none() {
            return Err(ConfigError::MissingVar(
                "at least one of CLOVA_API_KEY_ID/CLOVA_API_KEY, CLOVASPEECH_SECRET_KEY or CLOVA_BEARER_TOKEN must be set"
                    .to_string(),
            ));
        }

        let default_language =
            std::env::var("DEFAULT_LANGUAGE").unwrap_or_else(|_| "ko-KR".to_string());

        let drain_grace_str =
            std::env::var("DRAIN_GRACE_SECS").unwrap_or_else(|_| "10".to_string());
        let drain_grace_secs = drain_grace_str.parse::<u64>().map_err(|e| {
            ConfigError::InvalidValue("DRAIN_GRACE_SECS".to_string(), e.to_string())
        })?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            bind_address,
            backend_uri,
            api_key_id,
            api_key,
            secret_key,
            bearer_token,
            default_language,
            drain_grace: Duration::from_secs(drain_grace_secs),
            log_level,
        })
    }

    /// The configured credential candidates in negotiation priority order:
    /// gateway key pair, then secret key, then bearer token.
    pub fn credentials(&self) -> Vec<CredentialCandidate> {
        let mut candidates = Vec::new();
        if let (Some(key_id), Some(key)) = (&self.api_key_id, &self.api_key) {
            candidates.push(CredentialCandidate::gateway_key_pair(key_id, key));
        }
        if let Some(secret) = &self.secret_key {
            candidates.push(CredentialCandidate::secret_key(secret));
        }
        if let Some(token) = &self.bearer_token {
            candidates.push(CredentialCandidate::bearer_token(token));
        }
        candidates
    }
}

impl fmt::Debug for Config {
    // Key material stays out of logs; only record which schemes are set.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("backend_uri", &self.backend_uri)
            .field("api_key_id", &self.api_key_id.is_some())
            .field("api_key", &self.api_key.is_some())
            .field("secret_key", &self.secret_key.is_some())
            .field("bearer_token", &self.bearer_token.is_some())
            .field("default_language", &self.default_language)
            .field("drain_grace", &self.drain_grace)
            .field("log_level", &self.log_level)
            .finish()
    }
}
