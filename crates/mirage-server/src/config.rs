//! Server configuration from the environment.

use std::env;

use mirage_auth::AuthMode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("TOKEN_SIGNING_KEY must be set when AUTH_MODE=enforced")]
    MissingSigningKey,

    #[error("AUTH_MODE must be 'enforced' or 'open', got '{0}'")]
    BadAuthMode(String),

    #[error("ALERT_RISK_THRESHOLD must be an integer, got '{0}'")]
    BadThreshold(String),
}

/// Environment-driven server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Connection string to persistence (`mem://`, `ws://host:port`).
    pub storage_uri: String,
    pub storage_username: Option<String>,
    pub storage_password: Option<String>,
    /// Base URL of the classifier RPC.
    pub classifier_url: String,
    pub auth_mode: AuthMode,
    /// Required iff `auth_mode` is enforced.
    pub token_signing_key: String,
    /// Risk threshold Θ at or above which alerts materialise.
    pub alert_risk_threshold: f64,
    pub listen_addr: String,
    /// Base URL agents use to reach this server; embedded in bundles.
    pub public_base_url: String,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let storage_uri = env::var("STORAGE_URI").unwrap_or_else(|_| "mem://".into());
        let classifier_url =
            env::var("CLASSIFIER_URL").unwrap_or_else(|_| "http://localhost:8000".into());

        let mode_raw = env::var("AUTH_MODE").unwrap_or_else(|_| "enforced".into());
        let auth_mode =
            AuthMode::parse(&mode_raw).ok_or_else(|| ConfigError::BadAuthMode(mode_raw))?;

        let token_signing_key = match env::var("TOKEN_SIGNING_KEY") {
            Ok(key) if !key.is_empty() => key,
            _ if auth_mode == AuthMode::Enforced => return Err(ConfigError::MissingSigningKey),
            _ => String::new(),
        };

        let alert_risk_threshold = match env::var("ALERT_RISK_THRESHOLD") {
            Ok(raw) => raw
                .parse::<i64>()
                .map_err(|_| ConfigError::BadThreshold(raw))? as f64,
            Err(_) => 7.0,
        };

        let listen_addr = env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8001".into());
        let public_base_url =
            env::var("PUBLIC_BASE_URL").unwrap_or_else(|_| format!("http://{listen_addr}"));

        Ok(Self {
            storage_uri,
            storage_username: env::var("STORAGE_USERNAME").ok(),
            storage_password: env::var("STORAGE_PASSWORD").ok(),
            classifier_url,
            auth_mode,
            token_signing_key,
            alert_risk_threshold,
            listen_addr,
            public_base_url,
        })
    }
}
