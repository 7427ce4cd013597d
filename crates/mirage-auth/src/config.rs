//! Authentication configuration.

use uuid::Uuid;

/// Principal returned by every verify call in open mode.
pub const DEMO_USER_ID: Uuid = Uuid::nil();
pub const DEMO_USER_EMAIL: &str = "demo@mirage.local";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Full credential verification.
    Enforced,
    /// Development convenience: every verify resolves to the demo
    /// principal and node credential checks are skipped. Persisted
    /// data keeps its shape.
    Open,
}

impl AuthMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "enforced" => Some(AuthMode::Enforced),
            "open" => Some(AuthMode::Open),
            _ => None,
        }
    }
}

/// Configuration for the identity service.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC secret for HS256 bearer signing. Process-wide, immutable
    /// after startup.
    pub signing_key: String,
    /// Bearer lifetime in seconds (default: 604_800 = 7 days).
    pub token_lifetime_secs: u64,
    /// JWT issuer (`iss` claim).
    pub issuer: String,
    /// Optional pepper prepended to passwords before Argon2id.
    pub pepper: Option<String>,
    /// Minimum password length for registration.
    pub min_password_length: usize,
    pub mode: AuthMode,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            signing_key: String::new(),
            token_lifetime_secs: 604_800,
            issuer: "mirage".into(),
            pepper: None,
            min_password_length: 8,
            mode: AuthMode::Enforced,
        }
    }
}
