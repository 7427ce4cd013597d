//! Authentication error types.

use mirage_core::error::MirageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    BadCredentials,

    #[error("email is already registered")]
    EmailTaken,

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for MirageError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::BadCredentials => MirageError::Unauthenticated {
                reason: err.to_string(),
            },
            AuthError::EmailTaken => MirageError::Conflict {
                entity: "user".into(),
            },
            AuthError::TokenExpired | AuthError::TokenInvalid(_) => MirageError::Unauthenticated {
                reason: err.to_string(),
            },
            AuthError::Crypto(msg) => MirageError::Crypto(msg),
        }
    }
}
