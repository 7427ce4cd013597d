//! Bearer token issuance and verification (HS256 JWT).

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;

/// Claims embedded in every bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BearerClaims {
    /// Subject — user ID (UUID string).
    pub sub: String,
    pub email: String,
    /// Issuer.
    pub iss: String,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
    /// Unique token ID (UUID string).
    pub jti: String,
}

/// Issue a signed HS256 bearer for the given user.
pub fn issue_bearer(user_id: Uuid, email: &str, config: &AuthConfig) -> Result<String, AuthError> {
    let now = Utc::now().timestamp();
    let claims = BearerClaims {
        sub: user_id.to_string(),
        email: email.to_string(),
        iss: config.issuer.clone(),
        iat: now,
        exp: now + config.token_lifetime_secs as i64,
        jti: Uuid::new_v4().to_string(),
    };

    let key = EncodingKey::from_secret(config.signing_key.as_bytes());
    jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &key)
        .map_err(|e| AuthError::Crypto(format!("JWT encode: {e}")))
}

/// Decode and verify a bearer (signature, expiry, issuer).
pub fn decode_bearer(token: &str, config: &AuthConfig) -> Result<BearerClaims, AuthError> {
    let key = DecodingKey::from_secret(config.signing_key.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&config.issuer]);
    validation.set_required_spec_claims(&["sub", "exp", "iat", "iss"]);

    jsonwebtoken::decode::<BearerClaims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::TokenInvalid(e.to_string()),
        })
}

/// Verified claims — a newtype proving the token passed validation.
///
/// Purely stateless: no database lookup is performed. This is what
/// the request-auth middleware hands to handlers.
#[derive(Debug, Clone)]
pub struct ValidatedBearer(pub BearerClaims);

pub fn validate_bearer(token: &str, config: &AuthConfig) -> Result<ValidatedBearer, AuthError> {
    decode_bearer(token, config).map(ValidatedBearer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AuthConfig {
        AuthConfig {
            signing_key: "test-signing-key-not-for-production".into(),
            ..AuthConfig::default()
        }
    }

    #[test]
    fn bearer_roundtrip() {
        let config = test_config();
        let user_id = Uuid::new_v4();

        let token = issue_bearer(user_id, "a@example.com", &config).unwrap();
        let claims = decode_bearer(&token, &config).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email, "a@example.com");
        assert_eq!(claims.iss, "mirage");
        // 7-day lifetime.
        assert_eq!(claims.exp - claims.iat, 604_800);
    }

    #[test]
    fn jti_is_unique() {
        let config = test_config();
        let uid = Uuid::new_v4();
        let c1 = decode_bearer(&issue_bearer(uid, "a@x", &config).unwrap(), &config).unwrap();
        let c2 = decode_bearer(&issue_bearer(uid, "a@x", &config).unwrap(), &config).unwrap();
        assert_ne!(c1.jti, c2.jti);
    }

    #[test]
    fn wrong_key_is_rejected() {
        let config = test_config();
        let other = AuthConfig {
            signing_key: "a-different-key-entirely".into(),
            ..AuthConfig::default()
        };
        let token = issue_bearer(Uuid::new_v4(), "a@x", &config).unwrap();
        assert!(matches!(
            decode_bearer(&token, &other),
            Err(AuthError::TokenInvalid(_))
        ));
    }

    #[test]
    fn expired_bearer_is_rejected() {
        let config = test_config();
        // Hand-craft a token that expired well past any leeway.
        let now = Utc::now().timestamp();
        let claims = BearerClaims {
            sub: Uuid::new_v4().to_string(),
            email: "a@x".into(),
            iss: config.issuer.clone(),
            iat: now - 700_000,
            exp: now - 100_000,
            jti: Uuid::new_v4().to_string(),
        };
        let key = EncodingKey::from_secret(config.signing_key.as_bytes());
        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &key).unwrap();

        assert!(matches!(
            decode_bearer(&token, &config),
            Err(AuthError::TokenExpired)
        ));
    }
}
