//! Mirage identity & credential service.
//!
//! Two authentication schemes live here: 7-day HS256 bearers for
//! dashboard users, and per-node secret credentials for agent
//! ingestion. Secrets are stored only as verifiers and compared in
//! constant time.

pub mod config;
pub mod error;
pub mod node_key;
pub mod password;
pub mod service;
pub mod token;

pub use config::{AuthConfig, AuthMode, DEMO_USER_EMAIL, DEMO_USER_ID};
pub use error::AuthError;
pub use node_key::{IssuedNodeKey, generate_node_id, hash_node_key, mint_node_key, verify_node_key};
pub use service::{AuthOutput, IdentityService};
pub use token::{BearerClaims, ValidatedBearer};
