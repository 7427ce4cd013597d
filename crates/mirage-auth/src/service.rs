//! Identity service — registration, login, bearer and node-credential
//! verification.

use chrono::Utc;
use mirage_core::error::{MirageError, MirageResult};
use mirage_core::models::node::{Node, NodeStatus};
use mirage_core::models::user::{CreateUser, User};
use mirage_core::repository::{NodeRepository, UserRepository};
use uuid::Uuid;

use crate::config::{AuthConfig, AuthMode, DEMO_USER_EMAIL, DEMO_USER_ID};
use crate::error::AuthError;
use crate::{password, token};

/// Successful register/login result.
#[derive(Debug)]
pub struct AuthOutput {
    pub access_token: String,
    pub expires_in: u64,
    pub user: User,
}

/// Identity service.
///
/// Generic over repository implementations so that the auth layer has
/// no dependency on the database crate.
pub struct IdentityService<U: UserRepository, N: NodeRepository> {
    users: U,
    nodes: N,
    config: AuthConfig,
}

impl<U: UserRepository, N: NodeRepository> IdentityService<U, N> {
    pub fn new(users: U, nodes: N, config: AuthConfig) -> Self {
        Self {
            users,
            nodes,
            config,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    fn demo_user(&self) -> User {
        User {
            id: DEMO_USER_ID,
            email: DEMO_USER_EMAIL.into(),
            password_hash: String::new(),
            created_at: Utc::now(),
        }
    }

    /// Register a new user and hand back a 7-day bearer.
    pub async fn register(&self, email: &str, raw_password: &str) -> MirageResult<AuthOutput> {
        if self.config.mode == AuthMode::Open {
            return Err(MirageError::invalid_input(
                "registration is disabled in open mode; use the demo principal",
            ));
        }

        let email = email.trim().to_lowercase();
        if !email.contains('@') {
            return Err(MirageError::invalid_input("invalid email address"));
        }
        if raw_password.len() < self.config.min_password_length {
            return Err(MirageError::invalid_input(format!(
                "password must be at least {} characters",
                self.config.min_password_length
            )));
        }

        match self.users.get_by_email(&email).await {
            Ok(_) => return Err(AuthError::EmailTaken.into()),
            Err(MirageError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        let password_hash = password::hash_password(raw_password, self.config.pepper.as_deref())?;
        let user = self
            .users
            .create(CreateUser {
                email: email.clone(),
                password_hash,
            })
            .await?;

        self.issue(user)
    }

    /// Authenticate by email and password; mints a fresh bearer.
    pub async fn login(&self, email: &str, raw_password: &str) -> MirageResult<AuthOutput> {
        if self.config.mode == AuthMode::Open {
            return self.issue(self.demo_user());
        }

        let email = email.trim().to_lowercase();
        let user = match self.users.get_by_email(&email).await {
            Ok(u) => u,
            Err(MirageError::NotFound { .. }) => return Err(AuthError::BadCredentials.into()),
            Err(e) => return Err(e),
        };

        let ok = password::verify_password(
            raw_password,
            &user.password_hash,
            self.config.pepper.as_deref(),
        )?;
        if !ok {
            return Err(AuthError::BadCredentials.into());
        }

        self.issue(user)
    }

    fn issue(&self, user: User) -> MirageResult<AuthOutput> {
        let access_token = token::issue_bearer(user.id, &user.email, &self.config)?;
        Ok(AuthOutput {
            access_token,
            expires_in: self.config.token_lifetime_secs,
            user,
        })
    }

    /// Resolve a bearer to its user identifier.
    pub fn verify_bearer(&self, raw_token: &str) -> MirageResult<Uuid> {
        if self.config.mode == AuthMode::Open {
            return Ok(DEMO_USER_ID);
        }

        let validated = token::validate_bearer(raw_token, &self.config)?;
        Uuid::parse_str(&validated.0.sub)
            .map_err(|_| MirageError::unauthenticated("malformed subject claim"))
    }

    /// Verify a node credential pair and return the node.
    ///
    /// In open mode the key comparison and the inactive check are
    /// skipped, but the node row must still exist so every persisted
    /// event keeps a valid node reference.
    pub async fn verify_node(&self, node_id: &str, presented_key: &str) -> MirageResult<Node> {
        let node = match self.nodes.get(node_id).await {
            Ok(n) => n,
            Err(MirageError::NotFound { .. }) => {
                return Err(MirageError::unauthenticated("unknown node"));
            }
            Err(e) => return Err(e),
        };

        if self.config.mode == AuthMode::Open {
            return Ok(node);
        }

        if !crate::node_key::verify_node_key(presented_key, &node.api_key_hash) {
            tracing::warn!(node_id = %node.node_id, "invalid node credential presented");
            return Err(MirageError::unauthenticated("invalid node credential"));
        }

        if node.status == NodeStatus::Inactive {
            return Err(MirageError::NodeInactive {
                node_id: node.node_id.clone(),
            });
        }

        Ok(node)
    }
}
