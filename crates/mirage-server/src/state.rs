//! Shared application state.
//!
//! Every component is an explicit value constructed at startup and
//! injected into handlers through axum state — no process-wide
//! singletons.

use std::sync::Arc;

use mirage_auth::{AuthConfig, IdentityService};
use mirage_classifier::{ClassifierClient, ClassifierError};
use mirage_db::{
    DbManager, ProfileAggregator, SurrealAlertRepository, SurrealDecoyRepository,
    SurrealEventRepository, SurrealNodeRepository, SurrealProfileRepository,
    SurrealStatsRepository, SurrealUserRepository,
};
use surrealdb::engine::any::Any;

use crate::config::ServerConfig;

pub type Identity = IdentityService<SurrealUserRepository<Any>, SurrealNodeRepository<Any>>;

#[derive(Clone)]
pub struct AppState {
    pub db: DbManager,
    pub identity: Arc<Identity>,
    pub nodes: SurrealNodeRepository<Any>,
    pub decoys: SurrealDecoyRepository<Any>,
    pub events: SurrealEventRepository<Any>,
    pub alerts: SurrealAlertRepository<Any>,
    pub profiles: SurrealProfileRepository<Any>,
    pub stats: SurrealStatsRepository<Any>,
    pub aggregator: Arc<ProfileAggregator<SurrealProfileRepository<Any>>>,
    pub classifier: ClassifierClient,
    /// Risk threshold Θ for alert materialisation.
    pub alert_risk_threshold: f64,
    /// URLs embedded into agent bundles.
    pub public_base_url: Arc<str>,
    pub classifier_url: Arc<str>,
}

impl AppState {
    pub fn new(db: &DbManager, config: &ServerConfig) -> Result<Self, ClassifierError> {
        let client = db.client().clone();

        let auth_config = AuthConfig {
            signing_key: config.token_signing_key.clone(),
            mode: config.auth_mode,
            ..AuthConfig::default()
        };
        let identity = IdentityService::new(
            SurrealUserRepository::new(client.clone()),
            SurrealNodeRepository::new(client.clone()),
            auth_config,
        );

        let profiles = SurrealProfileRepository::new(client.clone());

        Ok(Self {
            db: db.clone(),
            identity: Arc::new(identity),
            nodes: SurrealNodeRepository::new(client.clone()),
            decoys: SurrealDecoyRepository::new(client.clone()),
            events: SurrealEventRepository::new(client.clone()),
            alerts: SurrealAlertRepository::new(client.clone()),
            profiles: profiles.clone(),
            stats: SurrealStatsRepository::new(client),
            aggregator: Arc::new(ProfileAggregator::new(profiles)),
            classifier: ClassifierClient::new(&config.classifier_url)?,
            alert_risk_threshold: config.alert_risk_threshold,
            public_base_url: config.public_base_url.clone().into(),
            classifier_url: config.classifier_url.clone().into(),
        })
    }
}
