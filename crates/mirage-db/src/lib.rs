//! Mirage database — SurrealDB connection management and repository
//! implementations.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - Repository implementations for `mirage-core` traits
//! - The per-key profile aggregator ([`ProfileAggregator`])
//! - Error types ([`DbError`])

mod aggregator;
mod connection;
mod error;
pub mod repository;
mod schema;

pub use aggregator::ProfileAggregator;
pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use repository::{
    SurrealAlertRepository, SurrealDecoyRepository, SurrealEventRepository, SurrealNodeRepository,
    SurrealProfileRepository, SurrealStatsRepository, SurrealUserRepository,
};
pub use schema::{run_migrations, schema_v1};
