//! Mirage classifier client — feature derivation plus a bounded,
//! retry-free RPC to the external attack classifier.

pub mod client;
pub mod features;

pub use client::{ClassifierClient, ClassifierError};
pub use features::{FeatureVector, contains_sql_sentinels, count_failure_tokens};
