//! The ingestion pipeline shared by both agent-facing entry points.
//!
//! Commit semantics: the raw-event append is the primary write; its
//! failure fails the call with `StorageUnavailable`. Every step after
//! it is best-effort: failures are logged and absorbed, because the
//! raw event is already durable and the derived state (decoys,
//! alerts, profiles, last-seen) is re-derivable from it.

use chrono::Utc;
use mirage_classifier::FeatureVector;
use mirage_core::error::{MirageError, MirageResult};
use mirage_core::models::alert::{CreateAlert, payload_digest};
use mirage_core::models::decoy::DecoyTrigger;
use mirage_core::models::event::{
    AgentEventInput, AgentEventRecord, Classification, HoneypotLogInput, HoneypotLogRecord,
};
use mirage_core::models::node::Node;
use mirage_core::models::profile::ProfileUpdate;
use mirage_core::repository::{AlertRepository, DecoyRepository, EventRepository, NodeRepository};
use serde::Serialize;
use uuid::Uuid;

use crate::state::AppState;

/// Service label attached to agent-originated events.
const AGENT_SERVICE: &str = "endpoint_agent";

/// What the agent gets back from a successful ingest.
#[derive(Debug, Serialize)]
pub struct IngestOutcome {
    pub status: &'static str,
    pub event_id: Uuid,
    pub classification: Classification,
    pub alert_created: bool,
}

fn absorb<T>(step: &'static str, result: MirageResult<T>) {
    if let Err(e) = result {
        tracing::warn!(error = %e, step, "pipeline step failed after durable raw write");
    }
}

/// Ingest one honeypot log for an authenticated node.
pub async fn ingest_honeypot_log(
    state: &AppState,
    node: &Node,
    input: HoneypotLogInput,
) -> MirageResult<IngestOutcome> {
    input.validate()?;

    // Classify. Degradation is absorbed inside the client.
    let features = FeatureVector::from_honeypot(&input);
    let classification = state.classifier.classify(features).await;
    tracing::info!(
        node_id = %node.node_id,
        source_ip = %input.source_ip,
        attack_kind = %classification.attack_kind,
        risk = classification.risk,
        "honeypot log classified"
    );

    // Primary write: the raw event.
    let record = HoneypotLogRecord {
        id: Uuid::new_v4(),
        node_id: node.node_id.clone(),
        service: input.service.clone(),
        source_ip: input.source_ip.clone(),
        activity: input.activity.clone(),
        payload: input.payload.clone(),
        extra: input.extra.clone(),
        timestamp: input.timestamp,
        received_at: Utc::now(),
        classification: classification.clone(),
    };
    let event_id = record.id;
    state
        .events
        .append_honeypot(record)
        .await
        .map_err(|e| MirageError::StorageUnavailable(e.to_string()))?;

    // Alert materialisation.
    let alert_created = classification.risk >= state.alert_risk_threshold;
    if alert_created {
        absorb(
            "alert",
            state
                .alerts
                .create(CreateAlert {
                    timestamp: input.timestamp,
                    source_ip: input.source_ip.clone(),
                    service: input.service.clone(),
                    activity: input.activity.clone(),
                    attack_kind: classification.attack_kind,
                    risk: classification.risk,
                    confidence: classification.confidence,
                    payload_digest: Some(payload_digest(&input.payload)),
                    decoy: None,
                    node_id: node.node_id.clone(),
                    user_id: node.user_id,
                })
                .await,
        );
    }

    // Below-threshold events still count towards targeting
    // statistics.
    absorb(
        "profile",
        state
            .aggregator
            .record(ProfileUpdate {
                source_ip: input.source_ip.clone(),
                attack_kind: classification.attack_kind,
                risk: classification.risk,
                service: input.service.clone(),
                timestamp: input.timestamp,
            })
            .await
            .map(|_| ()),
    );

    // Node housekeeping.
    absorb(
        "last_seen",
        state.nodes.bump_last_seen(&node.node_id, Utc::now()).await,
    );

    Ok(IngestOutcome {
        status: "success",
        event_id,
        classification,
        alert_created,
    })
}

/// Ingest one agent honeytoken event for an authenticated node.
pub async fn ingest_agent_event(
    state: &AppState,
    node: &Node,
    input: AgentEventInput,
) -> MirageResult<IngestOutcome> {
    input.validate()?;

    let classification = state
        .classifier
        .classify(FeatureVector::honeytoken_indicator())
        .await;
    tracing::info!(
        node_id = %node.node_id,
        hostname = %input.hostname,
        file = %input.file_accessed,
        attack_kind = %classification.attack_kind,
        risk = classification.risk,
        "agent event classified"
    );

    // Primary write: the raw event.
    let record = AgentEventRecord {
        id: Uuid::new_v4(),
        node_id: node.node_id.clone(),
        hostname: input.hostname.clone(),
        username: input.username.clone(),
        file_accessed: input.file_accessed.clone(),
        file_path: input.file_path.clone(),
        action: input.action.clone(),
        severity: input.severity,
        alert_kind: input.alert_kind.clone(),
        timestamp: input.timestamp,
        received_at: Utc::now(),
        classification: classification.clone(),
    };
    let event_id = record.id;
    state
        .events
        .append_agent(record)
        .await
        .map_err(|e| MirageError::StorageUnavailable(e.to_string()))?;

    // Decoy bookkeeping: the referenced file is the decoy.
    absorb(
        "decoy",
        state
            .decoys
            .record_trigger(DecoyTrigger {
                node_id: node.node_id.clone(),
                name: input.file_accessed.clone(),
                path: Some(input.file_path.clone()),
                at: input.timestamp,
            })
            .await
            .map(|_| ()),
    );

    let alert_created = classification.risk >= state.alert_risk_threshold;
    if alert_created {
        absorb(
            "alert",
            state
                .alerts
                .create(CreateAlert {
                    timestamp: input.timestamp,
                    source_ip: input.hostname.clone(),
                    service: AGENT_SERVICE.into(),
                    activity: input.action.clone(),
                    attack_kind: classification.attack_kind,
                    risk: classification.risk,
                    confidence: classification.confidence,
                    payload_digest: None,
                    decoy: Some(input.file_accessed.clone()),
                    node_id: node.node_id.clone(),
                    user_id: node.user_id,
                })
                .await,
        );
    }

    absorb(
        "profile",
        state
            .aggregator
            .record(ProfileUpdate {
                source_ip: input.hostname.clone(),
                attack_kind: classification.attack_kind,
                risk: classification.risk,
                service: AGENT_SERVICE.into(),
                timestamp: input.timestamp,
            })
            .await
            .map(|_| ()),
    );

    absorb(
        "last_seen",
        state.nodes.bump_last_seen(&node.node_id, Utc::now()).await,
    );

    Ok(IngestOutcome {
        status: "success",
        event_id,
        classification,
        alert_created,
    })
}
