//! Integration tests for the Alert repository using in-memory
//! SurrealDB.

use chrono::{DateTime, TimeZone, Utc};
use mirage_core::error::MirageError;
use mirage_core::models::alert::{AlertStatus, CreateAlert};
use mirage_core::models::event::{AttackKind, Severity};
use mirage_core::repository::{AlertFilter, AlertRepository};
use mirage_db::SurrealAlertRepository;
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    mirage_db::run_migrations(&db).await.unwrap();
    db
}

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_770_000_000 + secs, 0).unwrap()
}

fn alert_input(owner: Uuid, risk: f64, secs: i64) -> CreateAlert {
    CreateAlert {
        timestamp: at(secs),
        source_ip: "1.2.3.4".into(),
        service: "SSH".into(),
        activity: "login_attempt".into(),
        attack_kind: AttackKind::BruteForce,
        risk,
        confidence: 0.9,
        payload_digest: Some("ab".repeat(32)),
        decoy: None,
        node_id: "nd_1".into(),
        user_id: owner,
    }
}

#[tokio::test]
async fn create_seeds_open_status_and_owner() {
    let repo = SurrealAlertRepository::new(setup().await);
    let owner = Uuid::new_v4();

    let alert = repo.create(alert_input(owner, 8.0, 0)).await.unwrap();
    assert_eq!(alert.status, AlertStatus::Open);
    assert_eq!(alert.user_id, owner);
    assert_eq!(alert.severity(), Severity::High);

    let fetched = repo.get(alert.id).await.unwrap();
    assert_eq!(fetched.id, alert.id);
    assert_eq!(fetched.risk, 8.0);
}

#[tokio::test]
async fn listing_is_owner_scoped_and_descending() {
    let repo = SurrealAlertRepository::new(setup().await);
    let owner = Uuid::new_v4();
    let other = Uuid::new_v4();

    repo.create(alert_input(owner, 7.0, 10)).await.unwrap();
    repo.create(alert_input(owner, 9.5, 30)).await.unwrap();
    repo.create(alert_input(other, 9.9, 20)).await.unwrap();

    let alerts = repo
        .list_by_owner(owner, &AlertFilter::default())
        .await
        .unwrap();
    assert_eq!(alerts.len(), 2);
    assert!(alerts.iter().all(|a| a.user_id == owner));
    assert!(alerts[0].timestamp >= alerts[1].timestamp);
}

#[tokio::test]
async fn severity_and_status_filters_compose() {
    let repo = SurrealAlertRepository::new(setup().await);
    let owner = Uuid::new_v4();

    repo.create(alert_input(owner, 9.5, 1)).await.unwrap();
    let mid = repo.create(alert_input(owner, 7.5, 2)).await.unwrap();
    repo.update_status(mid.id, AlertStatus::Resolved).await.unwrap();

    let critical = repo
        .list_by_owner(
            owner,
            &AlertFilter {
                severity: Some(Severity::Critical),
                ..AlertFilter::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(critical.len(), 1);
    assert_eq!(critical[0].risk, 9.5);

    let resolved = repo
        .list_by_owner(
            owner,
            &AlertFilter {
                status: Some(AlertStatus::Resolved),
                ..AlertFilter::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].id, mid.id);
}

#[tokio::test]
async fn status_transitions_persist() {
    let repo = SurrealAlertRepository::new(setup().await);
    let owner = Uuid::new_v4();
    let alert = repo.create(alert_input(owner, 8.0, 0)).await.unwrap();

    let investigating = repo
        .update_status(alert.id, AlertStatus::Investigating)
        .await
        .unwrap();
    assert_eq!(investigating.status, AlertStatus::Investigating);

    let resolved = repo
        .update_status(alert.id, AlertStatus::Resolved)
        .await
        .unwrap();
    assert_eq!(resolved.status, AlertStatus::Resolved);

    assert!(matches!(
        repo.update_status(Uuid::new_v4(), AlertStatus::Open).await,
        Err(MirageError::NotFound { .. })
    ));
}

#[tokio::test]
async fn limit_is_honoured() {
    let repo = SurrealAlertRepository::new(setup().await);
    let owner = Uuid::new_v4();
    for i in 0..5 {
        repo.create(alert_input(owner, 8.0, i)).await.unwrap();
    }

    let alerts = repo
        .list_by_owner(
            owner,
            &AlertFilter {
                limit: Some(3),
                ..AlertFilter::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(alerts.len(), 3);
}
