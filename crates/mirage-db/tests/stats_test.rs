//! Integration tests for the dashboard statistics aggregation.

use chrono::{DateTime, TimeZone, Utc};
use mirage_core::models::alert::{AlertStatus, CreateAlert};
use mirage_core::models::event::AttackKind;
use mirage_core::models::node::{CreateNode, NodeStatus};
use mirage_core::repository::{AlertRepository, NodeRepository, StatsRepository};
use mirage_db::{SurrealAlertRepository, SurrealNodeRepository, SurrealStatsRepository};
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

fn alert_input(owner: Uuid, source: &str, risk: f64, secs: i64) -> CreateAlert {
    CreateAlert {
        timestamp: at(secs),
        source_ip: source.into(),
        service: "SSH".into(),
        activity: "login_attempt".into(),
        attack_kind: AttackKind::BruteForce,
        risk,
        confidence: 0.9,
        payload_digest: None,
        decoy: None,
        node_id: "nd_1".into(),
        user_id: owner,
    }
}

#[tokio::test]
async fn empty_dashboard_is_all_zero() {
    let stats = SurrealStatsRepository::new(setup().await);
    let dashboard = stats.dashboard(Uuid::new_v4(), 7.0).await.unwrap();

    assert_eq!(dashboard.total_attacks, 0);
    assert_eq!(dashboard.active_alerts, 0);
    assert_eq!(dashboard.unique_attackers, 0);
    assert_eq!(dashboard.avg_risk_score, 0.0);
    assert_eq!(dashboard.high_risk_count, 0);
    assert_eq!(dashboard.total_nodes, 0);
    assert_eq!(dashboard.active_nodes, 0);
    assert_eq!(dashboard.recent_risk_average, 0.0);
}

#[tokio::test]
async fn dashboard_aggregates_are_owner_scoped() {
    let db = setup().await;
    let owner = Uuid::new_v4();
    let other = Uuid::new_v4();

    let nodes = SurrealNodeRepository::new(db.clone());
    nodes
        .create(CreateNode {
            node_id: "nd_1".into(),
            user_id: owner,
            name: "probe".into(),
            api_key_hash: "h".into(),
        })
        .await
        .unwrap();
    nodes
        .create(CreateNode {
            node_id: "nd_2".into(),
            user_id: owner,
            name: "probe2".into(),
            api_key_hash: "h".into(),
        })
        .await
        .unwrap();
    nodes.update_status("nd_2", NodeStatus::Active).await.unwrap();
    nodes
        .create(CreateNode {
            node_id: "nd_other".into(),
            user_id: other,
            name: "foreign".into(),
            api_key_hash: "h".into(),
        })
        .await
        .unwrap();

    let alerts = SurrealAlertRepository::new(db.clone());
    alerts.create(alert_input(owner, "1.1.1.1", 9.0, 1)).await.unwrap();
    alerts.create(alert_input(owner, "1.1.1.1", 5.0, 2)).await.unwrap();
    let resolved = alerts.create(alert_input(owner, "2.2.2.2", 7.0, 3)).await.unwrap();
    alerts
        .update_status(resolved.id, AlertStatus::Resolved)
        .await
        .unwrap();
    alerts.create(alert_input(other, "3.3.3.3", 9.9, 4)).await.unwrap();

    let stats = SurrealStatsRepository::new(db);
    let dashboard = stats.dashboard(owner, 7.0).await.unwrap();

    assert_eq!(dashboard.total_nodes, 2);
    assert_eq!(dashboard.active_nodes, 1);
    assert_eq!(dashboard.total_attacks, 3);
    assert_eq!(dashboard.active_alerts, 2);
    assert_eq!(dashboard.unique_attackers, 2);
    // (9.0 + 5.0 + 7.0) / 3 = 7.0
    assert_eq!(dashboard.avg_risk_score, 7.0);
    assert_eq!(dashboard.high_risk_count, 2);
    assert_eq!(dashboard.recent_risk_average, 7.0);
}

#[tokio::test]
async fn recent_average_uses_the_ten_newest() {
    let db = setup().await;
    let owner = Uuid::new_v4();
    let alerts = SurrealAlertRepository::new(db.clone());

    // Two old low-risk alerts followed by ten recent 8.0s: the
    // recent window must exclude the old ones.
    alerts.create(alert_input(owner, "1.1.1.1", 1.0, 0)).await.unwrap();
    alerts.create(alert_input(owner, "1.1.1.1", 1.0, 1)).await.unwrap();
    for i in 0..10 {
        alerts
            .create(alert_input(owner, "1.1.1.1", 8.0, 100 + i))
            .await
            .unwrap();
    }

    let stats = SurrealStatsRepository::new(db);
    let dashboard = stats.dashboard(owner, 7.0).await.unwrap();
    assert_eq!(dashboard.recent_risk_average, 8.0);
    assert_eq!(dashboard.total_attacks, 12);
}
