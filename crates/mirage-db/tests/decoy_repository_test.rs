//! Integration tests for the Decoy repository using in-memory
//! SurrealDB.

use chrono::Utc;
use mirage_core::error::MirageError;
use mirage_core::models::decoy::{DecoyKind, DecoyStatus, DecoyTrigger};
use mirage_core::repository::DecoyRepository;
use mirage_db::SurrealDecoyRepository;
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    mirage_db::run_migrations(&db).await.unwrap();
    db
}

fn trigger(node_id: &str, name: &str) -> DecoyTrigger {
    DecoyTrigger {
        node_id: node_id.into(),
        name: name.into(),
        path: Some(format!("/opt/decoys/{name}")),
        at: Utc::now(),
    }
}

#[tokio::test]
async fn first_trigger_creates_decoy() {
    let repo = SurrealDecoyRepository::new(setup().await);

    let decoy = repo
        .record_trigger(trigger("nd_1", "aws_keys.txt"))
        .await
        .unwrap();
    assert_eq!(decoy.node_id, "nd_1");
    assert_eq!(decoy.name, "aws_keys.txt");
    assert_eq!(decoy.kind, DecoyKind::Honeytoken);
    assert_eq!(decoy.status, DecoyStatus::Active);
    assert_eq!(decoy.triggers, 1);
    assert!(decoy.last_triggered.is_some());
}

#[tokio::test]
async fn repeated_triggers_increment_instead_of_duplicating() {
    let repo = SurrealDecoyRepository::new(setup().await);

    repo.record_trigger(trigger("nd_1", "aws_keys.txt")).await.unwrap();
    repo.record_trigger(trigger("nd_1", "aws_keys.txt")).await.unwrap();
    let decoy = repo
        .record_trigger(trigger("nd_1", "aws_keys.txt"))
        .await
        .unwrap();

    assert_eq!(decoy.triggers, 3);
    let listed = repo.list_by_node("nd_1", None).await.unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn same_name_on_different_nodes_is_distinct() {
    let repo = SurrealDecoyRepository::new(setup().await);

    repo.record_trigger(trigger("nd_1", "passwords.db")).await.unwrap();
    repo.record_trigger(trigger("nd_2", "passwords.db")).await.unwrap();

    assert_eq!(repo.list_by_node("nd_1", None).await.unwrap().len(), 1);
    assert_eq!(repo.list_by_node("nd_2", None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn fleet_listing_filters_by_kind_and_caps() {
    let repo = SurrealDecoyRepository::new(setup().await);

    for i in 0..5 {
        repo.record_trigger(trigger("nd_1", &format!("tok_{i}.txt")))
            .await
            .unwrap();
    }

    let nodes = vec!["nd_1".to_string()];
    let all = repo
        .list_by_nodes(&nodes, Some(DecoyKind::Honeytoken), 50)
        .await
        .unwrap();
    assert_eq!(all.len(), 5);

    let capped = repo.list_by_nodes(&nodes, None, 2).await.unwrap();
    assert_eq!(capped.len(), 2);

    let none = repo
        .list_by_nodes(&nodes, Some(DecoyKind::Port), 50)
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn toggle_and_delete() {
    let repo = SurrealDecoyRepository::new(setup().await);

    let decoy = repo
        .record_trigger(trigger("nd_1", "ssh_key.pem"))
        .await
        .unwrap();

    let toggled = repo
        .update_status(decoy.id, DecoyStatus::Inactive)
        .await
        .unwrap();
    assert_eq!(toggled.status, DecoyStatus::Inactive);
    // Trigger bookkeeping is untouched by status flips.
    assert_eq!(toggled.triggers, 1);

    repo.delete(decoy.id).await.unwrap();
    assert!(matches!(
        repo.get(decoy.id).await,
        Err(MirageError::NotFound { .. })
    ));
}

#[tokio::test]
async fn node_cascade_removes_all_decoys() {
    let repo = SurrealDecoyRepository::new(setup().await);

    repo.record_trigger(trigger("nd_z", "a.txt")).await.unwrap();
    repo.record_trigger(trigger("nd_z", "b.txt")).await.unwrap();
    repo.record_trigger(trigger("nd_keep", "c.txt")).await.unwrap();

    repo.delete_by_node("nd_z").await.unwrap();
    assert!(repo.list_by_node("nd_z", None).await.unwrap().is_empty());
    assert_eq!(repo.list_by_node("nd_keep", None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn concurrent_triggers_serialise_on_one_row() {
    let repo = std::sync::Arc::new(SurrealDecoyRepository::new(setup().await));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let repo = repo.clone();
        handles.push(tokio::spawn(async move {
            repo.record_trigger(trigger("nd_race", "bait.txt")).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let listed = repo.list_by_node("nd_race", None).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].triggers, 8);
}
