//! End-to-end API tests: the full router over in-memory SurrealDB,
//! with a stub classifier behind a real socket.

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::routing::post;
use axum::{Json, Router};
use mirage_auth::AuthMode;
use mirage_db::{DbConfig, DbManager};
use mirage_server::{AppState, ServerConfig, build_router};
use serde_json::{Value, json};
use tower::ServiceExt;

/// Stub classifier: scores honeytoken access as high-risk
/// exfiltration, everything else as low-risk brute force. The
/// `session_time` feature doubles as a risk dial for boundary tests
/// (69 -> 6.9, 70 -> 7.0).
async fn spawn_stub_classifier() -> String {
    async fn predict(Json(features): Json<Value>) -> Json<Value> {
        let honeytoken = features["honeytoken_access"].as_f64().unwrap_or(0.0);
        let session = features["session_time"].as_f64().unwrap_or(0.0);
        let body = if honeytoken >= 1.0 {
            json!({
                "attack_type": "DataExfil",
                "risk_score": 9.0,
                "confidence": 0.92,
                "is_anomaly": true
            })
        } else if session == 69.0 || session == 70.0 {
            json!({
                "attack_type": "BruteForce",
                "risk_score": session / 10.0,
                "confidence": 0.8,
                "is_anomaly": false
            })
        } else {
            json!({
                "attack_type": "BruteForce",
                "risk_score": 3.0,
                "confidence": 0.6,
                "is_anomaly": false
            })
        };
        Json(body)
    }

    let app = Router::new().route("/predict", post(predict));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// A listener that accepts connections and never answers, to exercise
/// the classifier deadline.
async fn spawn_black_hole() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        loop {
            if let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        }
    });
    format!("http://{addr}")
}

async fn test_app(classifier_url: &str) -> Router {
    let db = DbManager::connect(&DbConfig::default()).await.unwrap();
    mirage_db::run_migrations(db.client()).await.unwrap();

    let config = ServerConfig {
        storage_uri: "mem://".into(),
        storage_username: None,
        storage_password: None,
        classifier_url: classifier_url.into(),
        auth_mode: AuthMode::Enforced,
        token_signing_key: "test-signing-key-not-for-production".into(),
        alert_risk_threshold: 7.0,
        listen_addr: "127.0.0.1:0".into(),
        public_base_url: "http://127.0.0.1:8001".into(),
    };
    let state = AppState::new(&db, &config).unwrap();
    build_router(state)
}

fn request(
    method: &str,
    uri: &str,
    body: Option<Value>,
    bearer: Option<&str>,
    node: Option<(&str, &str)>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
    }
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    if let Some((node_id, node_key)) = node {
        builder = builder
            .header("X-Node-Id", node_id)
            .header("X-Node-Key", node_key);
    }
    let body = match body {
        Some(value) => Body::from(value.to_string()),
        None => Body::empty(),
    };
    builder.body(body).unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

/// Register a user, returning (bearer, user_id).
async fn register(app: &Router, email: &str) -> (String, String) {
    let (status, body) = send(
        app,
        request(
            "POST",
            "/auth/register",
            Some(json!({"email": email, "password": "P@ss1234"})),
            None,
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    (
        body["access_token"].as_str().unwrap().to_string(),
        body["user"]["id"].as_str().unwrap().to_string(),
    )
}

/// Create a node, returning (node_id, node_api_key).
async fn create_node(app: &Router, bearer: &str, name: &str) -> (String, String) {
    let (status, body) = send(
        app,
        request(
            "POST",
            "/nodes",
            Some(json!({"name": name})),
            Some(bearer),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    (
        body["node_id"].as_str().unwrap().to_string(),
        body["node_api_key"].as_str().unwrap().to_string(),
    )
}

fn honeypot_body() -> Value {
    json!({
        "service": "SSH",
        "source_ip": "1.2.3.4",
        "activity": "login_attempt",
        "payload": "user=root pass=wrong",
        "timestamp": "2026-02-04T10:00:00Z"
    })
}

fn agent_body() -> Value {
    json!({
        "timestamp": "2026-02-04T10:05:00Z",
        "hostname": "web-01",
        "username": "svc",
        "file_accessed": "aws_keys.txt",
        "file_path": "/srv/decoys/aws_keys.txt",
        "action": "ACCESSED",
        "severity": "CRITICAL",
        "alert_type": "honeytoken_access"
    })
}

#[tokio::test]
async fn register_and_create_node() {
    let classifier = spawn_stub_classifier().await;
    let app = test_app(&classifier).await;

    let (bearer, _user_id) = register(&app, "e@x").await;
    let (node_id, node_api_key) = create_node(&app, &bearer, "n1").await;

    assert!(!node_id.is_empty());
    assert!(node_api_key.starts_with("nk_"));

    let (status, nodes) = send(&app, request("GET", "/nodes", None, Some(&bearer), None)).await;
    assert_eq!(status, StatusCode::OK);
    let nodes = nodes.as_array().unwrap();
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0]["name"], "n1");
    assert_eq!(nodes[0]["status"], "unknown");
    // The credential appears only in the create response.
    assert!(nodes[0].get("node_api_key").is_none());
    assert!(nodes[0].get("api_key_hash").is_none());
}

#[tokio::test]
async fn missing_bearer_is_unauthorized() {
    let classifier = spawn_stub_classifier().await;
    let app = test_app(&classifier).await;

    let (status, body) = send(&app, request("GET", "/nodes", None, None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthenticated");
}

#[tokio::test]
async fn ingest_honeypot_log_below_threshold() {
    let classifier = spawn_stub_classifier().await;
    let app = test_app(&classifier).await;
    let (bearer, _) = register(&app, "e@x").await;
    let (node_id, key) = create_node(&app, &bearer, "n1").await;

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/honeypot-log",
            Some(honeypot_body()),
            None,
            Some((&node_id, &key)),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["alert_created"], false);
    assert_eq!(body["classification"]["attack_kind"], "BruteForce");

    // One raw event, zero alerts.
    let (_, logs) = send(&app, request("GET", "/logs", None, Some(&bearer), None)).await;
    assert_eq!(logs.as_array().unwrap().len(), 1);
    let (_, alerts) = send(&app, request("GET", "/alerts", None, Some(&bearer), None)).await;
    assert!(alerts.as_array().unwrap().is_empty());

    // Profile for the source identifier.
    let (status, profile) = send(
        &app,
        request("GET", "/attacker-profile/1.2.3.4", None, Some(&bearer), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["total_attacks"], 1);
    assert_eq!(profile["average_risk"], 3.0);
    assert_eq!(profile["services_targeted"], json!(["SSH"]));
}

#[tokio::test]
async fn ingest_agent_event_above_threshold() {
    let classifier = spawn_stub_classifier().await;
    let app = test_app(&classifier).await;
    let (bearer, user_id) = register(&app, "e@x").await;
    let (node_id, key) = create_node(&app, &bearer, "n1").await;

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/agent-alert",
            Some(agent_body()),
            None,
            Some((&node_id, &key)),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["alert_created"], true);
    assert_eq!(body["classification"]["attack_kind"], "DataExfil");

    // One raw agent event.
    let (_, logs) = send(&app, request("GET", "/logs", None, Some(&bearer), None)).await;
    assert_eq!(logs.as_array().unwrap().len(), 1);
    assert_eq!(logs[0]["kind"], "agent");

    // One alert, denormalised to the registered user, critical risk.
    let (_, alerts) = send(&app, request("GET", "/alerts", None, Some(&bearer), None)).await;
    let alerts = alerts.as_array().unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0]["user_id"].as_str().unwrap(), user_id);
    assert_eq!(alerts[0]["risk"], 9.0);
    assert_eq!(alerts[0]["decoy"], "aws_keys.txt");
    assert_eq!(alerts[0]["status"], "open");

    // The referenced decoy now exists with one trigger.
    let (_, decoys) = send(&app, request("GET", "/decoys", None, Some(&bearer), None)).await;
    let decoys = decoys.as_array().unwrap();
    assert_eq!(decoys.len(), 1);
    assert_eq!(decoys[0]["name"], "aws_keys.txt");
    assert_eq!(decoys[0]["triggers"], 1);
    assert_eq!(decoys[0]["kind"], "honeytoken");

    // Honeytoken view sees it too.
    let (_, tokens) = send(
        &app,
        request("GET", "/honeytokens", None, Some(&bearer), None),
    )
    .await;
    assert_eq!(tokens.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn alert_threshold_boundary() {
    let classifier = spawn_stub_classifier().await;
    let app = test_app(&classifier).await;
    let (bearer, _) = register(&app, "e@x").await;
    let (node_id, key) = create_node(&app, &bearer, "n1").await;

    // session_time doubles as a risk dial in the stub: 69 -> 6.9.
    let mut below = honeypot_body();
    below["extra"] = json!({"session_time": "69"});
    let (_, body) = send(
        &app,
        request("POST", "/honeypot-log", Some(below), None, Some((&node_id, &key))),
    )
    .await;
    assert_eq!(body["alert_created"], false);

    let mut at = honeypot_body();
    at["extra"] = json!({"session_time": "70"});
    let (_, body) = send(
        &app,
        request("POST", "/honeypot-log", Some(at), None, Some((&node_id, &key))),
    )
    .await;
    assert_eq!(body["alert_created"], true);

    let (_, alerts) = send(&app, request("GET", "/alerts", None, Some(&bearer), None)).await;
    assert_eq!(alerts.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn cross_tenant_isolation() {
    let classifier = spawn_stub_classifier().await;
    let app = test_app(&classifier).await;

    let (bearer_a, _) = register(&app, "a@x").await;
    let (bearer_b, user_b) = register(&app, "b@x").await;
    let (node_b, key_b) = create_node(&app, &bearer_b, "n2").await;

    // B's agent event materialises an alert for B.
    send(
        &app,
        request(
            "POST",
            "/agent-alert",
            Some(agent_body()),
            None,
            Some((&node_b, &key_b)),
        ),
    )
    .await;

    // A cannot see B's node.
    let (status, _) = send(
        &app,
        request("GET", &format!("/nodes/{node_b}"), None, Some(&bearer_a), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // A's alert list contains nothing from B's node.
    let (_, alerts) = send(&app, request("GET", "/alerts", None, Some(&bearer_a), None)).await;
    assert!(alerts.as_array().unwrap().is_empty());

    // A cannot read B's node-scoped logs, decoys, or stats rows.
    let (status, _) = send(
        &app,
        request(
            "GET",
            &format!("/logs/node/{node_b}"),
            None,
            Some(&bearer_a),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // B still sees their own alert.
    let (_, alerts) = send(&app, request("GET", "/alerts", None, Some(&bearer_b), None)).await;
    let alerts = alerts.as_array().unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0]["user_id"].as_str().unwrap(), user_b);
}

#[tokio::test]
async fn classifier_timeout_falls_back_within_deadline() {
    let black_hole = spawn_black_hole().await;
    let app = test_app(&black_hole).await;
    let (bearer, _) = register(&app, "e@x").await;
    let (node_id, key) = create_node(&app, &bearer, "n1").await;

    let started = std::time::Instant::now();
    let (status, body) = send(
        &app,
        request(
            "POST",
            "/honeypot-log",
            Some(honeypot_body()),
            None,
            Some((&node_id, &key)),
        ),
    )
    .await;
    assert!(started.elapsed() < std::time::Duration::from_secs(4));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["classification"]["attack_kind"], "unknown");
    assert_eq!(body["classification"]["risk"], 0.0);
    assert_eq!(body["alert_created"], false);

    // Raw event persisted, no alert, profile updated with unknown/0.
    let (_, logs) = send(&app, request("GET", "/logs", None, Some(&bearer), None)).await;
    assert_eq!(logs.as_array().unwrap().len(), 1);
    let (_, alerts) = send(&app, request("GET", "/alerts", None, Some(&bearer), None)).await;
    assert!(alerts.as_array().unwrap().is_empty());
    let (_, profile) = send(
        &app,
        request("GET", "/attacker-profile/1.2.3.4", None, Some(&bearer), None),
    )
    .await;
    assert_eq!(profile["most_common_attack"], "unknown");
    assert_eq!(profile["average_risk"], 0.0);
}

#[tokio::test]
async fn dashboard_stats_are_consistent() {
    let classifier = spawn_stub_classifier().await;
    let app = test_app(&classifier).await;
    let (bearer, _) = register(&app, "e@x").await;
    let (node_id, key) = create_node(&app, &bearer, "n1").await;

    // One below-threshold honeypot log and one critical agent event.
    send(
        &app,
        request(
            "POST",
            "/honeypot-log",
            Some(honeypot_body()),
            None,
            Some((&node_id, &key)),
        ),
    )
    .await;
    send(
        &app,
        request(
            "POST",
            "/agent-alert",
            Some(agent_body()),
            None,
            Some((&node_id, &key)),
        ),
    )
    .await;

    let (status, stats) = send(&app, request("GET", "/stats", None, Some(&bearer), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total_attacks"], 1);
    assert_eq!(stats["active_alerts"], 1);
    assert_eq!(stats["unique_attackers"], 1);
    assert_eq!(stats["avg_risk_score"], 9.0);
    assert_eq!(stats["high_risk_count"], 1);
    assert_eq!(stats["total_nodes"], 1);
    // No registration yet: the node is still `unknown`.
    assert_eq!(stats["active_nodes"], 0);
    assert_eq!(stats["recent_risk_average"], 9.0);

    // After registration the node counts as active.
    let (status, _) = send(
        &app,
        request(
            "POST",
            "/agent/register",
            Some(json!({
                "node_id": node_id,
                "node_api_key": key,
                "hostname": "web-01",
                "os": "linux"
            })),
            None,
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (_, stats) = send(&app, request("GET", "/stats", None, Some(&bearer), None)).await;
    assert_eq!(stats["active_nodes"], 1);
}

#[tokio::test]
async fn agent_register_is_idempotent_and_heartbeat_bumps() {
    let classifier = spawn_stub_classifier().await;
    let app = test_app(&classifier).await;
    let (bearer, _) = register(&app, "e@x").await;
    let (node_id, key) = create_node(&app, &bearer, "n1").await;

    let register_body = json!({
        "node_id": node_id,
        "node_api_key": key,
        "hostname": "web-01",
        "os": "linux"
    });
    let (status, _) = send(
        &app,
        request("POST", "/agent/register", Some(register_body.clone()), None, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(
        &app,
        request("POST", "/agent/register", Some(register_body), None, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, nodes) = send(&app, request("GET", "/nodes", None, Some(&bearer), None)).await;
    let nodes = nodes.as_array().unwrap();
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0]["status"], "active");
    assert_eq!(nodes[0]["hostname"], "web-01");
    assert!(!nodes[0]["last_seen"].is_null());

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/agent/heartbeat",
            Some(json!({"node_id": node_id, "node_api_key": key})),
            None,
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn node_credential_failures() {
    let classifier = spawn_stub_classifier().await;
    let app = test_app(&classifier).await;
    let (bearer, _) = register(&app, "e@x").await;
    let (node_id, key) = create_node(&app, &bearer, "n1").await;

    // Wrong key.
    let (status, _) = send(
        &app,
        request(
            "POST",
            "/honeypot-log",
            Some(honeypot_body()),
            None,
            Some((&node_id, "nk_wrong")),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Unknown node.
    let (status, _) = send(
        &app,
        request(
            "POST",
            "/honeypot-log",
            Some(honeypot_body()),
            None,
            Some(("nd_ghost", &key)),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Inactive node.
    let (status, _) = send(
        &app,
        request(
            "PATCH",
            &format!("/nodes/{node_id}"),
            Some(json!({"status": "inactive"})),
            Some(&bearer),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(
        &app,
        request(
            "POST",
            "/honeypot-log",
            Some(honeypot_body()),
            None,
            Some((&node_id, &key)),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "node_inactive");
}

#[tokio::test]
async fn payload_limit_boundary() {
    let classifier = spawn_stub_classifier().await;
    let app = test_app(&classifier).await;
    let (bearer, _) = register(&app, "e@x").await;
    let (node_id, key) = create_node(&app, &bearer, "n1").await;

    let mut at_limit = honeypot_body();
    at_limit["payload"] = json!("x".repeat(10 * 1024));
    let (status, _) = send(
        &app,
        request("POST", "/honeypot-log", Some(at_limit), None, Some((&node_id, &key))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let mut over_limit = honeypot_body();
    over_limit["payload"] = json!("x".repeat(10 * 1024 + 1));
    let (status, body) = send(
        &app,
        request("POST", "/honeypot-log", Some(over_limit), None, Some((&node_id, &key))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_input");
}

#[tokio::test]
async fn unknown_severity_filter_is_invalid_input() {
    let classifier = spawn_stub_classifier().await;
    let app = test_app(&classifier).await;
    let (bearer, _) = register(&app, "e@x").await;

    let (status, _) = send(
        &app,
        request("GET", "/logs?severity=extreme", None, Some(&bearer), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_email_conflicts() {
    let classifier = spawn_stub_classifier().await;
    let app = test_app(&classifier).await;

    register(&app, "e@x").await;
    let (status, body) = send(
        &app,
        request(
            "POST",
            "/auth/register",
            Some(json!({"email": "e@x", "password": "P@ss1234"})),
            None,
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn agent_download_rotates_the_credential() {
    let classifier = spawn_stub_classifier().await;
    let app = test_app(&classifier).await;
    let (bearer, _) = register(&app, "e@x").await;
    let (node_id, old_key) = create_node(&app, &bearer, "n1").await;

    let response = app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/nodes/{node_id}/agent-download"),
            None,
            Some(&bearer),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE].to_str().unwrap(),
        "application/zip"
    );
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains(&format!("agent-{node_id}.zip")));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..4], b"PK\x03\x04");

    // The bundle's key works; the originally issued one no longer
    // does.
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes.to_vec())).unwrap();
    let mut config = String::new();
    std::io::Read::read_to_string(&mut archive.by_name("config.json").unwrap(), &mut config)
        .unwrap();
    let config: Value = serde_json::from_str(&config).unwrap();
    let new_key = config["node_api_key"].as_str().unwrap();
    assert!(new_key.starts_with("nk_"));
    assert_ne!(new_key, old_key);

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/honeypot-log",
            Some(honeypot_body()),
            None,
            Some((&node_id, &old_key)),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/honeypot-log",
            Some(honeypot_body()),
            None,
            Some((&node_id, new_key)),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn deleted_node_disappears_with_its_decoys() {
    let classifier = spawn_stub_classifier().await;
    let app = test_app(&classifier).await;
    let (bearer, _) = register(&app, "e@x").await;
    let (node_id, key) = create_node(&app, &bearer, "n1").await;

    send(
        &app,
        request(
            "POST",
            "/agent-alert",
            Some(agent_body()),
            None,
            Some((&node_id, &key)),
        ),
    )
    .await;

    let (status, _) = send(
        &app,
        request(
            "DELETE",
            &format!("/nodes/{node_id}"),
            None,
            Some(&bearer),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, nodes) = send(&app, request("GET", "/nodes", None, Some(&bearer), None)).await;
    assert!(nodes.as_array().unwrap().is_empty());
    let (_, decoys) = send(&app, request("GET", "/decoys", None, Some(&bearer), None)).await;
    assert!(decoys.as_array().unwrap().is_empty());
    // Node-scoped queries now refuse the id outright.
    let (status, _) = send(
        &app,
        request(
            "GET",
            &format!("/logs/node/{node_id}"),
            None,
            Some(&bearer),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn alert_status_lifecycle() {
    let classifier = spawn_stub_classifier().await;
    let app = test_app(&classifier).await;
    let (bearer, _) = register(&app, "e@x").await;
    let (node_id, key) = create_node(&app, &bearer, "n1").await;

    send(
        &app,
        request(
            "POST",
            "/agent-alert",
            Some(agent_body()),
            None,
            Some((&node_id, &key)),
        ),
    )
    .await;
    let (_, alerts) = send(&app, request("GET", "/alerts", None, Some(&bearer), None)).await;
    let alert_id = alerts[0]["id"].as_str().unwrap().to_string();

    let (status, updated) = send(
        &app,
        request(
            "PATCH",
            &format!("/alerts/{alert_id}"),
            Some(json!({"status": "resolved"})),
            Some(&bearer),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "resolved");

    // Another tenant cannot touch it.
    let (bearer_b, _) = register(&app, "b@x").await;
    let (status, _) = send(
        &app,
        request(
            "PATCH",
            &format!("/alerts/{alert_id}"),
            Some(json!({"status": "open"})),
            Some(&bearer_b),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Resolved alerts drop out of the active filter.
    let (_, open) = send(
        &app,
        request("GET", "/alerts?status=open", None, Some(&bearer), None),
    )
    .await;
    assert!(open.as_array().unwrap().is_empty());
}
