//! HTTP routes exercised end to end through the router, without a socket.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use knock_groups::{GroupDirectory, MembershipResolver, MemoryGroupStore};
use knock_nullables::NullPushGateway;
use knock_rpc::handlers::{GroupResponse, HealthResponse, InitiateKnockResponse, ReportAddressResponse};
use knock_rpc::{AppState, KnockMetrics, RpcServer};
use knock_session::{KnockConfig, KnockRegistry};
use knock_types::KnockKind;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Harness {
    router: Router,
    gateway: Arc<NullPushGateway>,
}

fn harness_with(directory: bool) -> Harness {
    let store = Arc::new(MemoryGroupStore::new());
    let gateway = Arc::new(NullPushGateway::new());
    let registry = KnockRegistry::new(
        MembershipResolver::new(store.clone()),
        gateway.clone(),
        KnockConfig::default(),
    );
    let state = AppState {
        registry,
        directory: directory.then(|| store as Arc<dyn GroupDirectory>),
        metrics: Arc::new(KnockMetrics::new().expect("metrics")),
        trust_forwarded_for: true,
    };
    Harness {
        router: RpcServer::new(state).router(),
        gateway,
    }
}

fn harness() -> Harness {
    harness_with(true)
}

async fn call(router: &Router, method: &str, uri: &str, ip: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-forwarded-for", ip);
    let body = match body {
        Some(v) => {
            builder = builder.header("content-type", "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let response = router
        .clone()
        .oneshot(builder.body(body).expect("request"))
        .await
        .expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    (status, bytes.to_vec())
}

fn parse<T: DeserializeOwned>(bytes: &[u8]) -> T {
    serde_json::from_slice(bytes).expect("json body")
}

async fn household(h: &Harness) -> String {
    let (status, body) = call(
        &h.router,
        "POST",
        "/groups",
        "1.2.3.4",
        Some(json!({"member_id": "A", "push_token": "push-A", "name": "home"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let code = parse::<GroupResponse>(&body).group_code.to_string();

    for m in ["B", "C"] {
        let (status, _) = call(
            &h.router,
            "POST",
            &format!("/groups/{}/members", code.to_lowercase()),
            "1.2.3.4",
            Some(json!({"member_id": m, "push_token": format!("push-{m}")})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
    code
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn full_knock_over_http() {
    let h = harness();
    let code = household(&h).await;

    let (status, body) = call(
        &h.router,
        "POST",
        "/knocks",
        "1.2.3.4",
        Some(json!({"member_id": "A", "group_code": code})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let knock: InitiateKnockResponse = parse(&body);
    assert_eq!(knock.notified, 2);
    assert_eq!(knock.failed, 0);
    assert!(knock.warning.is_none());

    let report_uri = format!("/knocks/{}/report", knock.knock_id);
    let (status, body) = call(&h.router, "POST", &report_uri, "::ffff:1.2.3.4", Some(json!({"member_id": "B"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(parse::<ReportAddressResponse>(&body).matched);

    let (_, body) = call(&h.router, "POST", &report_uri, "9.9.9.9", Some(json!({"member_id": "C"}))).await;
    let raw: Value = parse(&body);
    assert_eq!(raw["match"], json!(false));

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(h.gateway.sent_of_kind(KnockKind::ConfirmedKnock).len(), 1);

    tokio::time::sleep(Duration::from_secs(20)).await;
    let (status, _) = call(&h.router, "POST", &report_uri, "1.2.3.4", Some(json!({"member_id": "B"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn knock_error_statuses() {
    let h = harness();
    let code = household(&h).await;

    let (status, body) = call(
        &h.router,
        "POST",
        "/knocks",
        "1.2.3.4",
        Some(json!({"member_id": "stranger", "group_code": code})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(parse::<Value>(&body)["error"].is_string());

    let (status, _) = call(
        &h.router,
        "POST",
        "/knocks",
        "1.2.3.4",
        Some(json!({"member_id": "A", "group_code": "ZZZZZZ"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&h.router, "POST", "/knocks/not-a-knock/report", "1.2.3.4", Some(json!({"member_id": "B"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn lone_member_gets_bad_request() {
    let h = harness();
    let (_, body) = call(
        &h.router,
        "POST",
        "/groups",
        "1.2.3.4",
        Some(json!({"member_id": "A", "push_token": "push-A", "name": "solo"})),
    )
    .await;
    let code = parse::<GroupResponse>(&body).group_code;

    let (status, _) = call(
        &h.router,
        "POST",
        "/knocks",
        "1.2.3.4",
        Some(json!({"member_id": "A", "group_code": code})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn partial_delivery_is_reported_as_warning() {
    let h = harness();
    let code = household(&h).await;
    h.gateway.fail_token("push-C");

    let (status, body) = call(
        &h.router,
        "POST",
        "/knocks",
        "1.2.3.4",
        Some(json!({"member_id": "A", "group_code": code})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let knock: InitiateKnockResponse = parse(&body);
    assert_eq!(knock.delivered, 1);
    assert_eq!(knock.failed, 1);
    assert!(knock.warning.is_some());
}

#[tokio::test]
async fn join_and_leave() {
    let h = harness();
    let code = household(&h).await;

    let (status, _) = call(&h.router, "POST", "/groups/NOPE00/members", "1.2.3.4", Some(json!({"member_id": "D", "push_token": "push-D"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let uri = format!("/groups/{code}/members/C");
    let (status, _) = call(&h.router, "DELETE", &uri, "1.2.3.4", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = call(&h.router, "DELETE", &uri, "1.2.3.4", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn invalid_bodies_are_rejected() {
    let h = harness();
    let code = household(&h).await;
    let join_uri = format!("/groups/{code}/members");

    let bad_bodies = [
        ("/groups", json!({"member_id": "", "push_token": "push-A", "name": "home"})),
        ("/groups", json!({"member_id": "A", "push_token": "push-A", "name": " "})),
        ("/knocks", json!({"member_id": "A", "group_code": "ab-12"})),
        ("/knocks", json!({"member_id": "A"})),
        (join_uri.as_str(), json!({"member_id": "D", "push_token": ""})),
    ];
    for (uri, body) in bad_bodies {
        let (status, bytes) = call(&h.router, "POST", uri, "1.2.3.4", Some(body.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri} {body}");
        let error: Value = parse(&bytes);
        assert!(error["error"].is_string(), "{uri} {body}");
    }
}

#[tokio::test]
async fn unparseable_json_is_a_bad_request() {
    let h = harness();
    let response = h
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/knocks")
                .header("content-type", "application/json")
                .header("x-forwarded-for", "1.2.3.4")
                .body(Body::from("{not json"))
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    assert!(parse::<Value>(&bytes)["error"].is_string());
}

#[tokio::test]
async fn group_routes_absent_without_directory() {
    let h = harness_with(false);
    let (status, _) = call(
        &h.router,
        "POST",
        "/groups",
        "1.2.3.4",
        Some(json!({"member_id": "A", "push_token": "push-A", "name": "home"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_and_metrics() {
    let h = harness();
    let code = household(&h).await;
    call(&h.router, "POST", "/knocks", "1.2.3.4", Some(json!({"member_id": "A", "group_code": code}))).await;

    let (status, body) = call(&h.router, "GET", "/health", "1.2.3.4", None).await;
    assert_eq!(status, StatusCode::OK);
    let health: HealthResponse = parse(&body);
    assert_eq!(health.status, "ok");
    assert_eq!(health.open_knocks, 1);

    let (status, body) = call(&h.router, "GET", "/metrics", "1.2.3.4", None).await;
    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(body).expect("utf8");
    assert!(text.contains("knock_initiated_total 1"));
    assert!(text.contains("knock_open_sessions 1"));
}
