use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;

use common::{bearer, create_test_app, ScriptedGenerator, ADVANCE_REPLY};

async fn send(app: &Router, method: Method, uri: &str, auth: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(subject) = auth {
        builder = builder.header(header::AUTHORIZATION, bearer(subject));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_health() {
    let (app, _) = create_test_app(ScriptedGenerator::always(ADVANCE_REPLY));
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["store"], "memory");
}

#[tokio::test]
async fn test_unauthorized_without_token() {
    let (app, _) = create_test_app(ScriptedGenerator::always(ADVANCE_REPLY));
    let (status, body) = send(&app, Method::GET, "/api/checkpoints", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_rejects_foreign_token() {
    let (app, _) = create_test_app(ScriptedGenerator::always(ADVANCE_REPLY));
    let token = skilltree_backend::auth::sign_hs256("u1", "someone-else", 60).unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/mastery")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_is_idempotent() {
    let (app, _) = create_test_app(ScriptedGenerator::always(ADVANCE_REPLY));

    let (status, body) = send(&app, Method::POST, "/api/auth/register", Some("u1"), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["created"], true);
    assert_eq!(body["data"]["learnerId"], "u1");

    let (status, body) = send(&app, Method::POST, "/api/auth/register", Some("u1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["created"], false);

    let (status, body) = send(&app, Method::GET, "/api/checkpoints", Some("u1"), None).await;
    assert_eq!(status, StatusCode::OK);
    let checkpoints = body["data"]["checkpoints"].as_object().unwrap();
    assert_eq!(checkpoints.len(), 7);
    assert_eq!(checkpoints["0"]["can_attempt"], false);
    assert_eq!(checkpoints["0"]["attempts"], 0);
}

#[tokio::test]
async fn test_checkpoint_flow() {
    let (app, harness) = create_test_app(ScriptedGenerator::always(ADVANCE_REPLY));
    send(&app, Method::POST, "/api/auth/register", Some("u1"), None).await;

    let attempt = json!({ "tier_number": 0, "code": "def subsets(): ..." });
    let (status, body) = send(&app, Method::POST, "/api/checkpoints/attempt", Some("u1"), Some(attempt.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "NOT_ELIGIBLE");
    assert_eq!(harness.generator.call_count(), 0);

    for (topic, confidence) in [("ARRAY_SCAN", 80), ("RECURSION_ROOTS", 70)] {
        let (status, body) = send(
            &app,
            Method::PUT,
            &format!("/api/mastery/{topic}"),
            Some("u1"),
            Some(json!({ "confidence": confidence, "solved_problems": ["run_sum"] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }

    let (status, body) = send(&app, Method::POST, "/api/checkpoints/attempt", Some("u1"), Some(attempt)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["verdict"], "ADVANCE");
    assert_eq!(body["data"]["is_passed"], true);
    assert_eq!(body["data"]["attempts"], 1);

    let (_, body) = send(&app, Method::GET, "/api/checkpoints", Some("u1"), None).await;
    assert_eq!(body["data"]["checkpoints"]["0"]["is_passed"], true);
}

#[tokio::test]
async fn test_attempt_without_registration_is_not_found() {
    let (app, _) = create_test_app(ScriptedGenerator::always(ADVANCE_REPLY));
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/checkpoints/attempt",
        Some("ghost"),
        Some(json!({ "tier_number": 2, "code": "x" })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_upstream_failure_maps_to_bad_gateway() {
    let (app, harness) = create_test_app(ScriptedGenerator::failing());
    send(&app, Method::POST, "/api/auth/register", Some("u1"), None).await;
    common::set_confidence(&harness.store, "u1", &[("ARRAY_SCAN", 70), ("RECURSION_ROOTS", 70)]).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/checkpoints/attempt",
        Some("u1"),
        Some(json!({ "tier_number": 0, "code": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "UPSTREAM_ERROR");

    let (_, body) = send(&app, Method::GET, "/api/checkpoints", Some("u1"), None).await;
    assert_eq!(body["data"]["checkpoints"]["0"]["attempts"], 1);
}

#[tokio::test]
async fn test_validation_errors() {
    let (app, _) = create_test_app(ScriptedGenerator::always(ADVANCE_REPLY));
    send(&app, Method::POST, "/api/auth/register", Some("u1"), None).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/checkpoints/attempt",
        Some("u1"),
        Some(json!({ "tier_number": "zero" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/checkpoints/attempt",
        Some("u1"),
        Some(json!({ "tier_number": 7, "code": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/mastery/NOPE",
        Some("u1"),
        Some(json!({ "confidence": 50 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/mastery/HASHING",
        Some("u1"),
        Some(json!({ "confidence": 150 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_judge_problem_updates_mastery_and_topic_status() {
    let (app, _) = create_test_app(ScriptedGenerator::always(r#"{"verdict":"ADVANCE","feedback":"clean"}"#));
    send(&app, Method::POST, "/api/auth/register", Some("u1"), None).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/ai/judge",
        Some("u1"),
        Some(json!({ "topic_key": "ARRAY_SCAN", "problem_id": "run_sum", "code": "acc += x" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["verdict"], "ADVANCE");
    assert_eq!(body["data"]["feedback"], "clean");

    let (_, body) = send(&app, Method::GET, "/api/mastery", Some("u1"), None).await;
    assert_eq!(body["data"]["mastery"]["ARRAY_SCAN"]["confidence"], 33);
    assert_eq!(body["data"]["mastery"]["ARRAY_SCAN"]["solved"], json!(["run_sum"]));

    let (_, body) = send(&app, Method::GET, "/api/topics/status", Some("u1"), None).await;
    assert_eq!(body["data"]["statuses"]["ARRAY_SCAN"], "IN_PROGRESS");
    assert_eq!(body["data"]["statuses"]["RECURSION_ROOTS"], "UNLOCKED");
    assert_eq!(body["data"]["statuses"]["SORTING"], "LOCKED");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/ai/judge",
        Some("u1"),
        Some(json!({ "topic_key": "ARRAY_SCAN", "problem_id": "missing", "code": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND, "{body}");
}

#[tokio::test]
async fn test_mentor_endpoints() {
    let (app, harness) = create_test_app(ScriptedGenerator::always("Think about what the stack remembers."));

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/ai/chat",
        Some("u1"),
        Some(json!({ "topic_key": "STACKS", "message": "why LIFO?" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["response"], "Think about what the stack remembers.");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/ai/complexity",
        Some("u1"),
        Some(json!({ "code": "for i in a: for j in a: pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["analysis"].is_string());

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/ai/chat",
        Some("u1"),
        Some(json!({ "topic_key": "NOPE", "message": "hi" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(harness.generator.call_count(), 2);
}
