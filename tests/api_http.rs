// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health
// - POST /analyze (camelCase body + display fields)
// - POST /analyze with blank / missing text
// - GET /simulations, GET /simulations/{id}, POST /simulations/send

use axum::{
    body::{self, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value as Json};
use tower::ServiceExt as _; // for `oneshot`

use scam_risk_analyzer::api::{self, AppState};
use scam_risk_analyzer::Pipeline;

const BODY_LIMIT: usize = 1024 * 1024;

fn test_router() -> Router {
    api::router(AppState::new(Pipeline::pattern_only()))
}

async fn post_analyze(app: Router, payload: Json) -> (StatusCode, Json) {
    let req = Request::builder()
        .method("POST")
        .uri("/analyze")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .expect("build POST /analyze");
    let resp = app.oneshot(req).await.expect("oneshot /analyze");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    let v = serde_json::from_slice(&bytes).expect("json body");
    (status, v)
}

#[tokio::test]
async fn health_returns_ok() {
    let req = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .expect("build GET /health");

    let resp = test_router().oneshot(req).await.expect("oneshot /health");
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
    assert_eq!(String::from_utf8(bytes.to_vec()).unwrap().trim(), "OK");
}

#[tokio::test]
async fn analyze_returns_diagnosis_with_display_fields() {
    let (status, v) = post_analyze(test_router(), json!({ "text": "긴급! 경찰입니다" })).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(v["riskLevel"], "medium");
    assert_eq!(v["riskScore"], 40);
    assert_eq!(v["analyzedText"], "긴급! 경찰입니다");
    assert_eq!(v["color"], "#f59e0b");
    assert!(v["label"].is_string());
    assert!(v["emoji"].is_string());

    let patterns = v["detectedPatterns"].as_array().expect("detectedPatterns array");
    assert_eq!(patterns.len(), 2);
    assert_eq!(patterns[0]["category"], "urgency");
    assert_eq!(patterns[0]["matchedKeywords"], json!(["긴급"]));
    assert_eq!(patterns[1]["category"], "authority");

    assert!(v["recommendations"].as_array().unwrap().len() >= 2);
    assert!(v.get("error").is_none(), "no error key in pattern-only mode");
    assert!(v.get("detailedAnalysis").is_none());
}

#[tokio::test]
async fn blank_or_missing_text_is_safe_not_an_error() {
    for payload in [json!({ "text": "   " }), json!({})] {
        let (status, v) = post_analyze(test_router(), payload).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(v["riskLevel"], "safe");
        assert_eq!(v["riskScore"], 0);
        assert_eq!(v["recommendations"], json!(["분석할 텍스트를 입력해주세요."]));
    }
}

#[tokio::test]
async fn metrics_route_absent_without_handle() {
    let req = Request::get("/metrics").body(Body::empty()).unwrap();
    let resp = test_router().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Json) {
    let req = Request::get(uri).body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
    (status, serde_json::from_slice(&bytes).expect("json body"))
}

async fn post_send(payload: Json) -> (StatusCode, Json) {
    let req = Request::builder()
        .method("POST")
        .uri("/simulations/send")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();
    let resp = test_router().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
    (status, serde_json::from_slice(&bytes).expect("json body"))
}

#[tokio::test]
async fn simulations_are_listed_in_table_order() {
    let (status, v) = get_json(test_router(), "/simulations").await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<_> = v
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["tax_refund", "account_security", "prize_win"]);
}

#[tokio::test]
async fn simulation_reveal_and_unknown_id() {
    let (status, v) = get_json(test_router(), "/simulations/prize_win").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["senderEmail"], "event@star-bucks.kr");
    assert!(v["explanation"].as_str().unwrap().contains("개인정보"));

    let (status, v) = get_json(test_router(), "/simulations/lottery").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(v["error"], "시나리오를 찾을 수 없습니다.");
}

#[tokio::test]
async fn send_maps_errors_to_status_codes() {
    let (status, _) = post_send(json!({ "targetEmail": "a@example.org", "scenarioId": "nope" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = post_send(json!({ "targetEmail": "not an address", "scenarioId": "tax_refund" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // no mailer in the test state
    let (status, v) = post_send(json!({ "targetEmail": "a@example.org", "scenarioId": "tax_refund" })).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(v["error"].as_str().unwrap().contains("메일"));
}
