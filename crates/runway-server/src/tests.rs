//! Server API tests

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use runway_core::test_utils::{sample_snapshot, sample_snapshot_with_history};
use tower::ServiceExt;

fn setup_test_app() -> Router {
    create_router(EngineConfig::default(), ServerConfig::default())
}

async fn get_body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
    )
    .await
    .unwrap()
}

fn snapshot_json() -> serde_json::Value {
    serde_json::to_value(sample_snapshot()).unwrap()
}

// ========== System Tests ==========

#[tokio::test]
async fn test_health() {
    let app = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");

    let json = get_body_json(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_get_config() {
    let app = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/config")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["projection"]["default_horizon_days"], 30);
    assert_eq!(json["risk"]["low_stress_min"], 70.0);
    assert_eq!(json["rules"]["category_budgets"]["food"], 0.2);
}

// ========== Projection Tests ==========

#[tokio::test]
async fn test_projection() {
    let response = post_json(setup_test_app(), "/api/projection", snapshot_json()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["projector"], "schedule");
    assert_eq!(json["startBalance"], 52500.0);
    let days = json["days"].as_array().unwrap();
    assert_eq!(days.len(), 30);
    assert_eq!(days[0]["date"], "2024-01-01");
    assert_eq!(days[0]["riskLevel"], "safe");
    let end = json["endBalance"].as_f64().unwrap();
    assert!((end - 82500.0).abs() < 1e-6);
}

#[tokio::test]
async fn test_projection_uses_history() {
    let body = serde_json::to_value(sample_snapshot_with_history()).unwrap();
    let response = post_json(setup_test_app(), "/api/projection", body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["projector"], "historical");
}

#[tokio::test]
async fn test_projection_rejects_bad_horizon() {
    let mut body = snapshot_json();
    body["horizonDays"] = serde_json::json!(5000);
    let response = post_json(setup_test_app(), "/api/projection", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("horizonDays"));

    let mut negative = snapshot_json();
    negative["horizonDays"] = serde_json::json!(-1);
    let response = post_json(setup_test_app(), "/api/projection", negative).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_partial_snapshot_accepted() {
    let body = serde_json::json!({ "asOf": "2024-03-01", "currentBalance": 500 });
    let response = post_json(setup_test_app(), "/api/projection", body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["days"].as_array().unwrap().len(), 30);
    assert_eq!(json["endBalance"], 500.0);
}

#[tokio::test]
async fn test_malformed_json_rejected() {
    let response = setup_test_app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/recompute")
                .header("content-type", "application/json")
                .body(Body::from("{\"currentBalance\": "))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

// ========== Forecast Tests ==========

#[tokio::test]
async fn test_body_limit_from_server_config() {
    let config = ServerConfig {
        max_body_size: 64,
        ..Default::default()
    };
    let app = create_router(EngineConfig::default(), config);
    let response = post_json(app, "/api/projection", snapshot_json()).await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_forecast_months() {
    let body = serde_json::to_value(sample_snapshot_with_history()).unwrap();
    let response = post_json(setup_test_app(), "/api/forecast?months=6", body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["projector"], "historical");
    assert_eq!(json["nextMonths"].as_array().unwrap().len(), 6);
    assert_eq!(json["nextMonths"][0]["month"], "2024-04");
    assert!(json["endOfMonth"]["predictedEndBalance"].is_number());
}

#[tokio::test]
async fn test_forecast_rejects_too_many_months() {
    let response = post_json(setup_test_app(), "/api/forecast?months=600", snapshot_json()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ========== Risk Tests ==========

#[tokio::test]
async fn test_risk() {
    let response = post_json(setup_test_app(), "/api/risk", snapshot_json()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let score = json["risk"]["score"].as_f64().unwrap();
    assert!((score - 68.0).abs() < 1e-9);
    assert_eq!(json["risk"]["factors"]["incomeStability"], 30.0);
    assert_eq!(json["stress"]["level"], "moderate");
}

// ========== Recommendation Tests ==========

#[tokio::test]
async fn test_recommendations_variants() {
    let body = serde_json::to_value(sample_snapshot_with_history()).unwrap();

    let response = post_json(
        setup_test_app(),
        "/api/recommendations?variant=budget",
        body.clone(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert!(json
        .as_array()
        .unwrap()
        .iter()
        .all(|r| r["id"].as_str().unwrap().starts_with("budget:")));

    let response = post_json(setup_test_app(), "/api/recommendations", body).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    let ranks: Vec<u8> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|r| match r["priority"].as_str().unwrap() {
            "high" => 3,
            "moderate" => 2,
            _ => 1,
        })
        .collect();
    assert!(!ranks.is_empty());
    assert!(ranks.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn test_recommendations_unknown_variant() {
    let response = post_json(
        setup_test_app(),
        "/api/recommendations?variant=everything",
        snapshot_json(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ========== What-if Tests ==========

#[tokio::test]
async fn test_what_if() {
    let body = serde_json::json!({
        "snapshot": snapshot_json(),
        "scenario": { "amount": 20000, "day": 3, "category": "electronics" }
    });
    let response = post_json(setup_test_app(), "/api/what-if", body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let change = json["balanceChange"].as_f64().unwrap();
    assert!((change + 20000.0).abs() < 1e-6);
    assert_eq!(json["scenario"]["category"], "electronics");
    assert_eq!(json["goalImpact"]["goalId"], "emergency");
    assert!(!json["explanation"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_what_if_requires_snapshot() {
    let body = serde_json::json!({ "scenario": { "amount": 100 } });
    let response = post_json(setup_test_app(), "/api/what-if", body).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// ========== Recompute Tests ==========

#[tokio::test]
async fn test_recompute() {
    let response = post_json(setup_test_app(), "/api/recompute", snapshot_json()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["projector"], "schedule");
    assert_eq!(json["projection"].as_array().unwrap().len(), 30);
    assert_eq!(json["forecast"]["nextMonths"].as_array().unwrap().len(), 3);
    assert!(json["risk"]["score"].is_number());
    assert!(json["stress"]["message"].is_string());
    assert!(json["recommendations"].is_array());
}

#[tokio::test]
async fn test_custom_engine_config() {
    let mut engine = EngineConfig::default();
    engine.projection.default_horizon_days = 10;
    let app = create_router(engine, ServerConfig::default());

    let response = post_json(app, "/api/recompute", snapshot_json()).await;
    let json = get_body_json(response).await;
    assert_eq!(json["projection"].as_array().unwrap().len(), 10);
}

#[test]
fn test_app_error_status() {
    assert_eq!(
        AppError::bad_request("nope").status(),
        StatusCode::BAD_REQUEST
    );
    let internal: AppError = anyhow::anyhow!("boom").into();
    assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
