//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceExt;

use api::config::Config;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> axum::Router {
    setup_with_state().0
}

fn setup_with_state() -> (axum::Router, Arc<api::AppState>) {
    let state = api::create_default_state(&Config::default());
    let app = api::create_app(state.clone(), get_metrics_handle());
    (app, state)
}

fn start_request(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/sagas/orders")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn get_saga(app: &axum::Router, saga_id: &str) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::builder()
                .uri(format!("/sagas/{saga_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

fn step_statuses(saga: &serde_json::Value) -> Vec<&str> {
    saga["steps"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["status"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn test_health_check() {
    let app = setup();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["sagas"], 0);
}

#[tokio::test]
async fn test_start_saga_happy_path() {
    let app = setup();

    let response = app
        .clone()
        .oneshot(start_request(serde_json::json!({
            "product_code": "SKU-1",
            "quantity": 2,
            "amount": 50.00
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let created = json_body(response).await;
    assert_eq!(created["status"], "Completed");
    let saga_id = created["saga_id"].as_str().unwrap().to_string();

    let response = get_saga(&app, &saga_id).await;
    assert_eq!(response.status(), StatusCode::OK);
    let saga = json_body(response).await;
    assert_eq!(saga["saga_id"], saga_id.as_str());
    assert_eq!(saga["status"], "Completed");
    assert_eq!(
        step_statuses(&saga),
        ["Started", "InventoryReserved", "PaymentCharged", "Completed"]
    );
    assert_eq!(saga["steps"][1]["name"], "Inventory");
    assert_eq!(saga["steps"][1]["message"], "Reserved stock");
    assert!(saga["steps"][0]["occurred_at"].as_str().is_some());
}

#[tokio::test]
async fn test_start_saga_with_simulated_failure() {
    let app = setup();

    let response = app
        .clone()
        .oneshot(start_request(serde_json::json!({
            "product_code": "SKU-1",
            "quantity": 2,
            "amount": 50.00,
            "simulate_failure": true
        })))
        .await
        .unwrap();

    // The step failure is absorbed by the saga, not returned as an error.
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = json_body(response).await;
    assert_eq!(created["status"], "Failed");

    let saga = json_body(get_saga(&app, created["saga_id"].as_str().unwrap()).await).await;
    assert_eq!(
        step_statuses(&saga),
        [
            "Started",
            "InventoryReserved",
            "Compensating",
            "Compensated",
            "Failed"
        ]
    );
    assert_eq!(
        saga["steps"][2]["message"],
        "Payment step failed: Simulated payment failure"
    );
}

#[tokio::test]
async fn test_start_saga_rejects_invalid_fields() {
    let app = setup();

    for body in [
        serde_json::json!({ "product_code": "", "quantity": 1, "amount": 1.0 }),
        serde_json::json!({ "product_code": "SKU-1", "quantity": 0, "amount": 1.0 }),
        serde_json::json!({ "product_code": "SKU-1", "quantity": 1, "amount": -1.0 }),
    ] {
        let response = app.clone().oneshot(start_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert!(json["error"].as_str().is_some());
    }
}

#[tokio::test]
async fn test_health_reports_saga_count() {
    let (app, state) = setup_with_state();

    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(start_request(serde_json::json!({
                "product_code": "SKU-1",
                "quantity": 1,
                "amount": 10
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = json_body(response).await;
    assert_eq!(json["sagas"], 3);
    assert_eq!(state.orchestrator.saga_count().await, 3);
}

#[tokio::test]
async fn test_get_unknown_saga() {
    let app = setup();
    let response = get_saga(&app, "00000000-0000-0000-0000-000000000000").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_saga_id_format() {
    let app = setup();
    let response = get_saga(&app, "not-a-uuid").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_shutdown_cancels_new_sagas() {
    let (app, state) = setup_with_state();
    state.shutdown.cancel();

    let response = app
        .clone()
        .oneshot(start_request(serde_json::json!({
            "product_code": "SKU-1",
            "quantity": 1,
            "amount": 5.25
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let created = json_body(response).await;
    assert_eq!(created["status"], "Failed");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(content_type.starts_with("text/plain"));
}
