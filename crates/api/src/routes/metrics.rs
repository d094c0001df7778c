//! Prometheus metrics endpoint.
//!
//! Exposes the saga counters (`saga_executions_total`, `saga_completed`,
//! `saga_failed`, `saga_compensation_failures_total`) and the
//! `saga_duration_seconds` histogram recorded by the orchestrator.

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use metrics_exporter_prometheus::PrometheusHandle;

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// GET /metrics — returns Prometheus-formatted metrics.
pub async fn get(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
        handle.render(),
    )
}
