//! HTTP API server with observability for the order saga orchestrator.
//!
//! Exposes endpoints to run an order saga and poll its state, with
//! structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use saga::{
    CancellationHandle, InMemoryInventoryStep, InMemoryOrderSaga, InMemoryPaymentStep,
    InMemorySagaStateStore, SagaOrchestrator,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub orchestrator: InMemoryOrderSaga,
    /// Raised on server shutdown; in-flight sagas compensate and finish.
    pub shutdown: CancellationHandle,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/sagas/orders", post(routes::sagas::start))
        .route("/sagas/{id}", get(routes::sagas::get))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the default application state with an in-memory store and steps.
pub fn create_default_state(config: &Config) -> Arc<AppState> {
    let inventory = InMemoryInventoryStep::new().with_latency(config.step_latency());
    let payment = InMemoryPaymentStep::new().with_latency(config.step_latency());
    let orchestrator = SagaOrchestrator::new(InMemorySagaStateStore::new(), inventory, payment);

    Arc::new(AppState {
        orchestrator,
        shutdown: CancellationHandle::new(),
    })
}
