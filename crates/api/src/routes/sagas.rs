//! Saga trigger and status endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use saga::{Money, OrderSagaRequest, SagaId, SagaState};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ApiError;

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct StartSagaRequest {
    pub product_code: String,
    pub quantity: u32,
    /// Decimal amount, e.g. `50.00`.
    pub amount: f64,
    #[serde(default)]
    pub simulate_failure: bool,
}

// -- Response types --

#[derive(Serialize)]
pub struct SagaStartedResponse {
    pub saga_id: String,
    pub status: String,
}

#[derive(Serialize)]
pub struct SagaStateResponse {
    pub saga_id: String,
    pub status: String,
    pub steps: Vec<SagaStepResponse>,
}

#[derive(Serialize)]
pub struct SagaStepResponse {
    pub name: String,
    pub status: String,
    pub occurred_at: String,
    pub message: Option<String>,
}

impl From<SagaState> for SagaStateResponse {
    fn from(state: SagaState) -> Self {
        Self {
            saga_id: state.saga_id().to_string(),
            status: state.status().to_string(),
            steps: state
                .steps()
                .iter()
                .map(|step| SagaStepResponse {
                    name: step.name.clone(),
                    status: step.status.to_string(),
                    occurred_at: step.occurred_at.to_rfc3339(),
                    message: step.message.clone(),
                })
                .collect(),
        }
    }
}

// -- Handlers --

/// POST /sagas/orders — run one order saga and return its id.
#[tracing::instrument(skip(state, req), fields(product_code = %req.product_code))]
pub async fn start(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StartSagaRequest>,
) -> Result<(StatusCode, Json<SagaStartedResponse>), ApiError> {
    let amount = Money::try_from_decimal(req.amount).ok_or_else(|| {
        ApiError::BadRequest("amount must be a non-negative number".to_string())
    })?;
    let request = OrderSagaRequest::new(req.product_code, req.quantity, amount)
        .with_simulated_failure(req.simulate_failure);

    let saga_id = state
        .orchestrator
        .start(request, &state.shutdown.token())
        .await?;

    let status = state
        .orchestrator
        .get(saga_id)
        .await
        .map(|s| s.status().to_string())
        .ok_or_else(|| ApiError::Internal(format!("Saga {saga_id} missing after start")))?;

    Ok((
        StatusCode::CREATED,
        Json(SagaStartedResponse {
            saga_id: saga_id.to_string(),
            status,
        }),
    ))
}

/// GET /sagas/:id — current status and step log of a saga.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SagaStateResponse>, ApiError> {
    let saga_id = parse_saga_id(&id)?;

    let saga = state
        .orchestrator
        .get(saga_id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Saga {id} not found")))?;

    Ok(Json(saga.into()))
}

fn parse_saga_id(id: &str) -> Result<SagaId, ApiError> {
    SagaId::parse(id).map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))
}
