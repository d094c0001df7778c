//! Saga orchestrator driving the order saga state machine.

use common::SagaId;

use crate::cancellation::Cancellation;
use crate::error::{Result, SagaError, StepError};
use crate::order_fulfillment::{self, OrderSagaRequest};
use crate::record::SagaState;
use crate::services::{PaymentCharge, StepClient, StockReservation};
use crate::state::SagaStatus;
use crate::store::SagaStateStore;

/// Outcome of the forward phase: `Err` carries the step failure that
/// triggers compensation.
type StepOutcome = std::result::Result<(), StepError>;

/// A forward step that succeeded and must be undone if a later step fails.
#[derive(Debug)]
enum CompletedStep {
    Inventory(StockReservation),
    Payment(PaymentCharge),
}

impl CompletedStep {
    fn undo_summary(&self) -> &'static str {
        match self {
            CompletedStep::Inventory(_) => "stock released",
            CompletedStep::Payment(_) => "payment refunded",
        }
    }
}

/// Runs order sagas: reserve inventory, then charge payment.
///
/// Each call to [`start`](Self::start) drives one saga instance from
/// `Started` to a terminal status on a single flow of control. Independent
/// calls may run concurrently against the same store.
pub struct SagaOrchestrator<S, I, P>
where
    S: SagaStateStore,
    I: StepClient<Input = StockReservation>,
    P: StepClient<Input = PaymentCharge>,
{
    store: S,
    inventory: I,
    payment: P,
}

impl<S, I, P> SagaOrchestrator<S, I, P>
where
    S: SagaStateStore,
    I: StepClient<Input = StockReservation>,
    P: StepClient<Input = PaymentCharge>,
{
    /// Creates a new orchestrator over the given store and step clients.
    pub fn new(store: S, inventory: I, payment: P) -> Self {
        Self {
            store,
            inventory,
            payment,
        }
    }

    /// Returns the underlying state store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs one order saga and returns its id.
    ///
    /// Step failures and cancellation do not surface here: they drive the
    /// saga through compensation to `Failed` and the id is still returned.
    /// Only request validation and store errors are returned as `Err`.
    #[tracing::instrument(
        skip(self, request, cancellation),
        fields(product_code = %request.product_code, quantity = request.quantity)
    )]
    pub async fn start(
        &self,
        request: OrderSagaRequest,
        cancellation: &Cancellation,
    ) -> Result<SagaId> {
        request.validate()?;

        metrics::counter!("saga_executions_total").increment(1);
        let saga_start = std::time::Instant::now();

        let saga_id = SagaId::new();
        self.store.start(saga_id).await?;
        tracing::info!(%saga_id, "saga started");

        let mut completed = Vec::with_capacity(2);
        match self
            .run_forward(saga_id, &request, cancellation, &mut completed)
            .await
        {
            Ok(Ok(())) => {
                let recorded = self
                    .store
                    .record(
                        saga_id,
                        SagaStatus::Completed,
                        order_fulfillment::STEP_SAGA,
                        Some(order_fulfillment::MSG_COMPLETED),
                    )
                    .await;
                if let Err(e) = recorded {
                    self.abandon(saga_id, completed, &e).await;
                    return Err(e);
                }
                metrics::counter!("saga_completed").increment(1);
                tracing::info!(%saga_id, "saga completed successfully");
            }
            Ok(Err(failure)) => self.compensate(saga_id, failure, completed).await?,
            Err(e) => {
                self.abandon(saga_id, completed, &e).await;
                return Err(e);
            }
        }

        metrics::histogram!("saga_duration_seconds").record(saga_start.elapsed().as_secs_f64());
        Ok(saga_id)
    }

    /// Returns a snapshot of a saga's state, or `None` if it is unknown.
    pub async fn get(&self, saga_id: SagaId) -> Option<SagaState> {
        self.store.get(saga_id).await
    }

    /// Returns the number of sagas the store knows about.
    pub async fn saga_count(&self) -> usize {
        self.store.count().await
    }

    /// Executes forward steps in order, stopping at the first failure.
    ///
    /// The outer `Result` carries store errors; the inner one the step failure.
    async fn run_forward(
        &self,
        saga_id: SagaId,
        request: &OrderSagaRequest,
        cancellation: &Cancellation,
        completed: &mut Vec<CompletedStep>,
    ) -> Result<StepOutcome> {
        // 1. Reserve inventory
        let reservation = request.reservation();
        if let Err(e) = forward_step(&self.inventory, &reservation, cancellation).await {
            return Ok(Err(e));
        }
        completed.push(CompletedStep::Inventory(reservation));
        self.store
            .record(
                saga_id,
                SagaStatus::InventoryReserved,
                order_fulfillment::STEP_INVENTORY,
                Some(order_fulfillment::MSG_INVENTORY_RESERVED),
            )
            .await?;

        // 2. Charge payment
        let charge = request.charge();
        if let Err(e) = forward_step(&self.payment, &charge, cancellation).await {
            return Ok(Err(e));
        }
        completed.push(CompletedStep::Payment(charge));
        self.store
            .record(
                saga_id,
                SagaStatus::PaymentCharged,
                order_fulfillment::STEP_PAYMENT,
                Some(order_fulfillment::MSG_PAYMENT_CHARGED),
            )
            .await?;

        // A signal raised while the last step ran still rolls the saga back.
        if cancellation.is_cancelled() {
            return Ok(Err(StepError::cancelled(order_fulfillment::STEP_SAGA)));
        }

        Ok(Ok(()))
    }

    /// Undoes completed steps in reverse order and drives the saga to `Failed`.
    ///
    /// Compensation is best-effort: a failing compensation is logged and
    /// noted in the `Compensated` entry, and the remaining steps are still
    /// compensated. Nothing is retried.
    #[tracing::instrument(skip(self, failure, completed))]
    async fn compensate(
        &self,
        saga_id: SagaId,
        failure: StepError,
        completed: Vec<CompletedStep>,
    ) -> Result<()> {
        let reason = failure.to_string();
        tracing::warn!(%saga_id, error = %reason, "saga step failed, compensating");
        let recorded = self
            .store
            .record(
                saga_id,
                SagaStatus::Compensating,
                order_fulfillment::STEP_SAGA,
                Some(reason.as_str()),
            )
            .await;
        if let Err(e) = recorded {
            self.abandon(saga_id, completed, &e).await;
            return Err(e);
        }

        let (undone, failures) = self.undo_steps(saga_id, completed).await;
        let summary = compensation_summary(&undone, &failures);
        self.store
            .record(
                saga_id,
                SagaStatus::Compensated,
                order_fulfillment::STEP_COMPENSATION,
                Some(summary.as_str()),
            )
            .await?;
        self.store
            .record(
                saga_id,
                SagaStatus::Failed,
                order_fulfillment::STEP_SAGA,
                Some(order_fulfillment::MSG_FAILED),
            )
            .await?;

        metrics::counter!("saga_failed").increment(1);
        tracing::warn!(%saga_id, %reason, "saga failed");
        Ok(())
    }

    /// Undoes completed steps after the log could not be written.
    ///
    /// The saga is left at its last recorded status; only the side effects
    /// of the forward steps are rolled back.
    async fn abandon(&self, saga_id: SagaId, completed: Vec<CompletedStep>, cause: &SagaError) {
        tracing::error!(%saga_id, error = %cause, "saga log write failed, undoing completed steps");
        self.undo_steps(saga_id, completed).await;
    }

    /// Runs compensations for `completed` in reverse order.
    ///
    /// Returns the summaries of the undone steps and the failure messages.
    async fn undo_steps(
        &self,
        saga_id: SagaId,
        completed: Vec<CompletedStep>,
    ) -> (Vec<&'static str>, Vec<String>) {
        // Compensation must finish even if the caller has given up on the saga.
        let never = Cancellation::never();
        let mut undone = Vec::with_capacity(completed.len());
        let mut failures = Vec::new();

        for step in completed.into_iter().rev() {
            let result = match &step {
                CompletedStep::Inventory(reservation) => {
                    self.inventory.compensate(reservation, &never).await
                }
                CompletedStep::Payment(charge) => self.payment.compensate(charge, &never).await,
            };
            match result {
                Ok(()) => undone.push(step.undo_summary()),
                Err(e) => {
                    metrics::counter!("saga_compensation_failures_total").increment(1);
                    tracing::warn!(%saga_id, error = %e, "compensation step failed");
                    failures.push(e.to_string());
                }
            }
        }

        (undone, failures)
    }
}

/// Runs one forward step, treating a raised cancellation signal as failure.
async fn forward_step<C: StepClient>(
    step: &C,
    input: &C::Input,
    cancellation: &Cancellation,
) -> StepOutcome {
    if cancellation.is_cancelled() {
        return Err(StepError::cancelled(step.name()));
    }
    tracing::info!(step = step.name(), "saga step started");
    cancellation
        .run_until_cancelled(step.forward(input, cancellation))
        .await
        .unwrap_or_else(|| Err(StepError::cancelled(step.name())))
}

fn compensation_summary(undone: &[&str], failures: &[String]) -> String {
    let mut parts = Vec::with_capacity(2);
    if !undone.is_empty() {
        parts.push(capitalize(&undone.join(" and ")));
    }
    if !failures.is_empty() {
        parts.push(format!("Compensation incomplete: {}", failures.join("; ")));
    }
    if parts.is_empty() {
        return "No completed steps to compensate".to_string();
    }
    parts.join(". ")
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
