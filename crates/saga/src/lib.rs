//! Saga orchestrator for order fulfillment.
//!
//! This crate coordinates a multi-step order transaction without a single
//! atomic commit. The order saga runs these steps:
//! 1. Reserve inventory
//! 2. Charge payment
//!
//! If a step fails, every step that already completed is compensated in
//! reverse order and the saga ends `Failed`. Each transition is appended
//! to a per-saga audit log held by a [`SagaStateStore`].

pub mod cancellation;
pub mod error;
pub mod memory;
pub mod orchestrator;
pub mod order_fulfillment;
pub mod record;
pub mod services;
pub mod state;
pub mod store;

pub use cancellation::{Cancellation, CancellationHandle};
pub use common::{Money, SagaId};
pub use error::{SagaError, StepError};
pub use memory::InMemorySagaStateStore;
pub use orchestrator::SagaOrchestrator;
pub use order_fulfillment::OrderSagaRequest;
pub use record::{SagaState, SagaStep};
pub use services::{
    InMemoryInventoryStep, InMemoryPaymentStep, PaymentCharge, StepClient, StockReservation,
};
pub use state::SagaStatus;
pub use store::SagaStateStore;

/// Orchestrator wired with the in-memory store and step clients.
pub type InMemoryOrderSaga =
    SagaOrchestrator<InMemorySagaStateStore, InMemoryInventoryStep, InMemoryPaymentStep>;
