//! Shared types for the order saga orchestrator.

pub mod money;
pub mod types;

pub use money::Money;
pub use types::SagaId;
