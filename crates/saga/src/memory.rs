use std::sync::Arc;

use async_trait::async_trait;
use common::SagaId;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::RwLock;

use crate::error::{Result, SagaError};
use crate::order_fulfillment;
use crate::record::{SagaState, SagaStep};
use crate::state::SagaStatus;
use crate::store::SagaStateStore;

#[derive(Debug)]
struct SagaRecord {
    status: SagaStatus,
    steps: Vec<SagaStep>,
}

impl SagaRecord {
    fn started() -> Self {
        Self {
            status: SagaStatus::Started,
            steps: vec![SagaStep::new(
                order_fulfillment::STEP_SAGA,
                SagaStatus::Started,
                Some(order_fulfillment::MSG_STARTED),
            )],
        }
    }
}

/// In-memory saga state store.
///
/// Each saga's log sits behind its own lock, so writes to one saga never
/// wait on another. State lives for the lifetime of the process.
#[derive(Debug, Clone, Default)]
pub struct InMemorySagaStateStore {
    sagas: Arc<DashMap<SagaId, Arc<RwLock<SagaRecord>>>>,
}

impl InMemorySagaStateStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the ids of all tracked sagas, in no particular order.
    pub fn ids(&self) -> Vec<SagaId> {
        self.sagas.iter().map(|r| *r.key()).collect()
    }

    fn entry(&self, saga_id: SagaId) -> Option<Arc<RwLock<SagaRecord>>> {
        // Clone the handle out so the map shard is not held across an await.
        self.sagas.get(&saga_id).map(|r| Arc::clone(r.value()))
    }
}

#[async_trait]
impl SagaStateStore for InMemorySagaStateStore {
    async fn start(&self, saga_id: SagaId) -> Result<()> {
        match self.sagas.entry(saga_id) {
            Entry::Occupied(_) => Err(SagaError::AlreadyStarted(saga_id)),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(RwLock::new(SagaRecord::started())));
                tracing::debug!(%saga_id, "saga tracking started");
                Ok(())
            }
        }
    }

    async fn record(
        &self,
        saga_id: SagaId,
        status: SagaStatus,
        step_name: &str,
        message: Option<&str>,
    ) -> Result<()> {
        let record = self.entry(saga_id).ok_or(SagaError::NotFound(saga_id))?;
        let mut record = record.write().await;

        if !record.status.can_transition_to(status) {
            return Err(SagaError::InvalidTransition {
                saga_id,
                from: record.status,
                to: status,
            });
        }

        record.status = status;
        record.steps.push(SagaStep::new(step_name, status, message));
        tracing::debug!(%saga_id, %status, step = step_name, "saga transition recorded");
        Ok(())
    }

    async fn get(&self, saga_id: SagaId) -> Option<SagaState> {
        let record = self.entry(saga_id)?;
        let record = record.read().await;
        Some(SagaState::new(saga_id, record.status, record.steps.clone()))
    }

    async fn count(&self) -> usize {
        self.sagas.len()
    }
}
