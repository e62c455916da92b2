//! In-memory operation registry.
//!
//! Each operation lives in a `watch` channel; waiters subscribe and wake on
//! every status change.

use crate::domain::errors::WaitError;
use crate::ports::outbound::OperationWaiter;
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use shared_types::{Operation, OperationStatus};
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;
use uuid::Uuid;

/// Operation registry for tests and single-process embedding.
#[derive(Debug, Default)]
pub struct InMemoryOperations {
    operations: DashMap<Uuid, watch::Sender<Operation>>,
}

impl InMemoryOperations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an operation. Returns its id.
    pub fn create(&self, operation: Operation) -> Uuid {
        let id = operation.id;
        let (tx, _) = watch::channel(operation);
        self.operations.insert(id, tx);
        debug!(operation = %id, "Operation registered");
        id
    }

    /// Move an operation to `status`, recording `err` on failure.
    pub fn update_status(
        &self,
        id: Uuid,
        status: OperationStatus,
        err: impl Into<String>,
    ) -> Result<(), WaitError> {
        let entry = self
            .operations
            .get(&id)
            .ok_or_else(|| WaitError::NotFound(id.to_string()))?;
        let err = err.into();
        entry.send_modify(|op| {
            op.status = status;
            op.err = err;
            op.updated_at = Utc::now();
        });
        debug!(operation = %id, status = %status, "Operation status changed");
        Ok(())
    }

    /// Current record of an operation.
    pub fn get(&self, id: Uuid) -> Option<Operation> {
        self.operations.get(&id).map(|entry| entry.borrow().clone())
    }

    /// Forget an operation.
    pub fn remove(&self, id: Uuid) -> Option<Operation> {
        self.operations
            .remove(&id)
            .map(|(_, tx)| tx.borrow().clone())
    }
}

#[async_trait]
impl OperationWaiter for InMemoryOperations {
    async fn wait(&self, id: Uuid, timeout: Option<Duration>) -> Result<Operation, WaitError> {
        let mut rx = self
            .operations
            .get(&id)
            .map(|entry| entry.subscribe())
            .ok_or_else(|| WaitError::NotFound(id.to_string()))?;

        let finished = async {
            rx.wait_for(|op| op.status.is_final())
                .await
                .map(|op| (*op).clone())
                .map_err(|_| WaitError::NotFound(id.to_string()))
        };

        let outcome = match timeout {
            Some(limit) => tokio::time::timeout(limit, finished).await.ok(),
            None => Some(finished.await),
        };

        match outcome {
            Some(result) => result,
            // Timed out: report where the operation stands now.
            None => Ok(rx.borrow().clone()),
        }
    }
}
