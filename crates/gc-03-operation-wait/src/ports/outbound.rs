//! # Outbound Ports (Driven Ports / SPI)

use crate::domain::errors::WaitError;
use async_trait::async_trait;
use shared_types::Operation;
use std::time::Duration;
use uuid::Uuid;

/// Host-side long-poll over operations.
#[async_trait]
pub trait OperationWaiter: Send + Sync {
    /// Block until operation `id` reaches a final state or `timeout`
    /// elapses (`None` waits forever), then return its full record.
    ///
    /// # Errors
    /// * `WaitError::NotFound` - unknown operation
    async fn wait(&self, id: Uuid, timeout: Option<Duration>) -> Result<Operation, WaitError>;
}
