//! # Inbound Ports (Driving Ports / API)

use crate::domain::errors::WaitError;
use async_trait::async_trait;
use shared_types::DevLxdOperation;

/// Guest-facing operation wait.
#[async_trait]
pub trait OperationWaitApi: Send + Sync {
    /// Wait up to `timeout_secs` (unbounded if negative) for operation
    /// `operation_id` to finish and return its reduced record.
    ///
    /// A timeout is not an error: the still-running record is returned.
    async fn wait(&self, operation_id: &str, timeout_secs: i64) -> Result<DevLxdOperation, WaitError>;
}
