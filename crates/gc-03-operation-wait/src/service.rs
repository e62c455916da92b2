//! # Operation Wait Bridge
//!
//! | timeout_secs | wait bound                         |
//! |--------------|------------------------------------|
//! | `< 0`        | none (or `max_wait` when set)      |
//! | `0`          | return the current record at once  |
//! | `n > 0`      | `min(n, max_wait)` seconds         |

use crate::domain::errors::WaitError;
use crate::ports::inbound::OperationWaitApi;
use crate::ports::outbound::OperationWaiter;
use async_trait::async_trait;
use shared_types::DevLxdOperation;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

/// Guest-facing wait over a host [`OperationWaiter`].
pub struct OperationWaitBridge<W: OperationWaiter> {
    waiter: Arc<W>,
    max_wait: Option<Duration>,
}

impl<W: OperationWaiter> OperationWaitBridge<W> {
    pub fn new(waiter: Arc<W>) -> Self {
        Self {
            waiter,
            max_wait: None,
        }
    }

    /// Cap every wait, including unbounded ones, at `max_wait`.
    #[must_use]
    pub fn with_max_wait(mut self, max_wait: Option<Duration>) -> Self {
        self.max_wait = max_wait;
        self
    }

    pub fn waiter(&self) -> &Arc<W> {
        &self.waiter
    }

    fn bound(&self, timeout_secs: i64) -> Option<Duration> {
        let requested = u64::try_from(timeout_secs).ok().map(Duration::from_secs);
        match (requested, self.max_wait) {
            (Some(requested), Some(cap)) => Some(requested.min(cap)),
            (requested, cap) => requested.or(cap),
        }
    }
}

#[async_trait]
impl<W: OperationWaiter> OperationWaitApi for OperationWaitBridge<W> {
    async fn wait(&self, operation_id: &str, timeout_secs: i64) -> Result<DevLxdOperation, WaitError> {
        let id = Uuid::parse_str(operation_id).map_err(|_| {
            debug!(operation = %operation_id, "Rejected malformed operation id");
            WaitError::InvalidId(operation_id.to_string())
        })?;

        let timeout = self.bound(timeout_secs);
        let operation = self.waiter.wait(id, timeout).await.map_err(|err| {
            if !matches!(err, WaitError::NotFound(_)) {
                warn!(operation = %id, error = %err, "Operation wait failed");
            }
            err
        })?;

        debug!(
            operation = %id,
            status = %operation.status,
            final_state = operation.status.is_final(),
            "Operation wait returned"
        );
        Ok(DevLxdOperation::from(&operation))
    }
}
