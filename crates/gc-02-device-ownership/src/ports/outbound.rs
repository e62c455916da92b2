//! # Outbound Ports (Driven Ports / SPI)

use crate::domain::authorizer::InstanceUpdate;
use crate::domain::errors::BackendError;
use async_trait::async_trait;
use shared_types::Instance;

/// Instance store.
#[async_trait]
pub trait InstanceBackend: Send + Sync {
    /// Load an instance with its expanded config and devices.
    async fn get_instance(&self, name: &str) -> Result<Instance, BackendError>;

    /// Write devices and config together, only if the instance is still at
    /// `update.expected_revision`.
    ///
    /// # Errors
    /// * `BackendError::RevisionConflict` - the instance changed since planning
    async fn update_instance(&self, update: InstanceUpdate) -> Result<Instance, BackendError>;
}
