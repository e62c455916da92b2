//! # Device Ownership Service
//!
//! Implements [`DeviceOwnershipApi`] over an [`InstanceBackend`]:
//! load, plan with [`DeviceOwnershipAuthorizer`], then write with a
//! revision check. A concurrent writer between load and write surfaces as
//! `PreconditionFailed`, and the caller re-reads the view before retrying.

use crate::domain::authorizer::{DeviceOwnershipAuthorizer, DevicePatch, DeviceView};
use crate::domain::errors::OwnershipError;
use crate::domain::validator::DeviceAccessValidator;
use crate::ports::inbound::DeviceOwnershipApi;
use crate::ports::outbound::InstanceBackend;
use async_trait::async_trait;
use shared_types::Identity;
use std::sync::Arc;
use tracing::{debug, info};

/// Device ownership service.
pub struct DeviceOwnershipService<B: InstanceBackend> {
    backend: Arc<B>,
    validator: Arc<dyn DeviceAccessValidator>,
}

impl<B: InstanceBackend> DeviceOwnershipService<B> {
    /// Create a service.
    ///
    /// # Arguments
    /// * `backend` - Instance store
    /// * `validator` - Capability check for every visible or written device
    pub fn new(backend: Arc<B>, validator: Arc<dyn DeviceAccessValidator>) -> Self {
        Self { backend, validator }
    }

    /// The underlying backend.
    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }
}

#[async_trait]
impl<B: InstanceBackend> DeviceOwnershipApi for DeviceOwnershipService<B> {
    async fn get_instance(&self, name: &str, caller: &Identity) -> Result<DeviceView, OwnershipError> {
        let instance = self.backend.get_instance(name).await?;
        DeviceOwnershipAuthorizer::view(&instance, caller, self.validator.as_ref())
    }

    async fn patch_instance(
        &self,
        name: &str,
        request: DevicePatch,
        caller: &Identity,
        if_match: Option<&str>,
    ) -> Result<DeviceView, OwnershipError> {
        let instance = self.backend.get_instance(name).await?;
        let update = DeviceOwnershipAuthorizer::plan_patch(
            &instance,
            &request,
            caller,
            self.validator.as_ref(),
            if_match,
        )?;

        let updated = self.backend.update_instance(update).await.map_err(|err| {
            debug!(instance = %name, error = %err, "Instance update rejected");
            OwnershipError::from(err)
        })?;

        info!(
            instance = %name,
            caller = %caller.identifier,
            changes = request.len(),
            "Applied device patch"
        );
        DeviceOwnershipAuthorizer::view(&updated, caller, self.validator.as_ref())
    }
}
