//! # Inbound Ports (Driving Ports / API)

use crate::domain::authorizer::{DevicePatch, DeviceView};
use crate::domain::errors::OwnershipError;
use async_trait::async_trait;
use shared_types::Identity;

/// Capability-scoped device access for one calling identity.
#[async_trait]
pub trait DeviceOwnershipApi: Send + Sync {
    /// Devices on instance `name` that `caller` owns and may access.
    async fn get_instance(&self, name: &str, caller: &Identity) -> Result<DeviceView, OwnershipError>;

    /// Apply a merge patch to the caller's devices.
    ///
    /// `if_match`, when present, must equal the ETag of the current view.
    /// Returns the view after the write.
    ///
    /// # Errors
    /// * `OwnershipError::PreconditionFailed` - ETag mismatch or concurrent write
    /// * `OwnershipError::Forbidden` - ownership or access violation
    async fn patch_instance(
        &self,
        name: &str,
        request: DevicePatch,
        caller: &Identity,
        if_match: Option<&str>,
    ) -> Result<DeviceView, OwnershipError>;
}
