//! # Device Ownership Authorizer
//!
//! Pure functions over one instance snapshot.
//!
//! ## View
//!
//! Expanded devices owned by the caller, filtered by the access validator,
//! plus an ETag over exactly that set.
//!
//! ## Patch
//!
//! Merge-patch of `name -> device | null` against the caller's devices:
//!
//! | Request | Caller owns `name` | Outcome |
//! |---------|--------------------|---------|
//! | `null` | no | skipped |
//! | `null` | yes | previous value validated, device and owner key removed |
//! | device | n/a, `name` absent | validated, added, owned by caller |
//! | device | yes | validated, replaced |
//! | device | no, `name` present | `Forbidden` |
//!
//! Device names are checked first (`BadRequest`). All checks run before
//! anything is written, so a rejected patch leaves the instance untouched. The resulting [`InstanceUpdate`] is pinned to the
//! revision it was planned against.

use super::errors::OwnershipError;
use super::etag::{compute_etag, etag_matches};
use super::ownership::{validate_device_name, OwnershipMap};
use super::validator::DeviceAccessValidator;
use serde::{Deserialize, Serialize};
use shared_types::{DeviceConfig, Devices, Identity, Instance, InstanceConfig};
use std::collections::BTreeMap;
use tracing::debug;

/// Requested changes: `Some` adds or replaces, `None` removes.
pub type DevicePatch = BTreeMap<String, Option<DeviceConfig>>;

/// Caller-visible projection of an instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceView {
    /// Instance name
    pub name: String,
    /// Owned, accessible devices
    pub devices: Devices,
    /// Hash over `name` and `devices`; sent as the `ETag` header
    #[serde(skip)]
    pub etag: String,
}

/// A planned, validated write. Applied only if the instance is still at
/// `expected_revision`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceUpdate {
    /// Instance name
    pub name: String,
    /// Revision the plan was computed from
    pub expected_revision: String,
    /// New local device set
    pub devices: Devices,
    /// New local config, owner keys included
    pub config: InstanceConfig,
}

/// Computes device views and plans patches.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceOwnershipAuthorizer;

impl DeviceOwnershipAuthorizer {
    /// Devices on `instance` visible to `caller`.
    pub fn view(
        instance: &Instance,
        caller: &Identity,
        validator: &dyn DeviceAccessValidator,
    ) -> Result<DeviceView, OwnershipError> {
        let ownership = OwnershipMap::from_config(&instance.config);
        let devices: Devices = instance
            .expanded_devices
            .iter()
            .filter(|(name, _)| ownership.is_owned_by(name, &caller.identifier))
            .filter(|(name, device)| validator.allows(instance, name, device))
            .map(|(name, device)| (name.clone(), device.clone()))
            .collect();

        let etag = compute_etag(&instance.name, &devices)?;
        Ok(DeviceView {
            name: instance.name.clone(),
            devices,
            etag,
        })
    }

    /// Validate `request` and compute the resulting instance write.
    ///
    /// # Errors
    /// * `BadRequest` - a device name is empty or malformed
    /// * `PreconditionFailed` - `if_match` is set and differs from the view ETag
    /// * `Forbidden` - a device fails validation or belongs to someone else
    pub fn plan_patch(
        instance: &Instance,
        request: &DevicePatch,
        caller: &Identity,
        validator: &dyn DeviceAccessValidator,
        if_match: Option<&str>,
    ) -> Result<InstanceUpdate, OwnershipError> {
        for name in request.keys() {
            validate_device_name(name).map_err(OwnershipError::BadRequest)?;
        }

        if let Some(if_match) = if_match {
            let current = Self::view(instance, caller, validator)?;
            if !etag_matches(if_match, &current.etag) {
                debug!(instance = %instance.name, "If-Match does not match owned-device ETag");
                return Err(OwnershipError::PreconditionFailed);
            }
        }

        let caller_id = caller.identifier.as_str();
        let mut ownership = OwnershipMap::from_config(&instance.config);
        let mut devices = instance.devices.clone();

        for (name, entry) in request {
            match entry {
                None => {
                    if !ownership.is_owned_by(name, caller_id) {
                        debug!(instance = %instance.name, device = %name, "Skipping removal of unowned device");
                        continue;
                    }
                    let previous = instance
                        .expanded_devices
                        .get(name)
                        .or_else(|| instance.devices.get(name));
                    if let Some(previous) = previous {
                        if !validator.allows(instance, name, previous) {
                            return Err(OwnershipError::Forbidden(format!(
                                "Not authorized to remove device {name}"
                            )));
                        }
                    }
                    devices.remove(name);
                    ownership.clear(name);
                }
                Some(device) => {
                    if !validator.allows(instance, name, device) {
                        return Err(OwnershipError::Forbidden(format!(
                            "Not authorized to manage device {name}"
                        )));
                    }
                    let exists = instance.expanded_devices.contains_key(name)
                        || instance.devices.contains_key(name);
                    if exists && !ownership.is_owned_by(name, caller_id) {
                        return Err(OwnershipError::Forbidden(format!(
                            "Device {name} is not owned by the caller"
                        )));
                    }
                    devices.insert(name.clone(), device.clone());
                    ownership.set_owner(name, caller_id);
                }
            }
        }

        let mut config = instance.config.clone();
        ownership.write_into(&mut config);

        Ok(InstanceUpdate {
            name: instance.name.clone(),
            expected_revision: instance.revision.clone(),
            devices,
            config,
        })
    }
}
