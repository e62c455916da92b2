//! # Device Access Validators
//!
//! Decide whether a device is something a guest may see or manage at all,
//! independent of who owns it.

use shared_types::{device_type, DeviceConfig, Instance};
use tracing::trace;

/// Instance flag enabling guest management of custom volumes.
pub const MANAGEMENT_VOLUMES_KEY: &str = "security.devlxd.management.volumes";

/// Capability check applied to owned devices.
pub trait DeviceAccessValidator: Send + Sync {
    /// Whether the guest may access `device` named `name` on `instance`.
    fn allows(&self, instance: &Instance, name: &str, device: &DeviceConfig) -> bool;
}

impl<F> DeviceAccessValidator for F
where
    F: Fn(&Instance, &str, &DeviceConfig) -> bool + Send + Sync,
{
    fn allows(&self, instance: &Instance, name: &str, device: &DeviceConfig) -> bool {
        self(instance, name, device)
    }
}

/// Allows disks backed by a custom storage volume, on instances with
/// [`MANAGEMENT_VOLUMES_KEY`] enabled.
///
/// The disk must name a `pool` and a relative `source`, and be mounted at a
/// `path` other than `/`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CustomVolumeValidator;

impl DeviceAccessValidator for CustomVolumeValidator {
    fn allows(&self, instance: &Instance, name: &str, device: &DeviceConfig) -> bool {
        if !instance.is_enabled(MANAGEMENT_VOLUMES_KEY) {
            trace!(instance = %instance.name, device = %name, "Volume management disabled");
            return false;
        }
        if device_type(device) != Some("disk") {
            return false;
        }

        let non_empty = |key: &str| device.get(key).map(String::as_str).filter(|v| !v.is_empty());

        let (Some(_pool), Some(source), Some(path)) =
            (non_empty("pool"), non_empty("source"), non_empty("path"))
        else {
            return false;
        };

        !source.starts_with('/') && path != "/"
    }
}
