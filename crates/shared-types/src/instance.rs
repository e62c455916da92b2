//! # Instances and Devices
//!
//! An instance carries two device sets: the devices configured directly on
//! it, and the expanded set after profile devices are merged in. Both maps
//! are ordered so that serialized forms (and hashes over them) are stable.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Configuration of a single device (`type`, `pool`, `source`, ...).
pub type DeviceConfig = BTreeMap<String, String>;

/// Devices keyed by name.
pub type Devices = BTreeMap<String, DeviceConfig>;

/// Instance configuration keys.
pub type InstanceConfig = BTreeMap<String, String>;

/// Config key holding a device's `type`.
pub const DEVICE_TYPE_KEY: &str = "type";

/// Read the `type` of a device, if set.
pub fn device_type(device: &DeviceConfig) -> Option<&str> {
    device.get(DEVICE_TYPE_KEY).map(String::as_str)
}

/// Kind of instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum InstanceType {
    #[default]
    Container,
    VirtualMachine,
}

impl fmt::Display for InstanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Container => f.write_str("container"),
            Self::VirtualMachine => f.write_str("virtual-machine"),
        }
    }
}

/// Backend record of an instance as seen by the guest channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Instance {
    /// Instance name.
    pub name: String,
    /// Project the instance belongs to.
    pub project: String,
    /// Container or virtual machine.
    #[serde(rename = "type")]
    pub instance_type: InstanceType,
    /// Local config, including `volatile.*` keys.
    pub config: InstanceConfig,
    /// Config after profiles are applied.
    pub expanded_config: InstanceConfig,
    /// Devices configured directly on the instance.
    pub devices: Devices,
    /// Devices after profiles are applied.
    pub expanded_devices: Devices,
    /// Backend revision. Changes on every write; used for compare-and-swap.
    pub revision: String,
}

impl Instance {
    /// Create an empty instance in the `default` project.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            project: "default".to_string(),
            ..Self::default()
        }
    }

    /// Look up an expanded config key.
    pub fn expanded_config_value(&self, key: &str) -> Option<&str> {
        self.expanded_config.get(key).map(String::as_str)
    }

    /// Returns true if the expanded config sets `key` to a truthy value.
    pub fn is_enabled(&self, key: &str) -> bool {
        matches!(
            self.expanded_config_value(key),
            Some("true" | "1" | "yes" | "on")
        )
    }
}
