//! # Ownership Side-Channel
//!
//! Persisted form: one instance config key per owned device,
//! `volatile.<device>.owner = <identifier>`. Clearing ownership deletes the
//! key. An empty value is read as unowned.
//!
//! In memory ownership is an [`OwnershipMap`]; translation to and from the
//! config keys happens only in [`OwnershipMap::from_config`] and
//! [`OwnershipMap::write_into`].

use shared_types::InstanceConfig;
use std::collections::BTreeMap;

const OWNER_KEY_PREFIX: &str = "volatile.";
const OWNER_KEY_SUFFIX: &str = ".owner";

/// Config key recording the owner of `device`.
pub fn owner_key(device: &str) -> String {
    format!("{OWNER_KEY_PREFIX}{device}{OWNER_KEY_SUFFIX}")
}

/// Device name of an owner key, if `key` is one.
pub fn parse_owner_key(key: &str) -> Option<&str> {
    key.strip_prefix(OWNER_KEY_PREFIX)?
        .strip_suffix(OWNER_KEY_SUFFIX)
        .filter(|device| !device.is_empty())
}

/// Check that `name` can be stored as a device and round-trip through its
/// owner key.
///
/// Rejects empty names, `.` and `..`, and names containing `/`, whitespace
/// or control characters.
pub fn validate_device_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Device name cannot be empty".into());
    }
    if name == "." || name == ".." {
        return Err(format!("Invalid device name {name:?}"));
    }
    if let Some(c) = name
        .chars()
        .find(|c| *c == '/' || c.is_whitespace() || c.is_control())
    {
        return Err(format!("Invalid character {c:?} in device name {name:?}"));
    }
    Ok(())
}

/// Device name to owning identity identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnershipMap {
    owners: BTreeMap<String, String>,
}

impl OwnershipMap {
    /// Read ownership out of instance config.
    pub fn from_config(config: &InstanceConfig) -> Self {
        let owners = config
            .iter()
            .filter(|(_, owner)| !owner.is_empty())
            .filter_map(|(key, owner)| {
                parse_owner_key(key).map(|device| (device.to_string(), owner.clone()))
            })
            .collect();
        Self { owners }
    }

    /// Owner of `device`, if any.
    pub fn owner(&self, device: &str) -> Option<&str> {
        self.owners.get(device).map(String::as_str)
    }

    /// Whether `identifier` owns `device`.
    pub fn is_owned_by(&self, device: &str, identifier: &str) -> bool {
        self.owner(device) == Some(identifier)
    }

    /// Record `identifier` as the owner of `device`.
    pub fn set_owner(&mut self, device: &str, identifier: &str) {
        self.owners.insert(device.to_string(), identifier.to_string());
    }

    /// Forget the owner of `device`.
    pub fn clear(&mut self, device: &str) {
        self.owners.remove(device);
    }

    /// Devices owned by `identifier`.
    pub fn owned_by<'a>(&'a self, identifier: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.owners
            .iter()
            .filter(move |(_, owner)| owner.as_str() == identifier)
            .map(|(device, _)| device.as_str())
    }

    /// Replace every owner key in `config` with this map.
    pub fn write_into(&self, config: &mut InstanceConfig) {
        config.retain(|key, _| parse_owner_key(key).is_none());
        for (device, owner) in &self.owners {
            config.insert(owner_key(device), owner.clone());
        }
    }

    /// Number of owned devices.
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// Returns true if no device is owned.
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}
