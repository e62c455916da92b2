//! In-memory instance backend.
//!
//! Profiles are not modelled: profile-provided devices and config are
//! whatever sits in the expanded maps beyond the local ones, and survive
//! local writes unchanged.

use crate::domain::authorizer::InstanceUpdate;
use crate::domain::errors::BackendError;
use crate::ports::outbound::InstanceBackend;
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::Instance;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

/// Instance store for tests and single-process embedding.
#[derive(Debug, Default)]
pub struct InMemoryInstanceBackend {
    instances: RwLock<HashMap<String, Instance>>,
    revision: AtomicU64,
}

impl InMemoryInstanceBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_revision(&self) -> String {
        (self.revision.fetch_add(1, Ordering::Relaxed) + 1).to_string()
    }

    /// Insert or replace an instance. Local devices and config are merged
    /// into the expanded maps, and a fresh revision is assigned.
    pub fn insert(&self, mut instance: Instance) {
        for (name, device) in &instance.devices {
            instance.expanded_devices.insert(name.clone(), device.clone());
        }
        for (key, value) in &instance.config {
            instance.expanded_config.insert(key.clone(), value.clone());
        }
        instance.revision = self.next_revision();
        self.instances.write().insert(instance.name.clone(), instance);
    }

    /// Current snapshot of an instance.
    pub fn get(&self, name: &str) -> Option<Instance> {
        self.instances.read().get(name).cloned()
    }
}

/// `expanded - old_local + new_local`
fn rebase<V: Clone>(
    expanded: &BTreeMap<String, V>,
    old_local: &BTreeMap<String, V>,
    new_local: &BTreeMap<String, V>,
) -> BTreeMap<String, V> {
    let mut out: BTreeMap<String, V> = expanded
        .iter()
        .filter(|(key, _)| !old_local.contains_key(*key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    out.extend(new_local.iter().map(|(k, v)| (k.clone(), v.clone())));
    out
}

#[async_trait]
impl InstanceBackend for InMemoryInstanceBackend {
    async fn get_instance(&self, name: &str) -> Result<Instance, BackendError> {
        self.get(name)
            .ok_or_else(|| BackendError::NotFound(name.to_string()))
    }

    async fn update_instance(&self, update: InstanceUpdate) -> Result<Instance, BackendError> {
        let mut instances = self.instances.write();
        let current = instances
            .get_mut(&update.name)
            .ok_or_else(|| BackendError::NotFound(update.name.clone()))?;

        if current.revision != update.expected_revision {
            return Err(BackendError::RevisionConflict);
        }

        current.expanded_devices = rebase(&current.expanded_devices, &current.devices, &update.devices);
        current.expanded_config = rebase(&current.expanded_config, &current.config, &update.config);
        current.devices = update.devices;
        current.config = update.config;
        current.revision = self.next_revision();

        Ok(current.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::DeviceConfig;

    fn update(name: &str, revision: &str) -> InstanceUpdate {
        InstanceUpdate {
            name: name.into(),
            expected_revision: revision.into(),
            devices: Default::default(),
            config: Default::default(),
        }
    }

    #[tokio::test]
    async fn test_compare_and_swap() {
        let backend = InMemoryInstanceBackend::new();
        backend.insert(Instance::new("vm1"));
        let revision = backend.get("vm1").unwrap().revision;

        let updated = backend.update_instance(update("vm1", &revision)).await.unwrap();
        assert_ne!(updated.revision, revision);

        assert_eq!(
            backend.update_instance(update("vm1", &revision)).await,
            Err(BackendError::RevisionConflict)
        );
        assert_eq!(
            backend.update_instance(update("vm9", "1")).await,
            Err(BackendError::NotFound("vm9".into()))
        );
    }

    #[tokio::test]
    async fn test_profile_devices_survive_local_writes() {
        let backend = InMemoryInstanceBackend::new();
        let mut inst = Instance::new("vm1");
        inst.expanded_devices.insert("root".into(), DeviceConfig::from([("type".to_string(), "disk".to_string())]));
        inst.devices.insert("local".into(), DeviceConfig::new());
        backend.insert(inst);

        let revision = backend.get("vm1").unwrap().revision;
        let updated = backend.update_instance(update("vm1", &revision)).await.unwrap();

        assert!(updated.devices.is_empty());
        assert_eq!(updated.expanded_devices.keys().collect::<Vec<_>>(), vec!["root"]);
    }
}
