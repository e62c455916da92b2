//! Hub configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default idle-reaper interval.
pub const DEFAULT_REAPER_INTERVAL: Duration = Duration::from_secs(60);

/// Tuning for an [`EventHub`](crate::EventHub).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// How often each connection's reaper checks for zero listeners.
    ///
    /// An idle connection lingers for at most one interval.
    #[serde(with = "humantime_serde")]
    pub reaper_interval: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            reaper_interval: DEFAULT_REAPER_INTERVAL,
        }
    }
}
