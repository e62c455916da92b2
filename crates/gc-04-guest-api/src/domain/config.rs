//! Guest API configuration with validation.
//!
//! Loaded from TOML, then overridden from `GC_*` environment variables:
//!
//! | Variable              | Field                 | Format             |
//! |-----------------------|-----------------------|--------------------|
//! | `GC_LISTEN`           | `listen`              | `ip:port`          |
//! | `GC_CLUSTER_UUID`     | `cluster_uuid`        | string             |
//! | `GC_TOKEN_LEEWAY`     | `token_leeway`        | humantime (`60s`)  |
//! | `GC_REAPER_INTERVAL`  | `hub_reaper_interval` | humantime          |
//! | `GC_EVENT_TARGET`     | `event_target`        | `host:port`        |
//! | `GC_MAX_WAIT`         | `max_wait`            | humantime          |

use gc_01_bearer_auth::DEFAULT_LEEWAY;
use humantime_serde::re::humantime;
use serde::{Deserialize, Serialize};
use shared_bus::{HubConfig, DEFAULT_REAPER_INTERVAL};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8443;

/// Guest API configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuestApiConfig {
    /// Address the guest API binds to
    pub listen: SocketAddr,
    /// Cluster the accepted tokens are issued for
    pub cluster_uuid: String,
    /// Clock-skew allowance on token `nbf`/`exp`
    #[serde(with = "humantime_serde")]
    pub token_leeway: Duration,
    /// How often the event hub closes idle connections
    #[serde(with = "humantime_serde")]
    pub hub_reaper_interval: Duration,
    /// Host endpoint events are read from
    pub event_target: String,
    /// Upper bound on operation waits (unset = unbounded)
    #[serde(with = "humantime_serde")]
    pub max_wait: Option<Duration>,
}

impl Default for GuestApiConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), DEFAULT_PORT),
            cluster_uuid: String::new(),
            token_leeway: DEFAULT_LEEWAY,
            hub_reaper_interval: DEFAULT_REAPER_INTERVAL,
            event_target: "127.0.0.1:8444".to_string(),
            max_wait: None,
        }
    }
}

impl GuestApiConfig {
    /// Parse TOML. Missing fields take their defaults.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&input)
    }

    /// Apply `GC_*` overrides from the process environment.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `GC_*` overrides from `lookup`.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("GC_LISTEN") {
            self.listen = value.parse().map_err(|_| ConfigError::InvalidValue {
                key: "GC_LISTEN",
                value,
            })?;
        }
        if let Some(value) = lookup("GC_CLUSTER_UUID") {
            self.cluster_uuid = value;
        }
        if let Some(value) = lookup("GC_TOKEN_LEEWAY") {
            self.token_leeway = parse_duration("GC_TOKEN_LEEWAY", value)?;
        }
        if let Some(value) = lookup("GC_REAPER_INTERVAL") {
            self.hub_reaper_interval = parse_duration("GC_REAPER_INTERVAL", value)?;
        }
        if let Some(value) = lookup("GC_EVENT_TARGET") {
            self.event_target = value;
        }
        if let Some(value) = lookup("GC_MAX_WAIT") {
            self.max_wait = Some(parse_duration("GC_MAX_WAIT", value)?);
        }
        Ok(self)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cluster_uuid.trim().is_empty() {
            return Err(ConfigError::Invalid("cluster_uuid is required".into()));
        }
        if self.hub_reaper_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "hub_reaper_interval cannot be 0".into(),
            ));
        }
        if self.event_target.trim().is_empty() {
            return Err(ConfigError::Invalid("event_target is required".into()));
        }
        if self.max_wait.is_some_and(|d| d.is_zero()) {
            return Err(ConfigError::Invalid("max_wait cannot be 0".into()));
        }
        Ok(())
    }

    /// Event hub settings.
    pub fn hub_config(&self) -> HubConfig {
        HubConfig {
            reaper_interval: self.hub_reaper_interval,
        }
    }
}

fn parse_duration(key: &'static str, value: String) -> Result<Duration, ConfigError> {
    humantime_serde::re::humantime::parse_duration(&value).map_err(|_| ConfigError::InvalidValue { key, value })
}

/// Configuration errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(String),

    #[error("failed to parse configuration: {0}")]
    Parse(String),

    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
