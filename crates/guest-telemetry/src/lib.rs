//! # Guest Telemetry
//!
//! Structured logging for guest-channel binaries and tests.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use guest_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_telemetry(&config)?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GC_SERVICE_NAME` | `guest-channel` | Service name on every log line |
//! | `GC_LOG_LEVEL` / `RUST_LOG` | `info` | `EnvFilter` directive |
//! | `GC_JSON_LOGS` | `false` (`true` in containers) | JSON output |
//! | `GC_CONSOLE_OUTPUT` | `true` | Write logs to stdout |

mod config;

pub use config::TelemetryConfig;

#[doc(hidden)]
pub use tracing;

use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter: {0}")]
    Filter(String),

    #[error("Failed to install subscriber: {0}")]
    Install(String),
}

/// Install the global `tracing` subscriber.
///
/// Fails if the filter does not parse or a subscriber is already installed.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = build_filter(&config.log_level)?;

    // Each branch has a different layer type, so each installs on its own.
    let installed = match (config.console_output, config.json_logs) {
        (false, _) => tracing_subscriber::registry().with(env_filter).try_init(),
        (true, true) => {
            let json_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true);
            tracing_subscriber::registry()
                .with(env_filter)
                .with(json_layer)
                .try_init()
        }
        (true, false) => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_ansi(true);
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()
        }
    };
    installed.map_err(|e| TelemetryError::Install(e.to_string()))?;

    tracing::info!(
        service = %config.service_name,
        json_logs = config.json_logs,
        "Telemetry initialized"
    );
    Ok(())
}

/// Parse a filter directive.
pub fn build_filter(directive: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(directive).map_err(|e| TelemetryError::Filter(e.to_string()))
}

/// Log an event tagged with the emitting subsystem.
///
/// ```rust,ignore
/// log_event!(info, "gc-02", "Applied device patch", instance = %name);
/// ```
#[macro_export]
macro_rules! log_event {
    (info, $subsystem:expr, $msg:expr $(, $($field:tt)*)?) => {
        $crate::tracing::info!(subsystem = $subsystem, $($($field)*,)? $msg)
    };
    (warn, $subsystem:expr, $msg:expr $(, $($field:tt)*)?) => {
        $crate::tracing::warn!(subsystem = $subsystem, $($($field)*,)? $msg)
    };
    (error, $subsystem:expr, $msg:expr $(, $($field:tt)*)?) => {
        $crate::tracing::error!(subsystem = $subsystem, $($($field)*,)? $msg)
    };
    (debug, $subsystem:expr, $msg:expr $(, $($field:tt)*)?) => {
        $crate::tracing::debug!(subsystem = $subsystem, $($($field)*,)? $msg)
    };
}
