//! # Operations
//!
//! Background operations tracked by the host, and the reduced projection
//! that is allowed to cross the guest boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Lifecycle state of an operation, with its numeric status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationStatus {
    Pending,
    Running,
    Cancelling,
    Success,
    Failure,
    Cancelled,
}

impl OperationStatus {
    /// Numeric status code.
    pub fn code(&self) -> u16 {
        match self {
            Self::Running => 103,
            Self::Cancelling => 104,
            Self::Pending => 105,
            Self::Success => 200,
            Self::Failure => 400,
            Self::Cancelled => 401,
        }
    }

    /// Returns true once the operation can no longer change state.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Success | Self::Failure | Self::Cancelled)
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "Pending",
            Self::Running => "Running",
            Self::Cancelling => "Cancelling",
            Self::Success => "Success",
            Self::Failure => "Failure",
            Self::Cancelled => "Cancelled",
        };
        f.write_str(s)
    }
}

/// Full internal operation record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub id: Uuid,
    /// `task`, `websocket` or `token`.
    pub class: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: OperationStatus,
    /// Resource URLs touched by the operation, keyed by resource kind.
    pub resources: HashMap<String, Vec<String>>,
    /// Free-form operation metadata (request parameters, progress).
    pub metadata: serde_json::Value,
    pub may_cancel: bool,
    /// Failure message; empty unless the operation failed.
    pub err: String,
    /// Cluster member running the operation.
    pub location: String,
}

impl Operation {
    /// Create a pending task operation.
    pub fn new_task(description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            class: "task".to_string(),
            description: description.into(),
            created_at: now,
            updated_at: now,
            status: OperationStatus::Pending,
            resources: HashMap::new(),
            metadata: serde_json::Value::Null,
            may_cancel: false,
            err: String::new(),
            location: "none".to_string(),
        }
    }
}

/// What a guest is allowed to learn about an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevLxdOperation {
    pub id: String,
    pub status: String,
    pub status_code: u16,
    pub err: String,
}

impl From<&Operation> for DevLxdOperation {
    fn from(op: &Operation) -> Self {
        Self {
            id: op.id.to_string(),
            status: op.status.to_string(),
            status_code: op.status.code(),
            err: op.err.clone(),
        }
    }
}
