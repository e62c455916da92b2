//! Response envelope.
//!
//! ```json
//! {"type": "sync",  "status": "Success", "status_code": 200, "metadata": {...}, "error": "", "error_code": 0}
//! {"type": "error", "status": "",        "status_code": 0,   "metadata": null,  "error": "...", "error_code": 403}
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    Sync,
    Error,
}

/// Body of every guest API response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub status: String,
    pub status_code: u16,
    pub metadata: Value,
    pub error: String,
    pub error_code: u16,
}

impl ResponseEnvelope {
    /// Successful synchronous response carrying `metadata`.
    pub fn sync(metadata: Value) -> Self {
        Self {
            response_type: ResponseType::Sync,
            status: "Success".to_string(),
            status_code: StatusCode::OK.as_u16(),
            metadata,
            error: String::new(),
            error_code: 0,
        }
    }

    /// Successful response with an empty object as metadata.
    pub fn empty() -> Self {
        Self::sync(Value::Object(Default::default()))
    }

    /// Error response.
    pub fn error(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            response_type: ResponseType::Error,
            status: String::new(),
            status_code: 0,
            metadata: Value::Null,
            error: message.into(),
            error_code: code.as_u16(),
        }
    }

    /// HTTP status this envelope is sent with.
    pub fn http_status(&self) -> StatusCode {
        match self.response_type {
            ResponseType::Sync => StatusCode::OK,
            ResponseType::Error => {
                StatusCode::from_u16(self.error_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

impl IntoResponse for ResponseEnvelope {
    fn into_response(self) -> Response {
        (self.http_status(), Json(self)).into_response()
    }
}
