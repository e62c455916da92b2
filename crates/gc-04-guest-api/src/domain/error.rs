//! API errors and their HTTP mapping.
//!
//! | Status | Variant              | Raised by                                        |
//! |--------|----------------------|--------------------------------------------------|
//! | 400    | `BadRequest`         | malformed JSON, bad query, bad device name, `WaitError::InvalidId`|
//! | 401    | `Unauthenticated`    | missing/foreign token, unknown identity          |
//! | 403    | `Forbidden`          | wrong identity type, bad token, device denied    |
//! | 404    | `NotFound`           | unknown instance, operation or path              |
//! | 412    | `PreconditionFailed` | stale `If-Match`, concurrent write               |
//! | 501    | `NotImplemented`     | unsupported method                               |
//! | 500    | `Internal`           | everything else                                  |

use crate::domain::response::ResponseEnvelope;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use gc_01_bearer_auth::AuthError;
use gc_02_device_ownership::OwnershipError;
use gc_03_operation_wait::WaitError;
use shared_bus::HubError;
use thiserror::Error;
use tracing::{debug, warn};

/// Error returned by every guest API handler.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    PreconditionFailed(String),

    #[error("{0}")]
    NotImplemented(String),

    #[error("{0}")]
    Internal(String),
}

/// Result alias for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::PreconditionFailed(_) => StatusCode::PRECONDITION_FAILED,
            Self::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            debug!(status = status.as_u16(), error = %self, "Request rejected");
        }

        let mut response = ResponseEnvelope::error(status, self.to_string()).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unauthenticated | AuthError::IdentityNotFound => {
                Self::Unauthenticated(err.to_string())
            }
            AuthError::WrongIdentityType { .. } | AuthError::TokenInvalid => {
                Self::Forbidden(err.to_string())
            }
            AuthError::Issue(_) => Self::Internal("failed to issue token".to_string()),
        }
    }
}

impl From<OwnershipError> for ApiError {
    fn from(err: OwnershipError) -> Self {
        match err {
            OwnershipError::InstanceNotFound(_) => Self::NotFound(err.to_string()),
            OwnershipError::BadRequest(_) => Self::BadRequest(err.to_string()),
            OwnershipError::Forbidden(_) => Self::Forbidden(err.to_string()),
            OwnershipError::PreconditionFailed => Self::PreconditionFailed(err.to_string()),
            OwnershipError::Internal(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<WaitError> for ApiError {
    fn from(err: WaitError) -> Self {
        match err {
            WaitError::InvalidId(_) => Self::BadRequest(err.to_string()),
            WaitError::NotFound(_) => Self::NotFound(err.to_string()),
            WaitError::Internal(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<HubError> for ApiError {
    fn from(err: HubError) -> Self {
        Self::Internal(format!("event stream unavailable: {err}"))
    }
}
