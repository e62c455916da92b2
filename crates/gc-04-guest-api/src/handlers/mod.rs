//! Request handlers, one module per resource.

pub mod instances;
pub mod operations;

use crate::domain::error::ApiError;
use axum::http::{Method, Uri};

/// Fallback for methods a known route does not serve.
pub async fn not_implemented(method: Method, uri: Uri) -> ApiError {
    ApiError::NotImplemented(format!("{method} {} is not implemented", uri.path()))
}

/// Fallback for unknown paths.
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("{} not found", uri.path()))
}
