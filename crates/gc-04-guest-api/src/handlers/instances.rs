//! `GET` and `PATCH /1.0/instances/{name}`
//!
//! Both answer with the caller's device view ETag in the `ETag` header.
//! `PATCH` honours `If-Match`; without it the write is unconditional.

use crate::domain::error::{ApiError, ApiResult};
use crate::domain::response::ResponseEnvelope;
use crate::service::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use gc_02_device_ownership::{quote, DevicePatch, DeviceView};
use serde::{Deserialize, Serialize};
use shared_types::Identity;

/// Body of `PATCH /1.0/instances/{name}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstancePatchRequest {
    /// Device name to new config, or `null` to remove
    #[serde(default)]
    pub devices: DevicePatch,
}

pub async fn get_instance(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Extension(caller): Extension<Identity>,
) -> ApiResult<Response> {
    let view = state.devices.get_instance(&name, &caller).await?;
    let metadata = serde_json::to_value(&view).map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(with_etag(&view, ResponseEnvelope::sync(metadata)))
}

pub async fn patch_instance(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Extension(caller): Extension<Identity>,
    headers: HeaderMap,
    body: Result<Json<InstancePatchRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let if_match = headers
        .get(header::IF_MATCH)
        .map(|value| value.to_str())
        .transpose()
        .map_err(|_| ApiError::BadRequest("If-Match is not valid ASCII".into()))?;

    let view = state
        .devices
        .patch_instance(&name, request.devices, &caller, if_match)
        .await?;
    Ok(with_etag(&view, ResponseEnvelope::empty()))
}

fn with_etag(view: &DeviceView, envelope: ResponseEnvelope) -> Response {
    ([(header::ETAG, quote(&view.etag))], envelope).into_response()
}
