//! `GET /1.0/operations/{id}/wait`

use crate::domain::error::{ApiError, ApiResult};
use crate::domain::response::ResponseEnvelope;
use crate::service::AppState;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct WaitQuery {
    /// Seconds to wait; negative or absent waits until the operation ends.
    pub timeout: Option<i64>,
}

pub async fn wait_operation(
    State(state): State<AppState>,
    Path(id): Path<String>,
    query: Result<Query<WaitQuery>, QueryRejection>,
) -> ApiResult<ResponseEnvelope> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let timeout = query.timeout.unwrap_or(-1);

    let operation = state.operations.wait(&id, timeout).await?;
    let metadata = serde_json::to_value(&operation).map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(ResponseEnvelope::sync(metadata))
}
