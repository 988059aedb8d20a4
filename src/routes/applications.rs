use axum::extract::{Path, Query, RawQuery, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{SubmissionRecord, TrackingParams};
use crate::relay::{RelayMode, RelayTicket};
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct ListParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

pub async fn list(
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let page = params.page.unwrap_or(1).max(1);
    let per_page = params.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1)
        .checked_mul(per_page)
        .ok_or_else(|| AppError::BadRequest("page is out of range".to_string()))?;

    let applications = state.store.list(per_page, offset).await?;

    Ok(Json(json!({
        "applications": applications,
        "page": page,
        "per_page": per_page,
    })))
}

pub async fn get(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SubmissionRecord>, AppError> {
    let record = state
        .store
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Application not found".to_string()))?;
    Ok(Json(record))
}

#[derive(Deserialize)]
pub struct RelayParams {
    pub mode: Option<String>,
}

/// Start a relay for a record that is still `pending`, e.g. one left behind by
/// a failed scheduling attempt. Terminal and in-flight records are refused.
pub async fn relay(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Query(params): Query<RelayParams>,
    RawQuery(query): RawQuery,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let mode = match params.mode.as_deref() {
        Some(raw) => RelayMode::parse(raw)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown relay mode: {raw}")))?,
        None => state.config.relay.mode,
    };
    let tracking = TrackingParams::from_query(
        query.as_deref().unwrap_or(""),
        &state.config.tracking_keys,
    );

    let ticket = state
        .scheduler
        .relay(id, tracking, mode)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    match ticket {
        RelayTicket::Spawned(_) => Ok((
            StatusCode::ACCEPTED,
            Json(json!({ "status": "accepted", "mode": mode })),
        )),
        RelayTicket::InFlight => Err(AppError::Conflict("Relay already in progress".to_string())),
        RelayTicket::NotPending(status) => Err(AppError::Conflict(format!(
            "Application is already {status}"
        ))),
        RelayTicket::NotFound => Err(AppError::NotFound("Application not found".to_string())),
    }
}
