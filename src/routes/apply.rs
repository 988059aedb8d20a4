use std::net::SocketAddr;

use axum::body::Bytes;
use axum::extract::{ConnectInfo, RawQuery, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use serde_json::json;

use crate::error::AppError;
use crate::intake::{self, parser};
use crate::models::TrackingParams;
use crate::state::SharedState;

pub async fn apply(
    State(state): State<SharedState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let application = parser::parse(&headers, body)
        .await
        .map_err(AppError::BadRequest)?;

    let tracking = TrackingParams::from_query(
        query.as_deref().unwrap_or(""),
        &state.config.tracking_keys,
    );

    let result = intake::run(&state, &headers, addr.ip(), application, tracking).await?;

    let wants_json = headers
        .get("accept")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("application/json"));

    if wants_json {
        return Ok((
            StatusCode::CREATED,
            Json(json!({
                "status": "created",
                "submission_id": result.submission_id,
                "redirect_url": result.redirect_url,
            })),
        )
            .into_response());
    }

    Ok(Redirect::to(&result.redirect_url).into_response())
}
