pub mod applications;
pub mod apply;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::error::AppError;
use crate::relay::status::{self, StatusSummary};
use crate::state::SharedState;

pub fn intake_routes() -> Router<SharedState> {
    Router::new().route("/apply", post(apply::apply))
}

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        .route("/api/v1/applications", get(applications::list))
        .route("/api/v1/applications/{id}", get(applications::get))
        .route("/api/v1/applications/{id}/relay", post(applications::relay))
        .route("/api/v1/relay/status", get(relay_status))
}

pub async fn relay_status(
    State(state): State<SharedState>,
) -> Result<Json<StatusSummary>, AppError> {
    Ok(Json(status::summarize(state.store.as_ref()).await?))
}
