pub mod client_ip;
pub mod parser;

use std::net::IpAddr;

use axum::http::HeaderMap;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{NewSubmission, TrackingParams};
use crate::relay::RelayTicket;
use crate::state::SharedState;

use parser::ParsedApplication;

pub struct IntakeResult {
    pub submission_id: Uuid,
    pub redirect_url: String,
    pub relay: Option<RelayTicket>,
}

/// Store the application, hand it to the relay scheduler, and work out where to
/// send the applicant. Only storage failures reach the caller; the relay runs
/// on its own.
pub async fn run(
    state: &SharedState,
    headers: &HeaderMap,
    peer: IpAddr,
    application: ParsedApplication,
    tracking: TrackingParams,
) -> Result<IntakeResult, AppError> {
    let ip = client_ip::extract(headers, peer, &state.config.trusted_proxies);
    state
        .submission_limiter
        .check(ip, state.config.rate_limit, state.config.rate_limit_window_secs)
        .map_err(AppError::RateLimited)?;

    let resume_ref = match &application.resume {
        Some(upload) => Some(state.files.save(&upload.file_name, &upload.contents).await?),
        None => None,
    };

    let new = NewSubmission {
        fields: application.fields,
        resume_ref: resume_ref.clone(),
    };
    let record = match state.store.create(new).await {
        Ok(record) => record,
        Err(e) => {
            if let Some(reference) = &resume_ref {
                state.files.remove(reference).await;
            }
            return Err(e.into());
        }
    };

    tracing::info!(
        "Stored submission {} (resume: {})",
        record.id,
        record.resume_ref.as_deref().unwrap_or("none")
    );

    let redirect_url = tracking.append_to(&state.config.relay.thank_you_url);

    let relay = match state
        .scheduler
        .relay(record.id, tracking, state.config.relay.mode)
        .await
    {
        Ok(ticket) => Some(ticket),
        Err(e) => {
            tracing::error!("Failed to schedule relay for submission {}: {e}", record.id);
            None
        }
    };

    Ok(IntakeResult {
        submission_id: record.id,
        redirect_url,
        relay,
    })
}
