pub mod config;
pub mod db;
pub mod error;
pub mod files;
pub mod intake;
pub mod models;
pub mod rate_limit;
pub mod relay;
pub mod routes;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::SubmissionStore;
use crate::files::FileStore;
use crate::rate_limit::SubmissionRateLimiter;
use crate::relay::{HttpRelayClient, RelayClient, RelayScheduler, TimingModel};
use crate::state::{AppState, SharedState};

/// Build the router with the HTTP relay client pointed at the configured target.
pub fn build_app(store: Arc<dyn SubmissionStore>, config: Config) -> (Router, SharedState) {
    let files = FileStore::new(&config.upload_dir);
    let client = Arc::new(HttpRelayClient::new(
        config.relay.target_url.clone(),
        Duration::from_secs(config.relay.timeout_secs),
        files,
    ));
    build_app_with_client(store, client, config)
}

pub fn build_app_with_client(
    store: Arc<dyn SubmissionStore>,
    client: Arc<dyn RelayClient>,
    config: Config,
) -> (Router, SharedState) {
    let scheduler = RelayScheduler::new(
        store.clone(),
        client,
        TimingModel::new(config.relay.disclosure_sections),
    );

    let state: SharedState = Arc::new(AppState {
        store,
        files: FileStore::new(&config.upload_dir),
        scheduler,
        submission_limiter: SubmissionRateLimiter::new(),
        config,
    });

    let static_dir = state.config.static_dir.clone();
    let upload_dir = state.config.upload_dir.clone();

    let app = Router::new()
        .merge(routes::api_routes())
        .merge(routes::intake_routes())
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .nest_service("/static", ServeDir::new(static_dir))
        .nest_service("/uploads", ServeDir::new(upload_dir))
        .route("/health", axum::routing::get(health))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .with_state(state.clone());

    (app, state)
}

async fn health() -> &'static str {
    "ok"
}
