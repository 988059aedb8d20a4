use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use formrelay::config::Config;
use formrelay::db::{MemorySubmissionStore, PgSubmissionStore, SubmissionStore};
use formrelay::relay::status;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let config = Config::from_env().expect("Failed to load configuration");

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(&config.log_level)
        }))
        .init();

    tracing::info!("Starting formrelay (relay target: {})", config.relay.target_url);

    let store: Arc<dyn SubmissionStore> = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(url)
                .await
                .expect("Failed to connect to database");

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .expect("Failed to run migrations");

            tracing::info!("Migrations applied");
            Arc::new(PgSubmissionStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, submissions are kept in memory only");
            Arc::new(MemorySubmissionStore::new())
        }
    };

    // Relays in flight when the process last stopped never finish.
    match status::summarize(store.as_ref()).await {
        Ok(summary) if summary.processing > 0 => tracing::warn!(
            "{} submission(s) stuck in processing from a previous run",
            summary.processing
        ),
        Ok(_) => {}
        Err(e) => tracing::warn!("Could not read relay status at startup: {e}"),
    }

    let addr = SocketAddr::new(config.host, config.port);
    let (app, state) = formrelay::build_app(store, config);

    let limiter_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            limiter_state
                .submission_limiter
                .cleanup(Duration::from_secs(limiter_state.config.rate_limit_window_secs));
        }
    });

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    if state.scheduler.in_flight() > 0 {
        tracing::warn!(
            "Shutting down with {} relay(s) in flight; they will remain in processing",
            state.scheduler.in_flight()
        );
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
