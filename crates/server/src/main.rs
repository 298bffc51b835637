use std::{future::IntoFuture, time::Duration};

use anyhow::Context;
use db::DBService;
use server::{AppState, http, shutdown::Shutdown};
use services::services::{config::AuctionConfig, sweep::spawn_sweep_worker};
use tracing_subscriber::{EnvFilter, prelude::*};

const GRACEFUL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_PORT: u16 = 3001;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let filter_string = format!(
        "warn,server={level},services={level},db={level}",
        level = log_level
    );
    let env_filter =
        EnvFilter::try_new(filter_string).context("Failed to create tracing filter")?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(env_filter))
        .init();

    let db = DBService::new().await?;
    let config = AuctionConfig::from_env();
    tracing::info!(
        duration_secs = config.duration.as_secs(),
        stall_window_secs = config.stall_window.as_secs(),
        max_extensions = config.max_extensions,
        sweep_interval_secs = config.sweep_interval.as_secs(),
        "Auction settings loaded"
    );

    let state = AppState::new(db, config);
    let sweep_worker = spawn_sweep_worker(state.auctions().clone());
    let app_router = http::router(state);

    let port = read_port();
    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let listener = tokio::net::TcpListener::bind(format!("{host}:{port}"))
        .await
        .with_context(|| format!("Failed to bind {host}:{port}"))?;
    let actual_port = listener.local_addr()?.port();
    tracing::info!("Server running on http://{host}:{actual_port}");

    let shutdown = Shutdown::listen();
    let server = axum::serve(listener, app_router)
        .with_graceful_shutdown(shutdown.clone().draining())
        .into_future();
    tokio::pin!(server);

    let serve_result = tokio::select! {
        res = &mut server => res,
        _ = shutdown.forced() => {
            tracing::warn!("Forced shutdown, exiting immediately");
            std::process::exit(130);
        }
        _ = shutdown.grace_expired(GRACEFUL_SHUTDOWN_TIMEOUT) => {
            tracing::warn!(
                "Graceful shutdown timed out after {:?}, exiting immediately",
                GRACEFUL_SHUTDOWN_TIMEOUT
            );
            std::process::exit(130);
        }
    };

    sweep_worker.abort();
    serve_result?;
    tracing::info!("Server stopped");
    Ok(())
}

fn read_port() -> u16 {
    let Ok(raw) = std::env::var("PORT") else {
        return DEFAULT_PORT;
    };
    match raw.trim().parse::<u16>() {
        Ok(port) => port,
        Err(err) => {
            tracing::warn!(value = raw.trim(), error = %err, "Invalid PORT; using default");
            DEFAULT_PORT
        }
    }
}
