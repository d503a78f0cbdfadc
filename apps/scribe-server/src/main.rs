//! # Scribe API Server
//!
//! The main entry point for the Actix-web HTTP server. Serves the blog posts
//! mirrored by the content store and forwards writes to the remote store.

use actix_web::{App, HttpServer, web};
use anyhow::Context;
use tracing_actix_web::TracingLogger;

mod config;
mod handlers;
mod middleware;
mod observability;
mod state;
mod telemetry;

use config::AppConfig;
use observability::RequestIdMiddleware;
use state::AppState;
use telemetry::TelemetryConfig;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    telemetry::init_telemetry(&TelemetryConfig::from_env());

    let config = AppConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = config.port,
        backend = %config.remote.backend,
        "Starting Scribe API Server"
    );

    let state = AppState::new(&config);

    // A failed subscription leaves the store in its error state; reads still work
    if let Err(e) = state.store.subscribe().await {
        tracing::error!(error = %e, "Initial store subscription failed");
    }

    let data = web::Data::new(state.clone());
    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .wrap(RequestIdMiddleware)
            .app_data(data.clone())
            .configure(handlers::configure_routes)
    })
    .bind((config.host.as_str(), config.port))
    .with_context(|| format!("failed to bind {}:{}", config.host, config.port))?
    .run();

    let result = server.await.context("HTTP server failed");

    state.store.shutdown().await;
    tracing::info!("Scribe API Server stopped");
    result
}
