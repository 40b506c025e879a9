//! HelioWatch - Solar/Wind Generation Monitoring
//!
//! Polls a hosted backend for generation telemetry, degrades to synthesized
//! demo data when none is configured, and serves a dashboard over HTTP.

mod backend;
mod config;
mod controller;
mod data;
mod web;

use config::Config;
use controller::RealtimeController;
use web::Server;

use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("heliowatch=info".parse()?))
        .init();

    // Load configuration
    let cfg = Config::load();
    tracing::info!("Starting HelioWatch on port {}...", cfg.http_port);

    // Resolve the backend handle (live client or demo-mode stand-in)
    let backend = backend::handle();

    // Start the realtime acquisition controller
    let controller = Arc::new(RealtimeController::new(
        backend.clone(),
        Duration::from_millis(cfg.refresh_ms),
    ));
    controller.start();

    // Start web server
    let server = Server::new(cfg, backend, controller);
    server.start().await?;

    Ok(())
}
