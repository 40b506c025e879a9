//! Web server module.

mod handlers;

pub use handlers::*;

use crate::backend::BackendApi;
use crate::config::Config;
use crate::controller::RealtimeController;

use axum::{
    extract::DefaultBodyLimit,
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub backend: Arc<dyn BackendApi>,
    pub controller: Arc<RealtimeController>,
}

/// Web server for HelioWatch.
pub struct Server {
    state: AppState,
}

impl Server {
    /// Create a new server with the given dependencies.
    pub fn new(
        config: Config,
        backend: Arc<dyn BackendApi>,
        controller: Arc<RealtimeController>,
    ) -> Self {
        Self {
            state: AppState {
                config,
                backend,
                controller,
            },
        }
    }

    /// Build the router with all routes.
    fn routes(&self) -> Router {
        let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any);

        Router::new()
            // Dashboard
            .route("/", get(handlers::handle_dashboard))
            // API endpoints
            .route("/api/data", get(handlers::handle_get_data))
            .route("/api/stations", get(handlers::handle_get_stations))
            .route(
                "/api/init-data",
                get(handlers::handle_init_data_info).post(handlers::handle_init_data),
            )
            // Static assets
            .route("/favicon.ico", get(handlers::handle_favicon))
            .layer(cors)
            .layer(DefaultBodyLimit::max(1024 * 1024)) // 1MB
            .with_state(self.state.clone())
    }

    /// Start the server on the configured port.
    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.state.config.http_port));
        let router = self.routes();

        tracing::info!("Web server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router).await?;

        Ok(())
    }
}
