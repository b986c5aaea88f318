//! Local preview server.
//!
//! Serves the prepared view from layered resource roots and exposes the
//! authoring actions:
//!
//! - `GET /services/export`: validate, package on success, return the report as JSON
//! - `GET /services/init-config?key=value...`: merge into `config.ini`, redirect to the results page
//! - `GET /services/save-replay`: pin the latest game state as the replay module
//!
//! Any other path is a static lookup. Action failures come back as
//! `400 text/plain`; every response disables client caching.

mod handler;
mod types;


use std::net::SocketAddr;

use axum::middleware;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use crate::error::{ArbiterError, Result};

pub use handler::{no_cache, requested_file};
pub use types::{content_type, ActionError, AppState};

/// File served for directory requests.
pub const WELCOME_FILE: &str = "test.html";

/// Where init-config redirects once the config is written.
pub const RESULTS_PAGE: &str = "/export.html";

/// Prefix of the action endpoints.
pub const SERVICES_PREFIX: &str = "/services";

/// Build the router for a prepared preview.
pub fn router(state: AppState) -> Router {
    let services = Router::new()
        .route("/export", get(handler::export))
        .route("/init-config", get(handler::init_config))
        .route("/save-replay", get(handler::save_replay));

    Router::new()
        .nest(SERVICES_PREFIX, services)
        .fallback(handler::static_file)
        .layer(middleware::map_response(no_cache))
        .with_state(state)
}

/// Bind to the loopback interface and serve until Ctrl+C.
pub async fn serve(state: AppState, port: u16) -> Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = TcpListener::bind(addr).await.map_err(|e| ArbiterError::Io {
        path: addr.to_string().into(),
        message: format!("Failed to bind: {}", e),
    })?;

    info!(%addr, "preview server listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("preview server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}
