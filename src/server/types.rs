//! Shared state and response types for the preview server.

use std::path::Path;
use std::sync::Arc;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::warn;

use crate::error::ArbiterError;
use crate::project::Project;
use crate::view::{ResourceRoots, ViewExporter};

/// State shared by every request handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub project: Arc<Project>,
    pub roots: Arc<ResourceRoots>,
    pub exporter: Arc<ViewExporter>,
}

impl AppState {
    pub fn new(project: Project, roots: ResourceRoots, exporter: ViewExporter) -> Self {
        Self {
            project: Arc::new(project),
            roots: Arc::new(roots),
            exporter: Arc::new(exporter),
        }
    }
}

/// A failed action, reported to the client as `400 text/plain`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionError {
    pub message: String,
}

impl ActionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<ArbiterError> for ActionError {
    fn from(err: ArbiterError) -> Self {
        Self::new(err.to_string())
    }
}

impl From<tokio::task::JoinError> for ActionError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::new(format!("Action aborted: {}", err))
    }
}

impl IntoResponse for ActionError {
    fn into_response(self) -> Response {
        warn!(error = %self.message, "action failed");
        (
            StatusCode::BAD_REQUEST,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.message,
        )
            .into_response()
    }
}

/// Content type for a static file, by extension.
pub fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "mp3" => "audio/mpeg",
        "ogg" => "audio/ogg",
        "wav" => "audio/wav",
        "txt" | "md" => "text/plain; charset=utf-8",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}
