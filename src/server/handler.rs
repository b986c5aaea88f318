//! Request handlers for the preview server.

use std::fs;
use std::path::{Path, PathBuf};

use axum::extract::{Query, State};
use axum::http::{header, HeaderValue, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use percent_encoding::percent_decode_str;
use tracing::{debug, info, instrument};

use crate::package::export_project;
use crate::validation::ValidationReport;

use super::types::{content_type, ActionError, AppState};
use super::{RESULTS_PAGE, WELCOME_FILE};

/// Validate the project and return the report, packaged sources attached on success.
#[instrument(skip_all)]
pub async fn export(State(state): State<AppState>) -> Result<Json<ValidationReport>, ActionError> {
    let project = state.project.clone();
    let report = tokio::task::spawn_blocking(move || export_project(&project)).await??;
    info!(status = ?report.status(), items = report.items().len(), "export finished");
    Ok(Json(report))
}

/// Merge the query parameters into `config.ini` and redirect to the results page.
#[instrument(skip_all)]
pub async fn init_config(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Response, ActionError> {
    let project = state.project.clone();
    tokio::task::spawn_blocking(move || project.merge_config(params)).await??;
    Ok((StatusCode::FOUND, [(header::LOCATION, RESULTS_PAGE)]).into_response())
}

/// Pin the latest generated game state as the replay module.
#[instrument(skip_all)]
pub async fn save_replay(State(state): State<AppState>) -> Result<StatusCode, ActionError> {
    let exporter = state.exporter.clone();
    tokio::task::spawn_blocking(move || exporter.save_replay()).await??;
    Ok(StatusCode::OK)
}

/// Map a request path to the relative file path to look up.
///
/// The path is percent-decoded first. Returns `None` for paths that are not
/// valid UTF-8 once decoded or that climb out of the roots.
pub fn requested_file(path: &str) -> Option<PathBuf> {
    let decoded = percent_decode_str(path).decode_utf8().ok()?;
    let trimmed = decoded.trim_start_matches('/');
    if trimmed.contains('\\') {
        return None;
    }
    if trimmed.split('/').any(|segment| segment == "..") {
        return None;
    }
    if trimmed.is_empty() || trimmed.ends_with('/') {
        return Some(Path::new(trimmed).join(WELCOME_FILE));
    }
    Some(PathBuf::from(trimmed))
}

/// Serve a static file from the first root that has it.
pub async fn static_file(State(state): State<AppState>, uri: Uri) -> Response {
    let Some(relative) = requested_file(uri.path()) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let roots = state.roots.clone();
    let lookup = tokio::task::spawn_blocking(move || {
        let found = roots
            .resolve(&relative)
            .or_else(|| roots.resolve(&relative.join(WELCOME_FILE)))?;
        let bytes = fs::read(&found).ok()?;
        Some((found, bytes))
    })
    .await;

    match lookup {
        Ok(Some((path, bytes))) => {
            debug!(path = %path.display(), "static hit");
            let mut response = bytes.into_response();
            response.headers_mut().insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static(content_type(&path)),
            );
            response
        }
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Disable client caching on every response.
pub async fn no_cache(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-store, must-revalidate"),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
    response
}
