//! HTTP surface: upload validation, temp-file handling, and the SSE response.
//!
//! One substantive endpoint, `POST /analyze`, orchestrates the sequential
//! pipeline: validate upload → write temp file → extract structure → format
//! prompt → stream the report. `GET /` and `GET /health` are probes.
//!
//! ## Failure policy
//!
//! Client errors (wrong extension, oversized body, malformed multipart) are
//! rejected with HTTP 400 *before* any temp file exists. An extraction
//! failure is deliberately NOT a request failure: the structure report is
//! replaced by a short placeholder note and generation proceeds, so the
//! client still receives a best-effort report. Only agent failures surface
//! inside the stream itself.
//!
//! ## Temp-file lifecycle
//!
//! The upload is written to a [`tempfile::NamedTempFile`], which unlinks on
//! drop. The file is dropped after extraction and before the response stream
//! is constructed, so it is gone on every exit path: success, extraction
//! failure, or panic unwind.

use crate::agent::AgentClient;
use crate::config::AppConfig;
use crate::error::ExtractError;
use crate::pipeline::extract::Extractor;
use crate::pipeline::format::format_structure;
use crate::prompts::CheckType;
use crate::stream::{stream_analysis, FrameStream};
use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use futures::StreamExt;
use serde_json::json;
use std::convert::Infallible;
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Shared per-process state. Cheap to clone; handlers get one clone each.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub extractor: Extractor,
    pub agent: Arc<dyn AgentClient>,
}

impl AppState {
    pub fn new(config: AppConfig, agent: Arc<dyn AgentClient>) -> Self {
        let extractor = Extractor::new(config.extract_concurrency);
        Self {
            config: Arc::new(config),
            extractor,
            agent,
        }
    }
}

/// Build the service router.
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);
    // The multipart envelope adds boundary overhead on top of the file
    // payload, and oversized files must reach our own size check to get a
    // 400 with a readable detail string instead of a bare 413.
    let body_limit = state.config.max_upload_bytes.saturating_mul(2);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/analyze", post(analyze))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "ignoring unparsable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

// ── Errors ───────────────────────────────────────────────────────────────

/// A client error at the HTTP boundary, surfaced as `{"detail": …}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: detail.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────

async fn root() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "message": "a11ycheck API is running" }))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}

/// Analyze a PDF for accessibility and/or formatting compliance.
///
/// Multipart fields: `file` (required, must be a `.pdf`) and `check_type`
/// (optional, defaults to `both`). Responds with an SSE stream.
async fn analyze(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut upload: Option<(String, Bytes)> = None;
    let mut check = CheckType::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| ApiError::bad_request("'file' field has no filename"))?;

                // Extension check first: a bad name is rejected before the
                // body is even read, and long before any temp file exists.
                if !filename.to_lowercase().ends_with(".pdf") {
                    return Err(ApiError::bad_request(
                        "Only PDF files are supported. Please upload a .pdf file.",
                    ));
                }

                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("failed to read upload: {e}")))?;

                if bytes.len() > state.config.max_upload_bytes {
                    return Err(ApiError::bad_request(
                        "File too large. Maximum size is 25MB.",
                    ));
                }

                upload = Some((filename, bytes));
            }
            "check_type" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("failed to read check_type: {e}")))?;
                check = value.parse().map_err(ApiError::bad_request)?;
            }
            _ => {}
        }
    }

    let (filename, bytes) =
        upload.ok_or_else(|| ApiError::bad_request("missing required field 'file'"))?;

    let structure_report = extract_report(&state, &filename, &bytes).await;
    let frames = stream_analysis(state.agent.clone(), check, structure_report);
    Ok(sse_response(frames))
}

/// Extract and format the structure report, downgrading failure to a note.
///
/// The temp file is dropped (and therefore unlinked) before this returns,
/// regardless of outcome.
async fn extract_report(state: &AppState, filename: &str, bytes: &[u8]) -> String {
    let tmp = match write_temp(bytes) {
        Ok(tmp) => tmp,
        Err(e) => {
            warn!("failed to stage upload: {e}");
            return extraction_failure_note(&e.to_string());
        }
    };

    let result = state.extractor.extract(tmp.path(), filename).await;
    drop(tmp);

    match result {
        Ok(structure) => format_structure(&structure),
        Err(e) => {
            warn!(filename, "structure extraction failed: {e}");
            extraction_failure_note(&e.to_string())
        }
    }
}

fn extraction_failure_note(detail: &str) -> String {
    format!("[PDF structure extraction failed: {detail}]")
}

fn write_temp(bytes: &[u8]) -> Result<NamedTempFile, ExtractError> {
    let mut tmp = tempfile::Builder::new()
        .suffix(".pdf")
        .tempfile()
        .map_err(|e| ExtractError::Io {
            path: std::env::temp_dir(),
            source: e,
        })?;
    tmp.write_all(bytes).and_then(|_| tmp.flush()).map_err(|e| {
        ExtractError::Io {
            path: tmp.path().to_path_buf(),
            source: e,
        }
    })?;
    Ok(tmp)
}

fn sse_response(frames: FrameStream) -> Response {
    let body = Body::from_stream(frames.map(Ok::<_, Infallible>));
    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        body,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[test]
    fn api_error_serialises_detail() {
        let resp = ApiError::bad_request("nope").into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn api_error_body_shape() {
        let resp = ApiError::bad_request("Only PDF files are supported.").into_response();
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["detail"], "Only PDF files are supported.");
    }

    #[test]
    fn failure_note_embeds_detail() {
        let note = extraction_failure_note("bad xref");
        assert_eq!(note, "[PDF structure extraction failed: bad xref]");
    }
}
