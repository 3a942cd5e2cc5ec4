//! Error types for the a11ycheck library.
//!
//! Two distinct error types reflect the two points where this service talks
//! to the outside world:
//!
//! * [`ExtractError`]: the structure engine could not produce a
//!   [`crate::structure::DocumentStructure`]. **Recovered locally**: the HTTP
//!   layer substitutes a placeholder note for the structure report and the
//!   analysis stream still runs, so the agent produces a best-effort report.
//!
//! * [`AgentError`]: the generative-agent call failed, before or during
//!   streaming. **Terminal for the request**: surfaced as a single error
//!   frame inside an otherwise-successful SSE stream, after which the stream
//!   ends. There is no retry policy anywhere in this service.
//!
//! Client errors at the HTTP boundary (wrong extension, oversized upload) are
//! handled by [`crate::server::ApiError`] and never reach these types.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to extract document structure from an uploaded PDF.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The parsing engine rejected or choked on the document.
    #[error("PDF parse failed for '{filename}': {detail}")]
    Parse { filename: String, detail: String },

    /// The engine parsed the document but could not render its markdown.
    #[error("markdown render failed for '{filename}': {detail}")]
    Render { filename: String, detail: String },

    /// The upload could not be staged to, or read back from, its temp file.
    #[error("temp file i/o failed for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The blocking extraction task was cancelled or panicked.
    #[error("extraction task failed: {0}")]
    Task(String),
}

/// Failure of the generative-agent call, at any point of the stream.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The request could not be built (e.g. missing API key).
    #[error("agent is not configured: {0}")]
    NotConfigured(String),

    /// Transport-level failure talking to the agent API.
    #[error("agent request failed: {0}")]
    Transport(String),

    /// The agent API answered with a non-success status.
    #[error("agent API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The stream carried a payload this client could not decode.
    #[error("malformed agent stream event: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for AgentError {
    fn from(e: reqwest::Error) -> Self {
        AgentError::Transport(e.to_string())
    }
}
