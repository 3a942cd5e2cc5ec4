//! # a11ycheck
//!
//! Check PDF documents for accessibility (WCAG 2.1 AA) and dissertation
//! formatting compliance, streaming an LLM-generated report over
//! Server-Sent Events.
//!
//! ## Why structure-first?
//!
//! Feeding a raw PDF to a language model wastes tokens and hides exactly the
//! facts a compliance review needs: which text is *tagged* as a heading,
//! whether a table has a *marked* header row, whether an image carries alt
//! text. This crate extracts those facts deterministically with a PDF
//! structure engine and hands the agent a compact, bounded report instead of
//! the document itself.
//!
//! ## Pipeline Overview
//!
//! ```text
//! POST /analyze
//!  │
//!  ├─ 1. Validate  .pdf extension, 25 MiB cap (reject with 400 before work)
//!  ├─ 2. Stage     upload → scoped temp file (always deleted)
//!  ├─ 3. Extract   headings / tables / images / reading order (unpdf,
//!  │               spawn_blocking behind a bounded semaphore)
//!  ├─ 4. Format    structure → one bounded prompt block (pure)
//!  └─ 5. Stream    one agent request, events relayed verbatim as SSE,
//!                  terminated by `data: [DONE]`
//! ```
//!
//! Extraction failure is downgraded to a placeholder note inside the prompt;
//! the client still gets an HTTP 200 stream and a best-effort report.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use a11ycheck::{AnthropicClient, AppConfig, AppState};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::builder()
//!         .api_key(std::env::var("ANTHROPIC_API_KEY")?)
//!         .build()?;
//!     let agent = Arc::new(AnthropicClient::new(&config)?);
//!     let app = a11ycheck::server::router(AppState::new(config, agent));
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod agent;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod prompts;
pub mod server;
pub mod stream;
pub mod structure;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use agent::{AgentClient, AgentEvent, AgentEventStream, AnthropicClient};
pub use config::{AppConfig, AppConfigBuilder};
pub use error::{AgentError, ExtractError};
pub use pipeline::extract::Extractor;
pub use pipeline::format::format_structure;
pub use prompts::CheckType;
pub use server::AppState;
pub use stream::stream_analysis;
pub use structure::{
    BoundingBox, DocumentStructure, ElementKind, ImageSummary, StructureElement, TableSummary,
};
