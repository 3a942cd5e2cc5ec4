//! Pipeline stages between an uploaded PDF and the agent prompt.
//!
//! Each submodule implements exactly one transformation step. Keeping stages
//! separate makes each independently testable and lets us swap the parsing
//! engine without touching the prompt renderer.
//!
//! ## Data Flow
//!
//! ```text
//! upload ──▶ extract ──▶ format ──▶ stream
//! (temp file) (unpdf)   (prompt)   (SSE relay)
//! ```
//!
//! 1. [`extract`]: parse the PDF and reduce the engine's element tree to a
//!    [`crate::structure::DocumentStructure`]; runs in `spawn_blocking`
//!    because parsing is CPU-bound
//! 2. [`format`]: render the structure into one bounded-length text block
//!    for inclusion in the agent prompt; pure, no failure modes

pub mod extract;
pub mod format;
