//! Service configuration.
//!
//! All behaviour is controlled through [`AppConfig`], built via its
//! [`AppConfigBuilder`]. Keeping every knob in one struct makes it trivial to
//! share the config across handlers, log it at startup, and diff two
//! deployments to understand why their behaviour differs.
//!
//! The builder lets callers set only the knobs they care about and rely on
//! documented defaults for the rest; `build()` validates the combination
//! once, so a constructed [`AppConfig`] is always usable as-is.

use serde::Serialize;
use std::fmt;

/// Upload size cap: 25 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Configuration for the a11ycheck service.
///
/// Built via [`AppConfig::builder()`] or [`AppConfig::default()`].
///
/// # Example
/// ```rust
/// use a11ycheck::AppConfig;
///
/// let config = AppConfig::builder()
///     .model("claude-sonnet-4-20250514")
///     .extract_concurrency(4)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone, Serialize)]
pub struct AppConfig {
    /// Maximum accepted upload size in bytes. Default: 25 MiB.
    ///
    /// Uploads larger than this are rejected with HTTP 400 before any
    /// processing begins. The cap bounds both temp-file disk usage and the
    /// worst-case parse workload a single request can trigger.
    pub max_upload_bytes: usize,

    /// Number of extractions allowed to run concurrently. Default: 2.
    ///
    /// PDF parsing is CPU-bound and runs on the blocking thread pool. The
    /// semaphore in [`crate::pipeline::extract::Extractor`] caps how many
    /// uploads can occupy those threads at once, so a burst of large
    /// documents degrades into queueing instead of thrashing.
    pub extract_concurrency: usize,

    /// Agent model identifier. Default: "claude-sonnet-4-20250514".
    pub model: String,

    /// Maximum tokens the agent may generate per report. Default: 8192.
    ///
    /// Compliance reports for long dissertations routinely exceed 4 000
    /// output tokens; 8 192 covers complete reports without letting a runaway
    /// generation go unbounded.
    pub max_tokens: usize,

    /// Base URL of the agent API. Default: "https://api.anthropic.com".
    pub api_base: String,

    /// API key for the agent. No default; resolved from the environment by
    /// the binary. Never serialised.
    #[serde(skip)]
    pub api_key: String,

    /// Origins allowed by CORS. Default: local Vite dev servers.
    pub cors_origins: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            extract_concurrency: 2,
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 8192,
            api_base: "https://api.anthropic.com".to_string(),
            api_key: String::new(),
            cors_origins: vec![
                "http://localhost:5173".to_string(),
                "http://localhost:4173".to_string(),
            ],
        }
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("extract_concurrency", &self.extract_concurrency)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("api_base", &self.api_base)
            .field("api_key", &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .field("cors_origins", &self.cors_origins)
            .finish()
    }
}

impl AppConfig {
    /// Create a new builder for `AppConfig`.
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`AppConfig`].
#[derive(Debug)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    pub fn max_upload_bytes(mut self, bytes: usize) -> Self {
        self.config.max_upload_bytes = bytes;
        self
    }

    pub fn extract_concurrency(mut self, n: usize) -> Self {
        self.config.extract_concurrency = n.max(1);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.config.api_base = base.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    pub fn cors_origins(mut self, origins: Vec<String>) -> Self {
        self.config.cors_origins = origins;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AppConfig, String> {
        let c = &self.config;
        if c.max_upload_bytes == 0 {
            return Err("max_upload_bytes must be > 0".to_string());
        }
        if c.model.is_empty() {
            return Err("model must not be empty".to_string());
        }
        if c.api_base.is_empty() {
            return Err("api_base must not be empty".to_string());
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::builder().build().unwrap();
        assert_eq!(config.max_upload_bytes, 25 * 1024 * 1024);
        assert_eq!(config.extract_concurrency, 2);
    }

    #[test]
    fn concurrency_floor_is_one() {
        let config = AppConfig::builder().extract_concurrency(0).build().unwrap();
        assert_eq!(config.extract_concurrency, 1);
    }

    #[test]
    fn empty_model_rejected() {
        assert!(AppConfig::builder().model("").build().is_err());
    }

    #[test]
    fn debug_never_leaks_api_key() {
        let config = AppConfig::builder().api_key("sk-secret").build().unwrap();
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("sk-secret"));
    }
}
