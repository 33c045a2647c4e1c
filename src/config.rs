//! Configuration types for the fetch–convert–summarize pipeline.
//!
//! All behaviour is controlled through [`DigestConfig`], built via its
//! [`DigestConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share configs across tasks, serialise them for logging, and
//! diff two runs to understand why their outputs differ.
//!
//! # Design choice: builder over constructor
//! A fifteen-field constructor is unreadable and breaks on every new field.
//! The builder lets callers set only what they care about and rely on
//! documented defaults for the rest.

use crate::error::DigestError;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default endpoint of the PDF partitioning service.
pub const DEFAULT_PARTITION_URL: &str = "https://api.aryn.cloud/v1/document/partition";

/// Configuration for one digest run.
///
/// Built via [`DigestConfig::builder()`] or [`DigestConfig::default()`].
///
/// # Example
/// ```rust
/// use papersum::DigestConfig;
///
/// let config = DigestConfig::builder()
///     .cache_dir(".cache")
///     .fetch_attempts(3)
///     .model("gpt-4.1-mini")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct DigestConfig {
    /// Directory holding one JSON cache file per converted URL. Created if
    /// absent. Default: `.cache`.
    ///
    /// Entries have no TTL and are trusted unconditionally; delete the
    /// directory to force re-fetching after a partitioner change.
    pub cache_dir: PathBuf,

    /// Per-request timeout for document downloads, in seconds. Default: 30.
    pub fetch_timeout_secs: u64,

    /// Total fetch attempts per URL on transient network failure. Default: 3.
    ///
    /// Permanent failures (HTTP error status) are never retried — they
    /// surface as a per-URL [`crate::error::LoadError`] after one attempt.
    pub fetch_attempts: u32,

    /// Base delay between fetch attempts, in milliseconds. Default: 500.
    ///
    /// The sleep before attempt *n+1* is `fetch_backoff_ms × n`, so the
    /// waits grow strictly: 500 ms, then 1 s.
    pub fetch_backoff_ms: u64,

    /// Endpoint of the partitioning service.
    /// Default: [`DEFAULT_PARTITION_URL`].
    pub partition_url: String,

    /// Bearer token for the partitioning service. If `None`, read from the
    /// `ARYN_API_KEY` environment variable at construction time.
    pub partition_api_key: Option<String>,

    /// Timeout for one partitioning call, in seconds. Default: 120.
    ///
    /// Partitioning a long paper is much slower than downloading it; this
    /// is deliberately separate from `fetch_timeout_secs`.
    pub partition_timeout_secs: u64,

    /// LLM model identifier, e.g. "gpt-4.1-mini", "claude-sonnet-4-20250514".
    /// If `None`, uses the provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If `None` along with `provider`, the provider is auto-detected from
    /// the environment.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for the summary completion. Default: 0.2.
    ///
    /// Low temperature keeps the model faithful to the paper text and, more
    /// importantly here, keeps the JSON output shape stable.
    pub temperature: f32,

    /// Maximum tokens the LLM may generate per document. Default: 8192.
    ///
    /// A full structured summary (three summary levels, insights, concept
    /// explanations, critical analysis) routinely exceeds 3 000 output
    /// tokens; setting this too low truncates the JSON mid-object and turns
    /// every response into a schema mismatch.
    pub max_tokens: usize,

    /// Maximum retry attempts on a transient LLM API failure. Default: 3.
    pub max_retries: u32,

    /// Initial LLM retry delay in milliseconds (exponential backoff).
    /// Default: 500. Doubles after each attempt: 500 ms → 1 s → 2 s.
    pub retry_backoff_ms: u64,

    /// Number of concurrent LLM calls during summarization. Default: 4.
    ///
    /// Loading stays strictly sequential regardless; this bounds only the
    /// fan-out over already-loaded documents.
    pub concurrency: usize,

    /// Custom system prompt. If `None`, uses the built-in default.
    pub system_prompt: Option<String>,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(".cache"),
            fetch_timeout_secs: 30,
            fetch_attempts: 3,
            fetch_backoff_ms: 500,
            partition_url: DEFAULT_PARTITION_URL.to_string(),
            partition_api_key: None,
            partition_timeout_secs: 120,
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.2,
            max_tokens: 8192,
            max_retries: 3,
            retry_backoff_ms: 500,
            concurrency: 4,
            system_prompt: None,
        }
    }
}

impl fmt::Debug for DigestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DigestConfig")
            .field("cache_dir", &self.cache_dir)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("fetch_attempts", &self.fetch_attempts)
            .field("fetch_backoff_ms", &self.fetch_backoff_ms)
            .field("partition_url", &self.partition_url)
            .field(
                "partition_api_key",
                &self.partition_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("concurrency", &self.concurrency)
            .finish()
    }
}

impl DigestConfig {
    /// Create a new builder for `DigestConfig`.
    pub fn builder() -> DigestConfigBuilder {
        DigestConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`DigestConfig`].
#[derive(Debug)]
pub struct DigestConfigBuilder {
    config: DigestConfig,
}

impl DigestConfigBuilder {
    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.cache_dir = dir.into();
        self
    }

    pub fn fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.config.fetch_timeout_secs = secs.max(1);
        self
    }

    pub fn fetch_attempts(mut self, n: u32) -> Self {
        self.config.fetch_attempts = n.max(1);
        self
    }

    pub fn fetch_backoff_ms(mut self, ms: u64) -> Self {
        self.config.fetch_backoff_ms = ms;
        self
    }

    pub fn partition_url(mut self, url: impl Into<String>) -> Self {
        self.config.partition_url = url.into();
        self
    }

    pub fn partition_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.partition_api_key = Some(key.into());
        self
    }

    pub fn partition_timeout_secs(mut self, secs: u64) -> Self {
        self.config.partition_timeout_secs = secs.max(1);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<DigestConfig, DigestError> {
        let c = &self.config;
        if c.fetch_attempts == 0 {
            return Err(DigestError::InvalidConfig(
                "fetch_attempts must be ≥ 1".into(),
            ));
        }
        if c.concurrency == 0 {
            return Err(DigestError::InvalidConfig("concurrency must be ≥ 1".into()));
        }
        if c.partition_url.is_empty() {
            return Err(DigestError::InvalidConfig(
                "partition_url must not be empty".into(),
            ));
        }
        if c.max_tokens < 256 {
            return Err(DigestError::InvalidConfig(format!(
                "max_tokens must be ≥ 256 for a structured summary, got {}",
                c.max_tokens
            )));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_documented_values() {
        let c = DigestConfig::default();
        assert_eq!(c.cache_dir, PathBuf::from(".cache"));
        assert_eq!(c.fetch_timeout_secs, 30);
        assert_eq!(c.fetch_attempts, 3);
        assert_eq!(c.partition_url, DEFAULT_PARTITION_URL);
        assert_eq!(c.concurrency, 4);
    }

    #[test]
    fn builder_clamps_zero_values() {
        let c = DigestConfig::builder()
            .fetch_attempts(0)
            .concurrency(0)
            .fetch_timeout_secs(0)
            .build()
            .unwrap();
        assert_eq!(c.fetch_attempts, 1);
        assert_eq!(c.concurrency, 1);
        assert_eq!(c.fetch_timeout_secs, 1);
    }

    #[test]
    fn build_rejects_tiny_max_tokens() {
        let err = DigestConfig::builder().max_tokens(10).build().unwrap_err();
        assert!(err.to_string().contains("max_tokens"));
    }

    #[test]
    fn build_rejects_empty_partition_url() {
        let err = DigestConfig::builder()
            .partition_url("")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("partition_url"));
    }

    #[test]
    fn temperature_is_clamped() {
        let c = DigestConfig::builder().temperature(9.0).build().unwrap();
        assert_eq!(c.temperature, 2.0);
    }

    #[test]
    fn debug_redacts_partition_key() {
        let c = DigestConfig::builder()
            .partition_api_key("secret-token")
            .build()
            .unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("secret-token"));
        assert!(dbg.contains("redacted"));
    }
}
