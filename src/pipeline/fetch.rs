//! Document fetching: one HTTP GET attempt with failure classification.
//!
//! The fetcher performs exactly one attempt per call and carries no retry
//! logic of its own — the loader owns the retry loop and dispatches on
//! [`FailureKind`] alone. Splitting the concerns this way keeps the policy
//! (how many attempts, which kinds retry) in one place and lets tests drive
//! the loader with scripted fetchers instead of a live network.

use crate::error::FailureKind;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// The outcome of a single failed fetch attempt.
#[derive(Debug, Clone)]
pub struct FetchFailure {
    /// Whether the loader may retry this failure.
    pub kind: FailureKind,
    /// Human-readable cause, included in diagnostics.
    pub detail: String,
}

impl FetchFailure {
    pub fn transient(detail: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Transient,
            detail: detail.into(),
        }
    }

    pub fn permanent(detail: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Permanent,
            detail: detail.into(),
        }
    }

    pub fn unexpected(detail: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Unexpected,
            detail: detail.into(),
        }
    }
}

/// A collaborator that retrieves the raw bytes behind a document URL.
///
/// One call is one attempt. Implementations must be `Send + Sync` so the
/// loader can be shared across tasks.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchFailure>;
}

/// HTTP GET fetcher with a bounded per-request timeout.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a fetcher whose requests time out after `timeout_secs`.
    pub fn new(timeout_secs: u64) -> Result<Self, FetchFailure> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| FetchFailure::unexpected(format!("HTTP client construction: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchFailure> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(classify_request_error)?;

        // A response arrived, so the network worked: a bad status is a
        // permanent answer, not a transient glitch.
        let status = response.status();
        if !status.is_success() {
            return Err(FetchFailure::permanent(format!("HTTP {status}")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchFailure::transient(format!("reading response body: {e}")))?;

        debug!("GET {} → {} bytes", url, bytes.len());
        Ok(bytes.to_vec())
    }
}

/// Map a reqwest send-phase error onto the retry taxonomy.
fn classify_request_error(e: reqwest::Error) -> FetchFailure {
    if e.is_timeout() {
        FetchFailure::transient(format!("request timed out: {e}"))
    } else if e.is_connect() {
        FetchFailure::transient(format!("connection failed: {e}"))
    } else if e.is_builder() || e.is_request() {
        FetchFailure::unexpected(format!("request could not be built: {e}"))
    } else {
        // Redirect loops, decode errors and other mid-flight oddities: a
        // retry is harmless and occasionally helps.
        FetchFailure::transient(e.to_string())
    }
}
