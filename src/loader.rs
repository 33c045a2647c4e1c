//! The content loader: URL in, `{url, markdown}` record out, exactly once
//! in the logical sense.
//!
//! Per URL the loader runs a small state machine:
//!
//! ```text
//! PENDING ──▶ CACHED                      (hit: zero network access)
//! PENDING ──▶ FETCHING ──▶ SUCCESS        (fetch + convert + cache write)
//!                 │  ▲
//!                 ▼  │
//!              RETRYING                   (transient failures only, ≤ 3
//!                 │                        attempts, growing backoff)
//!                 ▼
//!               FAILED                    (markdown = "", error recorded)
//! ```
//!
//! URLs are processed strictly sequentially: URL *n+1* does not start until
//! URL *n* reaches a terminal state, so a batch containing the same URL
//! twice hits the cache on the second occurrence and no two writers ever
//! race on one cache key. The loader never returns an error and never
//! panics — every failure mode converges on a per-URL record with an empty
//! markdown string and a structured cause.

use crate::cache::MarkdownCache;
use crate::config::DigestConfig;
use crate::error::{FailureKind, LoadError};
use crate::output::LoadedDocument;
use crate::pipeline::fetch::{DocumentFetcher, FetchFailure};
use crate::pipeline::partition::PdfConverter;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

/// Maps document references to markdown, caching each conversion.
pub struct ContentLoader {
    fetcher: Arc<dyn DocumentFetcher>,
    converter: Arc<dyn PdfConverter>,
    cache: MarkdownCache,
    fetch_attempts: u32,
    fetch_backoff_ms: u64,
}

impl ContentLoader {
    pub fn new(
        fetcher: Arc<dyn DocumentFetcher>,
        converter: Arc<dyn PdfConverter>,
        cache: MarkdownCache,
        config: &DigestConfig,
    ) -> Self {
        Self {
            fetcher,
            converter,
            cache,
            fetch_attempts: config.fetch_attempts.max(1),
            fetch_backoff_ms: config.fetch_backoff_ms,
        }
    }

    /// Load a batch of URLs, in order.
    ///
    /// The output has exactly one record per input URL, positionally
    /// aligned; each record also carries its own `url` so downstream steps
    /// never need to rely on position.
    pub async fn load(&self, urls: &[String]) -> Vec<LoadedDocument> {
        let mut results = Vec::with_capacity(urls.len());
        for url in urls {
            results.push(self.load_document(url).await);
        }
        results
    }

    /// Load one URL to a terminal state. Never returns an error.
    pub async fn load_document(&self, url: &str) -> LoadedDocument {
        let start = Instant::now();

        // Cache hit: unconditional trust, zero network access.
        if let Some(entry) = self.cache.get(url) {
            debug!("{}: served from cache", url);
            return LoadedDocument {
                url: url.to_string(),
                markdown: entry.markdown,
                cache_hit: true,
                attempts: 0,
                duration_ms: start.elapsed().as_millis() as u64,
                error: None,
            };
        }

        let (bytes, attempts) = match self.fetch_with_retry(url).await {
            Ok(ok) => ok,
            Err((attempts, failure)) => {
                let error = LoadError::Fetch {
                    url: url.to_string(),
                    attempts,
                    kind: failure.kind,
                    detail: failure.detail,
                };
                warn!("{}", error);
                return LoadedDocument::failed(
                    url,
                    attempts,
                    start.elapsed().as_millis() as u64,
                    error,
                );
            }
        };

        let markdown = match self.converter.to_markdown(bytes).await {
            Ok(markdown) => markdown,
            Err(e) => {
                let error = LoadError::Convert {
                    url: url.to_string(),
                    detail: e.detail,
                };
                warn!("{}", error);
                return LoadedDocument::failed(
                    url,
                    attempts,
                    start.elapsed().as_millis() as u64,
                    error,
                );
            }
        };

        // The conversion already succeeded; a failed cache write only costs
        // a re-fetch next run, so it must not fail this URL.
        if let Err(e) = self.cache.put(url, &markdown) {
            warn!("{}: cache write failed: {}", url, e);
        }

        info!(
            "{}: loaded ({} chars, {} attempt(s), {}ms)",
            url,
            markdown.len(),
            attempts,
            start.elapsed().as_millis()
        );

        LoadedDocument {
            url: url.to_string(),
            markdown,
            cache_hit: false,
            attempts,
            duration_ms: start.elapsed().as_millis() as u64,
            error: None,
        }
    }

    /// Fetch with the bounded retry policy.
    ///
    /// Only transient failures re-enter the loop; permanent and unexpected
    /// ones are terminal on the attempt that produced them. The sleep
    /// before attempt *n+1* is `fetch_backoff_ms × n`, strictly increasing.
    async fn fetch_with_retry(
        &self,
        url: &str,
    ) -> Result<(Vec<u8>, u32), (u32, FetchFailure)> {
        let mut last_failure: Option<FetchFailure> = None;

        for attempt in 1..=self.fetch_attempts {
            if attempt > 1 {
                let backoff = self.fetch_backoff_ms * u64::from(attempt - 1);
                warn!(
                    "{}: retrying fetch ({}/{}) after {}ms",
                    url, attempt, self.fetch_attempts, backoff
                );
                sleep(Duration::from_millis(backoff)).await;
            }

            match self.fetcher.fetch(url).await {
                Ok(bytes) => return Ok((bytes, attempt)),
                Err(failure) => {
                    warn!(
                        "{}: fetch attempt {}/{} failed ({}): {}",
                        url, attempt, self.fetch_attempts, failure.kind, failure.detail
                    );
                    if failure.kind != FailureKind::Transient {
                        return Err((attempt, failure));
                    }
                    last_failure = Some(failure);
                }
            }
        }

        let failure = last_failure
            .unwrap_or_else(|| FetchFailure::unexpected("retry loop ended without an attempt"));
        Err((self.fetch_attempts, failure))
    }
}
