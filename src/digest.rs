//! Eager (whole-batch) digest entry points.
//!
//! [`digest`] wires the stages together: open the cache, build the fetch
//! and partitioning collaborators, resolve the LLM provider, load every URL
//! sequentially, then summarize the loaded documents concurrently and
//! assemble statistics. Fatal errors are configuration problems only —
//! per-URL and per-document failures ride along on the output records.

use crate::cache::MarkdownCache;
use crate::config::DigestConfig;
use crate::error::DigestError;
use crate::loader::ContentLoader;
use crate::output::{DigestOutput, DigestStats, DocumentResult, LoadedDocument};
use crate::pipeline::fetch::HttpFetcher;
use crate::pipeline::llm;
use crate::pipeline::partition::ArynPartitioner;
use edgequake_llm::{LLMProvider, ProviderFactory};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Default model used when a provider is named without a model.
const DEFAULT_MODEL: &str = "gpt-4.1-mini";

/// Fetch, convert, cache, and summarize a batch of PDF URLs.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `urls`   — document references; duplicates are allowed
/// * `config` — digest configuration
///
/// # Returns
/// `Ok(DigestOutput)` on success, even if some documents failed (check
/// `output.stats.load_failures` / `summary_failures`).
///
/// # Errors
/// Returns `Err(DigestError)` only for configuration problems: cache
/// directory uncreatable, no partitioner key, no LLM provider.
pub async fn digest(urls: &[String], config: &DigestConfig) -> Result<DigestOutput, DigestError> {
    let total_start = Instant::now();
    info!("Starting digest of {} document(s)", urls.len());

    // ── Step 1: Collaborators ────────────────────────────────────────────
    let cache = MarkdownCache::open(&config.cache_dir)?;
    let fetcher = HttpFetcher::new(config.fetch_timeout_secs)
        .map_err(|e| DigestError::Internal(e.detail))?;
    let converter = ArynPartitioner::from_config(config)?;
    let provider = resolve_provider(config)?;

    let loader = ContentLoader::new(Arc::new(fetcher), Arc::new(converter), cache, config);

    // ── Step 2: Load (sequential, cache-aware) ───────────────────────────
    let load_start = Instant::now();
    let loaded = loader.load(urls).await;
    let load_duration_ms = load_start.elapsed().as_millis() as u64;
    debug!(
        "Loaded {}/{} document(s) in {}ms",
        loaded.iter().filter(|d| !d.markdown.is_empty()).count(),
        loaded.len(),
        load_duration_ms
    );

    // ── Step 3: Summarize (bounded fan-out) ──────────────────────────────
    let llm_start = Instant::now();
    let documents = summarize_documents(&provider, &loaded, config).await;
    let llm_duration_ms = llm_start.elapsed().as_millis() as u64;

    // ── Step 4: Stats ────────────────────────────────────────────────────
    let stats = build_stats(
        &loaded,
        &documents,
        load_duration_ms,
        llm_duration_ms,
        total_start.elapsed().as_millis() as u64,
    );

    info!(
        "Digest complete: {}/{} summarized, {}ms total",
        stats.summarized, stats.total_documents, stats.total_duration_ms
    );

    Ok(DigestOutput {
        documents,
        loaded,
        stats,
    })
}

/// Synchronous wrapper around [`digest`].
///
/// Creates a temporary tokio runtime internally.
pub fn digest_sync(urls: &[String], config: &DigestConfig) -> Result<DigestOutput, DigestError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| DigestError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(digest(urls, config))
}

/// Summarize loaded documents concurrently, preserving input order.
///
/// Fan-out is bounded by `config.concurrency`; completion order is
/// arbitrary, so each result is tagged with its input index and the batch
/// is re-sorted before returning.
pub async fn summarize_documents(
    provider: &Arc<dyn LLMProvider>,
    loaded: &[LoadedDocument],
    config: &DigestConfig,
) -> Vec<DocumentResult> {
    let mut results: Vec<(usize, DocumentResult)> =
        stream::iter(loaded.iter().enumerate().map(|(idx, doc)| {
            let provider = Arc::clone(provider);
            let config = config.clone();
            let doc = doc.clone();
            async move {
                let result = llm::summarize_document(&provider, &doc, &config).await;
                (idx, result)
            }
        }))
        .buffer_unordered(config.concurrency)
        .collect()
        .await;

    results.sort_by_key(|(idx, _)| *idx);
    results.into_iter().map(|(_, result)| result).collect()
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// Public so callers that drive the loader and summarizer piecewise (like
/// the CLI's progress loop) resolve the provider exactly as [`digest`]
/// would. The four-level fallback chain lets library users and CLI users
/// each set exactly as much or as little as they need:
///
/// 1. **Pre-built provider** (`config.provider`) — the caller constructed
///    the provider entirely; we use it as-is. Useful in tests or when the
///    caller needs custom middleware.
///
/// 2. **Named provider + model** (`config.provider_name`) — reads the
///    corresponding API key (`OPENAI_API_KEY`, etc.) from the environment.
///
/// 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`)
///    — both set means the provider and model were chosen at the execution
///    environment level (Makefile, shell script, CI).
///
/// 4. **Full auto-detection** (`ProviderFactory::from_env`) — scans all
///    known API key variables and picks the first available provider, with
///    OpenAI preferred when its key is present.
pub fn resolve_provider(config: &DigestConfig) -> Result<Arc<dyn LLMProvider>, DigestError> {
    // 1) User-provided provider takes priority
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    // 2) Provider name + model
    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        return create_provider(name, model);
    }

    // 3) Honour EDGEQUAKE_LLM_PROVIDER + EDGEQUAKE_MODEL when both set
    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    // 4) Prefer OpenAI explicitly when an OpenAI API key is present, so
    // users with multiple provider keys get a deterministic default.
    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
            return create_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| DigestError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {e}"
            ),
        })?;

    Ok(llm_provider)
}

/// Instantiate a named provider with the given model.
fn create_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, DigestError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        DigestError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

fn build_stats(
    loaded: &[LoadedDocument],
    documents: &[DocumentResult],
    load_duration_ms: u64,
    llm_duration_ms: u64,
    total_duration_ms: u64,
) -> DigestStats {
    let load_failures = loaded.iter().filter(|d| d.markdown.is_empty()).count();
    let summarized = documents.iter().filter(|d| d.record.is_some()).count();

    DigestStats {
        total_documents: loaded.len(),
        cache_hits: loaded.iter().filter(|d| d.cache_hit).count(),
        loaded: loaded.len() - load_failures,
        load_failures,
        summarized,
        summary_failures: documents.len() - summarized,
        total_input_tokens: documents.iter().map(|d| u64::from(d.input_tokens)).sum(),
        total_output_tokens: documents.iter().map(|d| u64::from(d.output_tokens)).sum(),
        load_duration_ms,
        llm_duration_ms,
        total_duration_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{LoadError, SummaryError};

    fn loaded(url: &str, markdown: &str, cache_hit: bool) -> LoadedDocument {
        LoadedDocument {
            url: url.into(),
            markdown: markdown.into(),
            cache_hit,
            attempts: u32::from(!cache_hit),
            duration_ms: 1,
            error: if markdown.is_empty() {
                Some(LoadError::Convert {
                    url: url.into(),
                    detail: "boom".into(),
                })
            } else {
                None
            },
        }
    }

    fn result(url: &str, ok: bool) -> DocumentResult {
        DocumentResult {
            url: url.into(),
            record: ok.then(|| crate::output::PaperRecord {
                url: url.into(),
                response: serde_json::from_str(&crate::schema::sample_response_json()).unwrap(),
            }),
            input_tokens: if ok { 1000 } else { 0 },
            output_tokens: if ok { 500 } else { 0 },
            duration_ms: 10,
            retries: 0,
            error: (!ok).then(|| SummaryError::EmptyDocument { url: url.into() }),
        }
    }

    #[test]
    fn stats_count_every_bucket() {
        let loaded = vec![
            loaded("https://x/a.pdf", "# A", false),
            loaded("https://x/b.pdf", "# B", true),
            loaded("https://x/c.pdf", "", false),
        ];
        let documents = vec![
            result("https://x/a.pdf", true),
            result("https://x/b.pdf", true),
            result("https://x/c.pdf", false),
        ];

        let stats = build_stats(&loaded, &documents, 100, 200, 350);
        assert_eq!(stats.total_documents, 3);
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(stats.loaded, 2);
        assert_eq!(stats.load_failures, 1);
        assert_eq!(stats.summarized, 2);
        assert_eq!(stats.summary_failures, 1);
        assert_eq!(stats.total_input_tokens, 2000);
        assert_eq!(stats.total_output_tokens, 1000);
        assert_eq!(stats.total_duration_ms, 350);
    }
}
