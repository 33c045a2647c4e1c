//! Output types: per-URL load results, per-document summary results, and
//! batch statistics.
//!
//! Everything here serializes to JSON so callers can persist a whole run
//! (`DigestOutput`) or stream individual [`PaperRecord`]s as JSON Lines.

use crate::error::{LoadError, SummaryError};
use crate::schema::PaperResponse;
use serde::{Deserialize, Serialize};

/// The result of loading one URL: the `{url, markdown}` pair plus
/// diagnostics.
///
/// `markdown` is the empty string when the URL terminally failed — the
/// sentinel is explicit, never an absent field — and `error` then carries
/// the structured cause. A populated `markdown` with `cache_hit == true`
/// means no network request was made for this URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadedDocument {
    /// The document reference exactly as given.
    pub url: String,
    /// Extracted markdown text; `""` signals a terminal per-URL failure.
    pub markdown: String,
    /// Whether the markdown came from the cache.
    pub cache_hit: bool,
    /// Fetch attempts performed (0 on a cache hit).
    pub attempts: u32,
    /// Wall-clock time spent on this URL.
    pub duration_ms: u64,
    /// Why the URL failed, if it did.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<LoadError>,
}

impl LoadedDocument {
    /// A terminally failed document: url preserved, markdown empty.
    pub(crate) fn failed(url: &str, attempts: u32, duration_ms: u64, error: LoadError) -> Self {
        Self {
            url: url.to_string(),
            markdown: String::new(),
            cache_hit: false,
            attempts,
            duration_ms,
            error: Some(error),
        }
    }
}

/// One flat output record: the source URL together with every decoded
/// summary field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperRecord {
    /// The document reference this summary was produced from.
    pub url: String,
    /// The decoded structured summary, flattened alongside `url`.
    #[serde(flatten)]
    pub response: PaperResponse,
}

/// The outcome of summarizing one loaded document.
///
/// Exactly one of these exists per input document, in input order; check
/// `error` to distinguish a usable [`PaperRecord`] from a failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentResult {
    /// The document reference.
    pub url: String,
    /// The flat record, present on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<PaperRecord>,
    /// Prompt tokens consumed by the LLM call.
    pub input_tokens: u32,
    /// Completion tokens produced by the LLM call.
    pub output_tokens: u32,
    /// Wall-clock time for this document's summarization.
    pub duration_ms: u64,
    /// Retries performed before the final outcome.
    pub retries: u32,
    /// Why summarization failed, if it did.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<SummaryError>,
}

/// Aggregate statistics for one `digest` run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DigestStats {
    /// Number of input URLs.
    pub total_documents: usize,
    /// URLs served from the cache without network access.
    pub cache_hits: usize,
    /// URLs that ended with non-empty markdown.
    pub loaded: usize,
    /// URLs that ended with the empty-markdown sentinel.
    pub load_failures: usize,
    /// Documents with a decoded summary record.
    pub summarized: usize,
    /// Documents whose summarization failed (including empty documents).
    pub summary_failures: usize,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub load_duration_ms: u64,
    pub llm_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Everything a `digest` run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestOutput {
    /// Per-document summarization results, in input order.
    pub documents: Vec<DocumentResult>,
    /// Per-URL load results, in input order.
    pub loaded: Vec<LoadedDocument>,
    /// Run statistics.
    pub stats: DigestStats,
}

impl DigestOutput {
    /// The successfully decoded flat records, in input order.
    pub fn records(&self) -> impl Iterator<Item = &PaperRecord> {
        self.documents.iter().filter_map(|d| d.record.as_ref())
    }
}
