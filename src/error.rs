//! Error types for the papersum library.
//!
//! Three distinct error types reflect three distinct failure scopes:
//!
//! * [`DigestError`] — **Fatal**: the batch cannot run at all (cache
//!   directory uncreatable, partitioner key missing, no LLM provider).
//!   Returned as `Err(DigestError)` from the top-level `digest*` functions.
//!
//! * [`LoadError`] — **Non-fatal, per URL**: one document could not be
//!   fetched or converted. Stored inside
//!   [`crate::output::LoadedDocument`] alongside the empty-markdown
//!   sentinel so the rest of the batch proceeds.
//!
//! * [`SummaryError`] — **Non-fatal, per document**: the LLM call failed or
//!   its response did not match the summary schema. Stored inside
//!   [`crate::output::DocumentResult`].
//!
//! The separation lets callers decide their own tolerance: abort on the
//! first failed URL, log and continue, or collect everything for a post-run
//! report.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the papersum library.
///
/// Per-URL and per-document failures use [`LoadError`] / [`SummaryError`]
/// and are carried on the output records rather than propagated here.
#[derive(Debug, Error)]
pub enum DigestError {
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The cache directory could not be created or is not writable.
    #[error("Failed to open cache directory '{path}': {source}")]
    CacheDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A cache entry could not be persisted.
    #[error("Failed to write cache entry '{path}': {source}")]
    CacheWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No API key for the partitioning service.
    #[error("Partitioning service is not configured.\n{hint}")]
    PartitionerNotConfigured { hint: String },

    /// The configured LLM provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Could not create or write the output records file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Classification of a single fetch attempt's failure.
///
/// The loader's retry loop dispatches on this kind alone: only
/// [`FailureKind::Transient`] re-enters the fetch state; the other two are
/// terminal for the URL on the first attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// Network-layer failure (timeout, connection reset) eligible for retry.
    Transient,
    /// Non-network request failure (HTTP error status) — retrying would
    /// yield the same answer.
    Permanent,
    /// Anything else (malformed URL, client construction failure).
    Unexpected,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Transient => write!(f, "transient"),
            FailureKind::Permanent => write!(f, "permanent"),
            FailureKind::Unexpected => write!(f, "unexpected"),
        }
    }
}

/// A non-fatal error for a single URL in the loading stage.
///
/// Stored on [`crate::output::LoadedDocument`] next to the `markdown: ""`
/// sentinel. The batch continues regardless.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
pub enum LoadError {
    /// Fetch gave up after the allowed attempts for its failure kind.
    #[error("'{url}': fetch failed after {attempts} attempt(s) ({kind}): {detail}")]
    Fetch {
        url: String,
        attempts: u32,
        kind: FailureKind,
        detail: String,
    },

    /// The partitioning collaborator could not convert the document.
    #[error("'{url}': markdown conversion failed: {detail}")]
    Convert { url: String, detail: String },
}

/// A non-fatal error for a single document in the summarization stage.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
pub enum SummaryError {
    /// The document loaded with empty markdown, so there is nothing to
    /// summarize. Produced without an LLM call.
    #[error("'{url}': document has no markdown content, skipped")]
    EmptyDocument { url: String },

    /// LLM call failed after retries.
    #[error("'{url}': LLM call failed after {retries} retries: {detail}")]
    LlmFailed {
        url: String,
        retries: u32,
        detail: String,
    },

    /// The LLM responded, but the response did not decode into the fixed
    /// summary schema (missing or mistyped required field).
    #[error("'{url}': response does not match the summary schema: {detail}")]
    SchemaMismatch { url: String, detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_error_display_names_url_and_attempts() {
        let e = LoadError::Fetch {
            url: "https://x/a.pdf".into(),
            attempts: 3,
            kind: FailureKind::Transient,
            detail: "connection timed out".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("https://x/a.pdf"), "got: {msg}");
        assert!(msg.contains("3 attempt"), "got: {msg}");
        assert!(msg.contains("transient"), "got: {msg}");
    }

    #[test]
    fn permanent_kind_display() {
        let e = LoadError::Fetch {
            url: "https://x/b.pdf".into(),
            attempts: 1,
            kind: FailureKind::Permanent,
            detail: "HTTP 404 Not Found".into(),
        };
        assert!(e.to_string().contains("permanent"));
        assert!(e.to_string().contains("404"));
    }

    #[test]
    fn schema_mismatch_display() {
        let e = SummaryError::SchemaMismatch {
            url: "https://x/c.pdf".into(),
            detail: "missing field `title`".into(),
        };
        assert!(e.to_string().contains("summary schema"));
        assert!(e.to_string().contains("`title`"));
    }

    #[test]
    fn load_error_round_trips_through_json() {
        let e = LoadError::Convert {
            url: "https://x/d.pdf".into(),
            detail: "partitioner returned 500".into(),
        };
        let json = serde_json::to_string(&e).unwrap();
        let back: LoadError = serde_json::from_str(&json).unwrap();
        assert_eq!(back.to_string(), e.to_string());
    }
}
