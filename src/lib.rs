//! # papersum
//!
//! Fetch academic PDFs by URL, convert them to Markdown through a
//! document-partitioning service, and produce structured multi-level
//! summaries with an LLM — with a content-addressed disk cache in between.
//!
//! ## Why this crate?
//!
//! Reading a batch of papers end-to-end is expensive twice over: partitioning
//! a PDF takes tens of seconds and the LLM call costs real money. The cache
//! makes the whole pipeline idempotent across runs — a URL is fetched and
//! converted exactly once, however many times you re-run the batch — and the
//! loader degrades per-URL instead of failing the batch when a single
//! download times out.
//!
//! ## Pipeline Overview
//!
//! ```text
//! URLs
//!  │
//!  ├─ 1. Cache     SHA-256(url).json hit? skip the network entirely
//!  ├─ 2. Fetch     HTTP GET, 30 s timeout, ≤ 3 attempts on transient errors
//!  ├─ 3. Partition bytes → Markdown via the partitioning service
//!  ├─ 4. Summarize one LLM call per document, bounded fan-out
//!  ├─ 5. Decode    strict JSON → PaperResponse (SchemaMismatch otherwise)
//!  └─ 6. Output    one flat {url, …summary fields} record per document
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use papersum::{digest, DigestConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / …;
//!     // the partitioning service key comes from ARYN_API_KEY.
//!     let config = DigestConfig::default();
//!     let urls = vec!["https://arxiv.org/pdf/2501.12948".to_string()];
//!     let output = digest(&urls, &config).await?;
//!     for record in output.records() {
//!         println!("{}", serde_json::to_string(record)?);
//!     }
//!     eprintln!("tokens: {} in / {} out",
//!         output.stats.total_input_tokens,
//!         output.stats.total_output_tokens);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `papersum` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! papersum = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod cache;
pub mod config;
pub mod digest;
pub mod error;
pub mod loader;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod schema;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use cache::{CacheEntry, MarkdownCache};
pub use config::{DigestConfig, DigestConfigBuilder, DEFAULT_PARTITION_URL};
pub use digest::{digest, digest_sync, resolve_provider, summarize_documents};
pub use error::{DigestError, FailureKind, LoadError, SummaryError};
pub use loader::ContentLoader;
pub use output::{DigestOutput, DigestStats, DocumentResult, LoadedDocument, PaperRecord};
pub use schema::PaperResponse;
