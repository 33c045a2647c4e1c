//! CLI binary for papersum.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `DigestConfig`, drives the loader and summarizer with progress output,
//! and writes the flat records as JSON Lines.

use anyhow::{Context, Result};
use clap::Parser;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use papersum::pipeline::fetch::HttpFetcher;
use papersum::pipeline::partition::ArynPartitioner;
use papersum::{
    resolve_provider, summarize_documents, ContentLoader, DigestConfig, DocumentResult,
    LoadedDocument, MarkdownCache,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

/// Default papers to digest when no `--pdf` is given.
const DEFAULT_PDFS: &[&str] = &[
    "https://arxiv.org/pdf/2501.12948", // DeepSeek-R1
    "https://arxiv.org/pdf/2403.04642", // RLHF
    "https://arxiv.org/pdf/2501.04519", // rStar-Math
    "https://arxiv.org/pdf/2502.11886", // LIMR
    "https://arxiv.org/pdf/2505.24864", // ProRL
    "https://arxiv.org/pdf/2505.03335", // Absolute-Zero
    "https://arxiv.org/pdf/2503.14476", // DAPO
    "https://arxiv.org/pdf/2506.04178", // OpenThoughts
    "https://arxiv.org/pdf/2410.01679", // VinePPO
];

const AFTER_HELP: &str = r#"EXAMPLES:
  # Digest the built-in paper list (JSONL on stdout)
  papersum

  # Summarize a single paper
  papersum --pdf https://arxiv.org/pdf/2501.12948

  # Multiple papers, repeated flag or comma-separated
  papersum --pdf https://arxiv.org/pdf/2501.12948 --pdf https://arxiv.org/pdf/2403.04642
  papersum --pdf https://arxiv.org/pdf/2501.12948,https://arxiv.org/pdf/2403.04642

  # Write records to a file, pretty-printed
  papersum --pdf https://arxiv.org/pdf/2501.12948 -o summaries.json --pretty

  # Use a specific model
  papersum --provider anthropic --model claude-sonnet-4-20250514

  # Re-run with a warm cache (zero fetches, only LLM calls)
  papersum --cache-dir .cache

ENVIRONMENT VARIABLES:
  ARYN_API_KEY            Partitioning-service key (PDF → Markdown)
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID

SETUP:
  1. export ARYN_API_KEY=aryn-...
  2. export OPENAI_API_KEY=sk-...
  3. papersum --pdf https://arxiv.org/pdf/2501.12948 -o out.jsonl

  Converted markdown is cached per URL in --cache-dir; delete the directory
  to force re-fetching (entries never expire on their own).
"#;

/// Summarize academic papers (PDF URLs) into structured JSON records.
#[derive(Parser, Debug)]
#[command(
    name = "papersum",
    version,
    about = "Fetch academic PDFs and produce structured multi-level summaries",
    long_about = "Download PDF papers by URL, convert them to Markdown via a document-partitioning \
service (cached on disk per URL), and produce one structured summary record per paper using an \
LLM provider (OpenAI, Anthropic, Google Gemini, Ollama, or any OpenAI-compatible endpoint).",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF URL(s) to summarize. Repeatable and/or comma-separated;
    /// defaults to a built-in list of papers when omitted.
    #[arg(long = "pdf", value_name = "URL")]
    pdf: Vec<String>,

    /// Write JSON Lines to this file instead of stdout.
    #[arg(short, long, env = "PAPERSUM_OUTPUT")]
    output: Option<PathBuf>,

    /// Emit one pretty-printed JSON array instead of JSON Lines.
    #[arg(long, env = "PAPERSUM_PRETTY")]
    pretty: bool,

    /// Cache directory for converted markdown.
    #[arg(long, env = "PAPERSUM_CACHE_DIR", default_value = ".cache")]
    cache_dir: PathBuf,

    /// LLM model ID (e.g. gpt-4.1-mini, claude-sonnet-4-20250514).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Partitioning-service endpoint.
    #[arg(long, env = "PAPERSUM_PARTITION_URL")]
    partition_url: Option<String>,

    /// HTTP download timeout per attempt, in seconds.
    #[arg(long, env = "PAPERSUM_FETCH_TIMEOUT", default_value_t = 30)]
    fetch_timeout: u64,

    /// Total fetch attempts per URL on transient network failure.
    #[arg(long, env = "PAPERSUM_FETCH_ATTEMPTS", default_value_t = 3)]
    fetch_attempts: u32,

    /// Retries per document on LLM failure.
    #[arg(long, env = "PAPERSUM_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// Number of concurrent LLM calls.
    #[arg(short, long, env = "PAPERSUM_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Max LLM output tokens per document.
    #[arg(long, env = "PAPERSUM_MAX_TOKENS", default_value_t = 8192)]
    max_tokens: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "PAPERSUM_TEMPERATURE", default_value_t = 0.2)]
    temperature: f32,

    /// Disable progress bars.
    #[arg(long, env = "PAPERSUM_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PAPERSUM_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the records themselves.
    #[arg(short, long, env = "PAPERSUM_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let total_start = Instant::now();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs while the progress bars are active;
    // the bars provide all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Collect URLs ─────────────────────────────────────────────────────
    let urls = collect_urls(&cli.pdf);
    if urls.is_empty() {
        anyhow::bail!("No usable URLs after parsing --pdf arguments");
    }

    // ── Build config and collaborators ───────────────────────────────────
    let config = build_config(&cli)?;

    let cache = MarkdownCache::open(&config.cache_dir).context("Failed to open cache")?;
    let fetcher = HttpFetcher::new(config.fetch_timeout_secs)
        .map_err(|e| anyhow::anyhow!(e.detail))
        .context("Failed to build HTTP client")?;
    let converter = ArynPartitioner::from_config(&config)
        .context("Partitioning service is not configured")?;
    let provider = resolve_provider(&config).context("LLM provider is not configured")?;
    let loader = ContentLoader::new(Arc::new(fetcher), Arc::new(converter), cache, &config);

    // ── Stage 1: Load (sequential, cache-aware) ──────────────────────────
    let loaded = run_load_stage(&loader, &urls, show_progress).await;
    let load_ok = loaded.iter().filter(|d| !d.markdown.is_empty()).count();
    let cache_hits = loaded.iter().filter(|d| d.cache_hit).count();

    // ── Stage 2: Summarize (bounded fan-out) ─────────────────────────────
    let documents = if show_progress {
        run_summarize_stage_with_progress(&provider, &loaded, &config).await
    } else {
        summarize_documents(&provider, &loaded, &config).await
    };
    let summarized = documents.iter().filter(|d| d.record.is_some()).count();

    // ── Stage 3: Emit records ────────────────────────────────────────────
    let rendered = render_records(&documents, cli.pretty)?;
    match cli.output {
        Some(ref path) => {
            write_atomic(path, &rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            if !cli.quiet {
                eprintln!(
                    "{} {} record(s) → {}",
                    green("✔"),
                    bold(&summarized.to_string()),
                    bold(&path.display().to_string())
                );
            }
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(rendered.as_bytes())
                .context("Failed to write to stdout")?;
        }
    }

    // ── Summary line ─────────────────────────────────────────────────────
    if !cli.quiet {
        let tokens_in: u64 = documents.iter().map(|d| u64::from(d.input_tokens)).sum();
        let tokens_out: u64 = documents.iter().map(|d| u64::from(d.output_tokens)).sum();
        eprintln!(
            "{}  {}/{} loaded ({} from cache)  {}/{} summarized  {}ms",
            if summarized == urls.len() {
                green("✔")
            } else {
                cyan("⚠")
            },
            load_ok,
            urls.len(),
            cache_hits,
            summarized,
            urls.len(),
            total_start.elapsed().as_millis(),
        );
        eprintln!(
            "   {} tokens in  /  {} tokens out",
            dim(&tokens_in.to_string()),
            dim(&tokens_out.to_string()),
        );
    }

    Ok(())
}

/// Split repeated and/or comma-separated `--pdf` values into a URL list.
///
/// The built-in list applies only when `--pdf` was not given at all; an
/// explicit-but-blank argument is the caller's mistake and errors upstream.
fn collect_urls(args: &[String]) -> Vec<String> {
    if args.is_empty() {
        return DEFAULT_PDFS.iter().map(|u| u.to_string()).collect();
    }

    args.iter()
        .flat_map(|arg| arg.split(','))
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .collect()
}

/// Map CLI args to `DigestConfig`.
fn build_config(cli: &Cli) -> Result<DigestConfig> {
    let mut builder = DigestConfig::builder()
        .cache_dir(&cli.cache_dir)
        .fetch_timeout_secs(cli.fetch_timeout)
        .fetch_attempts(cli.fetch_attempts)
        .max_retries(cli.max_retries)
        .concurrency(cli.concurrency)
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature);

    if let Some(ref url) = cli.partition_url {
        builder = builder.partition_url(url);
    }

    let mut config = builder.build().context("Invalid configuration")?;
    config.model = cli.model.clone();
    config.provider_name = cli.provider.clone();
    Ok(config)
}

/// Load every URL sequentially, rendering a per-URL progress bar.
async fn run_load_stage(
    loader: &ContentLoader,
    urls: &[String],
    show_progress: bool,
) -> Vec<LoadedDocument> {
    let bar = if show_progress {
        let bar = ProgressBar::new(urls.len() as u64);
        bar.set_style(stage_style());
        bar.set_prefix("Loading");
        bar.enable_steady_tick(Duration::from_millis(80));
        Some(bar)
    } else {
        None
    };

    let mut loaded = Vec::with_capacity(urls.len());
    for url in urls {
        if let Some(ref bar) = bar {
            bar.set_message(short_url(url));
        }
        let doc = loader.load_document(url).await;
        if let Some(ref bar) = bar {
            match &doc.error {
                None => bar.println(format!(
                    "  {} {}  {}",
                    green("✓"),
                    short_url(url),
                    dim(&format!(
                        "{} chars{}",
                        doc.markdown.len(),
                        if doc.cache_hit { ", cached" } else { "" }
                    )),
                )),
                Some(e) => bar.println(format!("  {} {}  {}", red("✗"), short_url(url), red(&truncate(&e.to_string(), 80)))),
            }
            bar.inc(1);
        }
        loaded.push(doc);
    }

    if let Some(bar) = bar {
        bar.finish_and_clear();
    }
    loaded
}

/// Summarize with a live per-document progress bar.
///
/// Completion order is arbitrary under `buffer_unordered`, so each result
/// is tagged with its input index and the batch re-sorted at the end —
/// the same arrangement [`summarize_documents`] uses internally.
async fn run_summarize_stage_with_progress(
    provider: &Arc<dyn edgequake_llm::LLMProvider>,
    loaded: &[LoadedDocument],
    config: &DigestConfig,
) -> Vec<DocumentResult> {
    let bar = ProgressBar::new(loaded.len() as u64);
    bar.set_style(stage_style());
    bar.set_prefix("Summarizing");
    bar.enable_steady_tick(Duration::from_millis(80));

    let mut results: Vec<(usize, DocumentResult)> =
        stream::iter(loaded.iter().enumerate().map(|(idx, doc)| {
            let provider = Arc::clone(provider);
            let config = config.clone();
            let doc = doc.clone();
            async move {
                let result =
                    papersum::pipeline::llm::summarize_document(&provider, &doc, &config).await;
                (idx, result)
            }
        }))
        .buffer_unordered(config.concurrency)
        .inspect(|(_, result)| {
            match &result.error {
                None => bar.println(format!(
                    "  {} {}  {}",
                    green("✓"),
                    short_url(&result.url),
                    dim(&format!(
                        "{} in / {} out  {:.1}s",
                        result.input_tokens,
                        result.output_tokens,
                        result.duration_ms as f64 / 1000.0
                    )),
                )),
                Some(e) => bar.println(format!(
                    "  {} {}  {}",
                    red("✗"),
                    short_url(&result.url),
                    red(&truncate(&e.to_string(), 80)),
                )),
            }
            bar.inc(1);
        })
        .collect()
        .await;

    bar.finish_and_clear();
    results.sort_by_key(|(idx, _)| *idx);
    results.into_iter().map(|(_, result)| result).collect()
}

/// Render successful records as JSONL, or a pretty JSON array.
fn render_records(documents: &[DocumentResult], pretty: bool) -> Result<String> {
    let records: Vec<_> = documents.iter().filter_map(|d| d.record.as_ref()).collect();

    if pretty {
        let mut out =
            serde_json::to_string_pretty(&records).context("Failed to serialise records")?;
        out.push('\n');
        return Ok(out);
    }

    let mut out = String::new();
    for record in records {
        out.push_str(&serde_json::to_string(record).context("Failed to serialise record")?);
        out.push('\n');
    }
    Ok(out)
}

/// Atomic write: temp file + rename, so readers never see a partial file.
fn write_atomic(path: &std::path::Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let tmp_path = path.with_extension("jsonl.tmp");
    std::fs::write(&tmp_path, contents)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

fn stage_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>2}/{len}  {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("█▉▊▋▌▍▎▏  ")
    .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"])
}

/// Trim an arXiv-style URL down to its distinctive tail for log lines.
fn short_url(url: &str) -> String {
    url.rsplit('/').next().unwrap_or(url).to_string()
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() > max {
        format!("{}\u{2026}", &s[..max.saturating_sub(1)])
    } else {
        s.to_string()
    }
}
