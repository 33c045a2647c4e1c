//! LLM interaction: build the summary request and call the provider.
//!
//! This module turns one loaded document into a chat completion and returns
//! a decoded [`crate::output::DocumentResult`]. It is intentionally thin —
//! the prompt lives in [`crate::prompts`] and the response decoding in
//! [`super::decode`], so either can change without touching retry or
//! error-handling logic here.
//!
//! ## Retry Strategy
//!
//! HTTP 429 / 503 errors from LLM APIs are transient and frequent under
//! concurrent load. Exponential backoff (`retry_backoff_ms * 2^attempt`)
//! avoids thundering-herd: with 500 ms base and 3 retries the wait sequence
//! is 500 ms → 1 s → 2 s. A response that arrives but fails schema decoding
//! is *not* retried — the model answered; it answered wrongly.

use crate::config::DigestConfig;
use crate::error::SummaryError;
use crate::output::{DocumentResult, LoadedDocument, PaperRecord};
use crate::prompts::{summary_request, DEFAULT_SYSTEM_PROMPT};
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

/// Summarize a single loaded document.
///
/// ## Message Layout
///
/// 1. **System message** — the schema-describing prompt (or user override)
/// 2. **User message** — the paper markdown embedded in a short request
///
/// ## Return Value
///
/// Always returns a `DocumentResult` — never propagates the error upward,
/// so a single bad document doesn't abort the batch. A document that loaded
/// with empty markdown is reported as [`SummaryError::EmptyDocument`]
/// without any provider call.
pub async fn summarize_document(
    provider: &Arc<dyn LLMProvider>,
    doc: &LoadedDocument,
    config: &DigestConfig,
) -> DocumentResult {
    let start = Instant::now();
    let url = doc.url.clone();

    if doc.markdown.is_empty() {
        return DocumentResult {
            url: url.clone(),
            record: None,
            input_tokens: 0,
            output_tokens: 0,
            duration_ms: start.elapsed().as_millis() as u64,
            retries: 0,
            error: Some(SummaryError::EmptyDocument { url }),
        };
    }

    let system_prompt = config
        .system_prompt
        .as_deref()
        .unwrap_or(DEFAULT_SYSTEM_PROMPT);

    let messages = vec![
        ChatMessage::system(system_prompt),
        ChatMessage::user(summary_request(&doc.markdown)),
    ];

    let options = build_options(config);

    let mut last_err: Option<String> = None;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = config.retry_backoff_ms * 2u64.pow(attempt - 1);
            warn!(
                "{}: retry {}/{} after {}ms",
                url, attempt, config.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        match provider.chat(&messages, Some(&options)).await {
            Ok(response) => {
                let duration = start.elapsed();
                debug!(
                    "{}: {} input tokens, {} output tokens, {:?}",
                    url, response.prompt_tokens, response.completion_tokens, duration
                );

                return match super::decode::decode_response(&response.content) {
                    Ok(decoded) => DocumentResult {
                        url: url.clone(),
                        record: Some(PaperRecord {
                            url,
                            response: decoded,
                        }),
                        input_tokens: response.prompt_tokens as u32,
                        output_tokens: response.completion_tokens as u32,
                        duration_ms: duration.as_millis() as u64,
                        retries: attempt,
                        error: None,
                    },
                    Err(e) => {
                        warn!("{}: schema mismatch — {}", url, e.detail);
                        DocumentResult {
                            url: url.clone(),
                            record: None,
                            input_tokens: response.prompt_tokens as u32,
                            output_tokens: response.completion_tokens as u32,
                            duration_ms: duration.as_millis() as u64,
                            retries: attempt,
                            error: Some(SummaryError::SchemaMismatch {
                                url,
                                detail: e.detail,
                            }),
                        }
                    }
                };
            }
            Err(e) => {
                let err_msg = format!("{e}");
                warn!("{}: attempt {} failed — {}", url, attempt + 1, err_msg);
                last_err = Some(err_msg);
            }
        }
    }

    // All retries exhausted
    let duration = start.elapsed();
    let detail = last_err.unwrap_or_else(|| "unknown error".to_string());

    DocumentResult {
        url: url.clone(),
        record: None,
        input_tokens: 0,
        output_tokens: 0,
        duration_ms: duration.as_millis() as u64,
        retries: config.max_retries,
        error: Some(SummaryError::LlmFailed {
            url,
            retries: config.max_retries,
            detail,
        }),
    }
}

/// Build `CompletionOptions` from the digest config.
fn build_options(config: &DigestConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}
