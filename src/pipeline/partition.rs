//! Markdown conversion via a remote document-partitioning service.
//!
//! The service is an opaque capability: PDF bytes go in, markdown text
//! comes out, and it may fail. Everything the rest of the crate knows about
//! it is the [`PdfConverter`] trait; the concrete implementation posts to
//! the Aryn partitioning API, which is what produced the cached entries
//! this tool has always worked with. Swapping the backend means writing
//! another `PdfConverter` — the loader and cache are unaffected (though a
//! backend with different markdown output makes existing cache entries
//! stale; see the cache module).

use crate::config::DigestConfig;
use crate::error::DigestError;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Why a conversion attempt failed. Never retried by the loader.
#[derive(Debug, Clone)]
pub struct ConvertFailure {
    pub detail: String,
}

impl ConvertFailure {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

/// A collaborator that turns raw PDF bytes into markdown text.
#[async_trait]
pub trait PdfConverter: Send + Sync {
    async fn to_markdown(&self, bytes: Vec<u8>) -> Result<String, ConvertFailure>;
}

/// The slice of the partitioning response this crate consumes.
#[derive(Debug, Deserialize)]
struct PartitionResponse {
    markdown: String,
}

/// HTTP client for the Aryn document-partitioning service.
#[derive(Debug)]
pub struct ArynPartitioner {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl ArynPartitioner {
    /// Build a partitioner from config.
    ///
    /// The bearer token comes from `config.partition_api_key`, falling back
    /// to the `ARYN_API_KEY` environment variable.
    pub fn from_config(config: &DigestConfig) -> Result<Self, DigestError> {
        let api_key = config
            .partition_api_key
            .clone()
            .or_else(|| std::env::var("ARYN_API_KEY").ok().filter(|k| !k.is_empty()))
            .ok_or_else(|| DigestError::PartitionerNotConfigured {
                hint: "Set ARYN_API_KEY or pass partition_api_key in the configuration.".into(),
            })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.partition_timeout_secs))
            .build()
            .map_err(|e| DigestError::Internal(format!("partitioner HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.partition_url.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl PdfConverter for ArynPartitioner {
    async fn to_markdown(&self, bytes: Vec<u8>) -> Result<String, ConvertFailure> {
        debug!("partitioning {} bytes via {}", bytes.len(), self.endpoint);

        let file_part = reqwest::multipart::Part::bytes(bytes)
            .file_name("document.pdf")
            .mime_str("application/pdf")
            .map_err(|e| ConvertFailure::new(format!("building upload part: {e}")))?;
        let form = reqwest::multipart::Form::new()
            .part("file", file_part)
            .text("options", r#"{"output_format": "markdown"}"#);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ConvertFailure::new(format!("partition request: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(200).collect();
            return Err(ConvertFailure::new(format!(
                "partition service returned HTTP {status}: {snippet}"
            )));
        }

        let decoded: PartitionResponse = response
            .json()
            .await
            .map_err(|e| ConvertFailure::new(format!("partition response decode: {e}")))?;

        Ok(decoded.markdown)
    }
}
