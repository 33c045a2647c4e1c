//! Content-addressed disk cache for converted documents.
//!
//! One JSON file per URL, named by the SHA-256 hex digest of the URL string.
//! The hash is purely for deterministic, filesystem-safe naming — any URL,
//! however long or strange, maps to a fixed-width name with negligible
//! collision probability.
//!
//! Entries are written once, atomically (temp file + rename), and then
//! trusted unconditionally: a readable, well-formed entry short-circuits
//! fetching and conversion entirely. There is no TTL and no versioning; if
//! the partitioning service's output format changes, stale entries are
//! served until the directory is deleted.

use crate::error::DigestError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One persisted conversion result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The original document URL.
    pub url: String,
    /// The extracted markdown text.
    pub markdown: String,
}

/// Handle to a cache directory.
///
/// Created once per run from [`crate::DigestConfig::cache_dir`] and passed
/// into the loader — never process-global state.
#[derive(Debug, Clone)]
pub struct MarkdownCache {
    dir: PathBuf,
}

impl MarkdownCache {
    /// Open the cache at `dir`, creating the directory if it does not exist.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, DigestError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| DigestError::CacheDir {
            path: dir.clone(),
            source: e,
        })?;
        Ok(Self { dir })
    }

    /// The directory this cache lives in.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Deterministic cache key for a URL: SHA-256 hex digest.
    pub fn key(url: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Path of the cache file for a URL.
    pub fn entry_path(&self, url: &str) -> PathBuf {
        self.dir.join(format!("{}.json", Self::key(url)))
    }

    /// Look up a URL. Returns `None` on a miss.
    ///
    /// A file that exists but cannot be read or parsed is treated as a miss
    /// (logged at WARN) so the next successful conversion repairs it.
    pub fn get(&self, url: &str) -> Option<CacheEntry> {
        let path = self.entry_path(url);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("cache entry {} unreadable, treating as miss: {}", path.display(), e);
                return None;
            }
        };
        match serde_json::from_str::<CacheEntry>(&raw) {
            Ok(entry) => {
                debug!("cache hit for {} ({})", url, path.display());
                Some(entry)
            }
            Err(e) => {
                warn!("cache entry {} malformed, treating as miss: {}", path.display(), e);
                None
            }
        }
    }

    /// Persist a conversion result under the URL's key.
    ///
    /// The entry is written to a temporary sibling and renamed into place so
    /// a crash mid-write never leaves a partial cache file behind.
    pub fn put(&self, url: &str, markdown: &str) -> Result<(), DigestError> {
        let entry = CacheEntry {
            url: url.to_string(),
            markdown: markdown.to_string(),
        };
        let json = serde_json::to_string(&entry)
            .map_err(|e| DigestError::Internal(format!("cache entry serialisation: {e}")))?;

        let path = self.entry_path(url);
        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, json).map_err(|e| DigestError::CacheWrite {
            path: tmp_path.clone(),
            source: e,
        })?;
        std::fs::rename(&tmp_path, &path).map_err(|e| DigestError::CacheWrite {
            path: path.clone(),
            source: e,
        })?;
        debug!("cached {} → {}", url, path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_temp_cache() -> (TempDir, MarkdownCache) {
        let dir = TempDir::new().unwrap();
        let cache = MarkdownCache::open(dir.path()).unwrap();
        (dir, cache)
    }

    #[test]
    fn key_is_deterministic() {
        assert_eq!(
            MarkdownCache::key("https://x/a.pdf"),
            MarkdownCache::key("https://x/a.pdf")
        );
    }

    #[test]
    fn distinct_urls_get_distinct_keys() {
        // Representative sample, including near-identical URLs.
        let urls = [
            "https://arxiv.org/pdf/2501.12948",
            "https://arxiv.org/pdf/2501.12949",
            "https://arxiv.org/pdf/2403.04642",
            "http://arxiv.org/pdf/2501.12948",
            "https://arxiv.org/pdf/2501.12948 ",
        ];
        let mut keys: Vec<String> = urls.iter().map(|u| MarkdownCache::key(u)).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), urls.len(), "cache keys must not collide");
    }

    #[test]
    fn key_is_hex_and_fixed_width() {
        let key = MarkdownCache::key("https://x/a.pdf");
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn open_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("deep").join("cache");
        let cache = MarkdownCache::open(&nested).unwrap();
        assert!(nested.is_dir());
        assert_eq!(cache.dir(), nested.as_path());
    }

    #[test]
    fn put_then_get_round_trips_both_fields() {
        let (_guard, cache) = open_temp_cache();
        cache.put("https://x/a.pdf", "# A\n\nbody with \"quotes\" and \\n").unwrap();

        let entry = cache.get("https://x/a.pdf").expect("entry must exist");
        assert_eq!(entry.url, "https://x/a.pdf");
        assert_eq!(entry.markdown, "# A\n\nbody with \"quotes\" and \\n");
    }

    #[test]
    fn miss_returns_none() {
        let (_guard, cache) = open_temp_cache();
        assert!(cache.get("https://x/never-seen.pdf").is_none());
    }

    #[test]
    fn malformed_entry_is_a_miss() {
        let (_guard, cache) = open_temp_cache();
        std::fs::write(cache.entry_path("https://x/a.pdf"), "{not json").unwrap();
        assert!(cache.get("https://x/a.pdf").is_none());

        // A later successful conversion repairs it.
        cache.put("https://x/a.pdf", "# repaired").unwrap();
        assert_eq!(cache.get("https://x/a.pdf").unwrap().markdown, "# repaired");
    }

    #[test]
    fn put_leaves_no_temp_files_behind() {
        let (_guard, cache) = open_temp_cache();
        cache.put("https://x/a.pdf", "# A").unwrap();
        let leftovers: Vec<_> = std::fs::read_dir(cache.dir())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn entry_file_is_plain_json_on_disk() {
        let (_guard, cache) = open_temp_cache();
        cache.put("https://x/a.pdf", "# A").unwrap();
        let raw = std::fs::read_to_string(cache.entry_path("https://x/a.pdf")).unwrap();
        let v: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(v["url"], "https://x/a.pdf");
        assert_eq!(v["markdown"], "# A");
    }
}
