//! On-disk cache for successful GET responses.
//!
//! Entries are JSON files named by the SHA-256 of the URL. The directory is
//! pruned oldest-first after each store so it never grows past its budget.

use super::HttpPage;
use crate::error::ScraperError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    url: String,
    final_url: String,
    status: u16,
    stored_at: u64,
    body: String,
}

/// Response body cache shared by all requests of one client.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    directory: PathBuf,
    max_size_bytes: u64,
    max_age: Duration,
}

impl ResponseCache {
    pub fn new(directory: impl Into<PathBuf>, max_size_bytes: u64, max_age: Duration) -> Self {
        Self {
            directory: directory.into(),
            max_size_bytes,
            max_age,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn entry_path(&self, url: &str) -> PathBuf {
        let digest = Sha256::digest(url.as_bytes());
        self.directory.join(format!("{}.json", hex::encode(digest)))
    }

    /// Returns a fresh cached page for `url`, if any.
    pub async fn get(&self, url: &str) -> Option<HttpPage> {
        let path = self.entry_path(url);
        let raw = tokio::fs::read(&path).await.ok()?;
        let entry: CacheEntry = match serde_json::from_slice(&raw) {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "dropping corrupt cache entry");
                let _ = tokio::fs::remove_file(&path).await;
                return None;
            }
        };

        if entry.url != url || now_unix().saturating_sub(entry.stored_at) > self.max_age.as_secs() {
            return None;
        }

        tracing::debug!(url, "cache hit");
        Some(HttpPage {
            url: entry.final_url,
            status: entry.status,
            body: entry.body,
        })
    }

    /// Stores `page` as the response for `url` and prunes the directory.
    pub async fn put(&self, url: &str, page: &HttpPage) -> Result<(), ScraperError> {
        tokio::fs::create_dir_all(&self.directory).await?;

        let entry = CacheEntry {
            url: url.to_string(),
            final_url: page.url.clone(),
            status: page.status,
            stored_at: now_unix(),
            body: page.body.clone(),
        };
        let raw = serde_json::to_vec(&entry)?;
        if raw.len() as u64 > self.max_size_bytes {
            return Ok(());
        }

        let path = self.entry_path(url);
        tokio::fs::write(&path, raw).await?;
        self.prune(&path).await
    }

    /// Deletes the oldest entries until the directory fits the size budget.
    /// `keep` is never deleted.
    async fn prune(&self, keep: &Path) -> Result<(), ScraperError> {
        let mut entries = Vec::new();
        let mut total = 0u64;

        let mut dir = tokio::fs::read_dir(&self.directory).await?;
        while let Some(entry) = dir.next_entry().await? {
            let meta = entry.metadata().await?;
            if !meta.is_file() {
                continue;
            }
            total += meta.len();
            if entry.path() == keep {
                continue;
            }
            let modified = meta.modified().unwrap_or(UNIX_EPOCH);
            entries.push((modified, meta.len(), entry.path()));
        }

        if total <= self.max_size_bytes {
            return Ok(());
        }

        entries.sort_by_key(|(modified, _, _)| *modified);
        for (_, len, path) in entries {
            if total <= self.max_size_bytes {
                break;
            }
            tokio::fs::remove_file(&path).await?;
            total = total.saturating_sub(len);
        }

        Ok(())
    }
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
