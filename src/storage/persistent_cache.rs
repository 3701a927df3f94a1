use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tokio::{fs, task};

use crate::article::{sort_newest_first, Article};
use crate::error::{Error, Result};
use crate::storage::traits::CacheMetadata;

/// Bump when the snapshot layout changes; older snapshots are discarded.
pub const CACHE_VERSION: u32 = 1;

const CACHE_FILE_NAME: &str = "articles_cache.json";

/// An article row as stored, with the time it was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedArticle {
    #[serde(flatten)]
    pub article: Article,
    pub cached_at_timestamp: i64,
}

/// The article table and the metadata table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheTables {
    pub articles: HashMap<String, CachedArticle>,
    pub metadata: HashMap<String, CacheMetadata>,
}

impl CacheTables {
    pub fn sorted_articles(&self) -> Vec<Article> {
        let mut articles: Vec<Article> = self
            .articles
            .values()
            .map(|row| row.article.clone())
            .collect();
        sort_newest_first(&mut articles);
        articles
    }
}

/// On-disk snapshot format
#[derive(Debug, Serialize, Deserialize)]
struct PersistentCacheData {
    cache_version: u32,
    saved_at: i64,
    tables: CacheTables,
}

/// Configuration for persistent cache
#[derive(Debug, Clone)]
pub struct PersistentCacheConfig {
    pub cache_dir: PathBuf,
}

impl Default for PersistentCacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("help-articles"),
        }
    }
}

/// Reads and writes the cache snapshot file.
///
/// Saves go to a uniquely named temporary file in the cache directory which
/// is synced and then renamed over the snapshot. A crash mid-write leaves the
/// previous snapshot in place, and concurrent writers never share a file.
#[derive(Debug)]
pub struct PersistentCache {
    cache_dir: PathBuf,
    cache_file: PathBuf,
}

impl PersistentCache {
    pub async fn new(config: PersistentCacheConfig) -> Result<Self> {
        fs::create_dir_all(&config.cache_dir).await.map_err(|e| {
            Error::Storage(format!(
                "Failed to create cache directory '{}': {}",
                config.cache_dir.display(),
                e
            ))
        })?;

        Ok(Self {
            cache_file: config.cache_dir.join(CACHE_FILE_NAME),
            cache_dir: config.cache_dir,
        })
    }

    /// Load the snapshot. A missing, unreadable-as-JSON or outdated snapshot
    /// yields `None`; only I/O failures are errors.
    pub async fn load(&self) -> Result<Option<CacheTables>> {
        let content = match fs::read(&self.cache_file).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("Cache file does not exist: {}", self.cache_file.display());
                return Ok(None);
            }
            Err(e) => {
                return Err(Error::Storage(format!(
                    "Failed to read cache file '{}': {}",
                    self.cache_file.display(),
                    e
                )))
            }
        };

        let data: PersistentCacheData = match serde_json::from_slice(&content) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(
                    "Discarding unreadable cache file {}: {}",
                    self.cache_file.display(),
                    e
                );
                return Ok(None);
            }
        };

        if data.cache_version != CACHE_VERSION {
            tracing::warn!(
                "Discarding cache file with version {} (expected {})",
                data.cache_version,
                CACHE_VERSION
            );
            return Ok(None);
        }

        tracing::info!(
            "Loaded cache: {} articles from {}",
            data.tables.articles.len(),
            self.cache_file.display()
        );

        Ok(Some(data.tables))
    }

    /// Write `tables` as the new snapshot.
    pub async fn save(&self, tables: &CacheTables, saved_at: i64) -> Result<()> {
        let data = PersistentCacheData {
            cache_version: CACHE_VERSION,
            saved_at,
            tables: tables.clone(),
        };

        let json_content = serde_json::to_vec_pretty(&data)?;

        let cache_dir = self.cache_dir.clone();
        let cache_file = self.cache_file.clone();
        task::spawn_blocking(move || write_snapshot(&cache_dir, &cache_file, &json_content))
            .await
            .map_err(|e| Error::Storage(format!("Cache save task failed: {}", e)))??;

        tracing::debug!(
            "Saved cache: {} articles to {}",
            tables.articles.len(),
            self.cache_file.display()
        );

        Ok(())
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_file
    }
}

fn write_snapshot(cache_dir: &Path, cache_file: &Path, content: &[u8]) -> Result<()> {
    let mut temp_file = NamedTempFile::new_in(cache_dir).map_err(|e| {
        Error::Storage(format!(
            "Failed to create temporary cache file in '{}': {}",
            cache_dir.display(),
            e
        ))
    })?;

    temp_file
        .write_all(content)
        .and_then(|_| temp_file.as_file().sync_all())
        .map_err(|e| {
            Error::Storage(format!(
                "Failed to write cache to '{}': {}",
                temp_file.path().display(),
                e
            ))
        })?;

    temp_file.persist(cache_file).map_err(|e| {
        Error::Storage(format!(
            "Failed to move cache file into '{}': {}",
            cache_file.display(),
            e.error
        ))
    })?;

    Ok(())
}
