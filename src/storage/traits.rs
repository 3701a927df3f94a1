use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::article::Article;
use crate::error::Result;

/// Cached list data older than this is stale.
pub const CACHE_TTL_MS: i64 = 24 * 60 * 60 * 1000;

/// Metadata key of the article list collection.
pub const ARTICLES_LIST_KEY: &str = "articles_list";

/// Live snapshots of the whole article table, newest first.
pub type ArticleListStream = BoxStream<'static, Vec<Article>>;

/// Live view of a single article row.
pub type ArticleStream = BoxStream<'static, Option<Article>>;

/// Fetch bookkeeping for one logical collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheMetadata {
    pub key: String,
    /// Epoch millis of the last full-list write.
    pub last_fetch_timestamp: i64,
    /// Advisory only. Staleness is always recomputed from the timestamp.
    pub is_stale: bool,
}

impl CacheMetadata {
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        now_ms.saturating_sub(self.last_fetch_timestamp) > CACHE_TTL_MS
    }
}

/// Summary of the store for status reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    pub article_count: usize,
    pub last_fetch_timestamp: Option<i64>,
    pub is_stale: bool,
}

/// Source of "now" for TTL decisions.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(now_ms: i64) -> Self {
        Self { now: AtomicI64::new(now_ms) }
    }

    pub fn set(&self, now_ms: i64) {
        self.now.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, delta_ms: i64) {
        self.now.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Local article cache.
///
/// `replace_all` and `clear` are atomic with respect to every reader: a
/// reader sees either the whole previous table or the whole new one.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Replace every row with `articles` and stamp the list metadata.
    async fn replace_all(&self, articles: Vec<Article>) -> Result<()>;

    /// Insert or overwrite one row. Never deletes rows or touches metadata.
    async fn upsert_one(&self, article: Article) -> Result<()>;

    /// All rows, newest `last_updated_timestamp` first.
    async fn get_all(&self) -> Result<Vec<Article>>;

    async fn get_by_id(&self, id: &str) -> Result<Option<Article>>;

    /// True when the list has never been fetched or the TTL has run out.
    async fn is_stale(&self) -> Result<bool>;

    async fn has_any(&self) -> Result<bool>;

    /// Drop all rows and the list metadata.
    async fn clear(&self) -> Result<()>;

    /// Metadata row for the list, with `is_stale` recomputed.
    async fn metadata(&self) -> Result<Option<CacheMetadata>>;

    async fn stats(&self) -> Result<StoreStats>;

    /// Current table, then a new snapshot after every write.
    fn observe_all(&self) -> ArticleListStream;

    /// Current row for `id`, then the row again whenever it changes.
    fn observe_by_id(&self, id: &str) -> ArticleStream;
}

/// Offline-first read access to articles.
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// Article list, from cache when fresh, otherwise from the remote with
    /// a fallback to whatever is cached.
    async fn get_collection(&self, force_refresh: bool) -> Result<Vec<Article>>;

    /// One article, from cache when present unless `force_refresh`.
    async fn get_item(&self, id: &str, force_refresh: bool) -> Result<Article>;

    /// `get_collection(true)`, the entry point for background refresh.
    async fn refresh_collection(&self) -> Result<Vec<Article>>;

    fn observe_collection(&self) -> ArticleListStream;

    fn observe_item(&self, id: &str) -> ArticleStream;
}
