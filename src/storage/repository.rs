use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::article::{sort_newest_first, Article};
use crate::config::Config;
use crate::error::Result;
use crate::remote::{HttpArticleSource, RemoteSource};
use crate::storage::cache::ArticleCache;
use crate::storage::persistent_cache::PersistentCacheConfig;
use crate::storage::traits::{ArticleListStream, ArticleRepository, ArticleStore, ArticleStream};

/// What a background refresh trigger should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Success,
    /// Try again later; backoff is the trigger's business.
    Retry,
}

impl RefreshOutcome {
    pub fn from_result<T>(result: &Result<T>) -> Self {
        match result {
            Ok(_) => RefreshOutcome::Success,
            Err(_) => RefreshOutcome::Retry,
        }
    }
}

/// Counters describing how reads were served.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryStats {
    pub fast_path_hits: u64,
    pub remote_fetches: u64,
    pub stale_fallbacks: u64,
    pub cache_write_failures: u64,
}

/// Offline-first repository over an article store and a remote source.
///
/// The store is only written after a remote fetch has completed
/// successfully, and no store lock is held while a fetch is in flight.
#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn ArticleStore>,
    remote: Arc<dyn RemoteSource>,
    metrics: Arc<RwLock<RepositoryStats>>,
}

impl Repository {
    pub fn new(store: Arc<dyn ArticleStore>, remote: Arc<dyn RemoteSource>) -> Self {
        Self {
            store,
            remote,
            metrics: Arc::new(RwLock::new(RepositoryStats::default())),
        }
    }

    pub fn store(&self) -> &Arc<dyn ArticleStore> {
        &self.store
    }

    pub fn stats(&self) -> RepositoryStats {
        self.metrics.read().clone()
    }

    /// Drop every cached article and the list metadata.
    pub async fn clear_cache(&self) -> Result<()> {
        self.store.clear().await
    }

    /// Run a forced refresh and reduce it to a succeed/retry signal.
    pub async fn trigger_refresh(&self) -> RefreshOutcome {
        let result = self.refresh_collection().await;
        let outcome = RefreshOutcome::from_result(&result);
        match &result {
            Ok(articles) => tracing::info!("Refresh succeeded with {} articles", articles.len()),
            Err(e) => tracing::warn!("Refresh failed, will retry: {}", e),
        }
        outcome
    }

    fn record_fast_path(&self) {
        self.metrics.write().fast_path_hits += 1;
    }

    fn record_remote_fetch(&self) {
        self.metrics.write().remote_fetches += 1;
    }

    fn record_fallback(&self) {
        self.metrics.write().stale_fallbacks += 1;
    }

    fn record_write_failure(&self) {
        self.metrics.write().cache_write_failures += 1;
    }
}

#[async_trait]
impl ArticleRepository for Repository {
    async fn get_collection(&self, force_refresh: bool) -> Result<Vec<Article>> {
        let is_stale = self.store.is_stale().await?;
        let has_cached = self.store.has_any().await?;

        if !force_refresh && has_cached && !is_stale {
            self.record_fast_path();
            tracing::debug!("Serving article list from fresh cache");
            return self.store.get_all().await;
        }

        self.record_remote_fetch();
        match self.remote.fetch_list().await {
            Ok(mut articles) => {
                // A failed write must not hide a successful fetch.
                if let Err(e) = self.store.replace_all(articles.clone()).await {
                    self.record_write_failure();
                    tracing::warn!("Failed to cache fetched articles: {}", e);
                }
                sort_newest_first(&mut articles);
                Ok(articles)
            }
            Err(error) => {
                let cached = self.store.get_all().await?;
                if cached.is_empty() {
                    tracing::warn!("Article list fetch failed with no cache: {}", error);
                    return Err(error.into());
                }

                self.record_fallback();
                tracing::warn!(
                    "Article list fetch failed ({}), serving {} cached articles",
                    error.error_code(),
                    cached.len()
                );
                Ok(cached)
            }
        }
    }

    async fn get_item(&self, id: &str, force_refresh: bool) -> Result<Article> {
        let cached = self.store.get_by_id(id).await?;

        if !force_refresh {
            if let Some(article) = cached {
                self.record_fast_path();
                tracing::debug!("Serving article {} from cache", id);
                return Ok(article);
            }
        }

        self.record_remote_fetch();
        match self.remote.fetch_one(id).await {
            Ok(article) => {
                if let Err(e) = self.store.upsert_one(article.clone()).await {
                    self.record_write_failure();
                    tracing::warn!("Failed to cache article {}: {}", id, e);
                }
                Ok(article)
            }
            Err(error) => match cached {
                Some(article) => {
                    self.record_fallback();
                    tracing::warn!(
                        "Fetch of article {} failed ({}), serving cached copy",
                        id,
                        error.error_code()
                    );
                    Ok(article)
                }
                None => Err(error.into()),
            },
        }
    }

    async fn refresh_collection(&self) -> Result<Vec<Article>> {
        self.get_collection(true).await
    }

    fn observe_collection(&self) -> ArticleListStream {
        self.store.observe_all()
    }

    fn observe_item(&self, id: &str) -> ArticleStream {
        self.store.observe_by_id(id)
    }
}

/// Builds repositories wired to the standard store and source.
pub struct RepositoryFactory;

impl RepositoryFactory {
    /// Persistent cache plus HTTP source, both taken from `config`.
    pub async fn from_config(config: &Config) -> Result<Repository> {
        let remote = HttpArticleSource::from_settings(&config.remote)?;
        let cache = ArticleCache::open(PersistentCacheConfig {
            cache_dir: config.cache_dir()?,
        })
        .await?;

        Ok(Repository::new(Arc::new(cache), Arc::new(remote)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::remote::DataError;
    use crate::storage::traits::{ManualClock, CACHE_TTL_MS};
    use futures::StreamExt;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const T0: i64 = 1_700_000_000_000;

    /// Remote source that replays queued responses and counts calls.
    #[derive(Default)]
    struct ScriptedSource {
        lists: parking_lot::Mutex<VecDeque<std::result::Result<Vec<Article>, DataError>>>,
        items: parking_lot::Mutex<VecDeque<std::result::Result<Article, DataError>>>,
        list_calls: AtomicUsize,
        item_calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn push_list(&self, response: std::result::Result<Vec<Article>, DataError>) {
            self.lists.lock().push_back(response);
        }

        fn push_item(&self, response: std::result::Result<Article, DataError>) {
            self.items.lock().push_back(response);
        }

        fn calls(&self) -> usize {
            self.list_calls.load(Ordering::SeqCst) + self.item_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RemoteSource for ScriptedSource {
        async fn fetch_list(&self) -> std::result::Result<Vec<Article>, DataError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            self.lists
                .lock()
                .pop_front()
                .unwrap_or(Err(DataError::Unknown { detail: Some("unscripted".into()) }))
        }

        async fn fetch_one(&self, _id: &str) -> std::result::Result<Article, DataError> {
            self.item_calls.fetch_add(1, Ordering::SeqCst);
            self.items
                .lock()
                .pop_front()
                .unwrap_or(Err(DataError::Unknown { detail: Some("unscripted".into()) }))
        }
    }

    /// Store whose writes always fail; reads delegate to an inner cache.
    struct ReadOnlyStore(ArticleCache);

    #[async_trait]
    impl ArticleStore for ReadOnlyStore {
        async fn replace_all(&self, _articles: Vec<Article>) -> Result<()> {
            Err(Error::Storage("read-only".into()))
        }
        async fn upsert_one(&self, _article: Article) -> Result<()> {
            Err(Error::Storage("read-only".into()))
        }
        async fn get_all(&self) -> Result<Vec<Article>> {
            self.0.get_all().await
        }
        async fn get_by_id(&self, id: &str) -> Result<Option<Article>> {
            self.0.get_by_id(id).await
        }
        async fn is_stale(&self) -> Result<bool> {
            self.0.is_stale().await
        }
        async fn has_any(&self) -> Result<bool> {
            self.0.has_any().await
        }
        async fn clear(&self) -> Result<()> {
            Err(Error::Storage("read-only".into()))
        }
        async fn metadata(&self) -> Result<Option<crate::storage::traits::CacheMetadata>> {
            self.0.metadata().await
        }
        async fn stats(&self) -> Result<crate::storage::traits::StoreStats> {
            self.0.stats().await
        }
        fn observe_all(&self) -> ArticleListStream {
            self.0.observe_all()
        }
        fn observe_by_id(&self, id: &str) -> ArticleStream {
            self.0.observe_by_id(id)
        }
    }

    fn article(id: &str, ts: i64) -> Article {
        Article::new(id, format!("Title {}", id), "summary", "content", ts)
    }

    fn setup() -> (Repository, Arc<ArticleCache>, Arc<ScriptedSource>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(T0));
        let cache = Arc::new(ArticleCache::in_memory().with_clock(clock.clone()));
        let source = Arc::new(ScriptedSource::default());
        let repo = Repository::new(cache.clone(), source.clone());
        (repo, cache, source, clock)
    }

    #[tokio::test]
    async fn test_cold_cache_fetches_and_caches() {
        let (repo, cache, source, _) = setup();
        let remote: Vec<_> = (1..=5).map(|i| article(&i.to_string(), i * 10)).collect();
        source.push_list(Ok(remote));

        let articles = repo.get_collection(false).await.unwrap();

        let ids: Vec<_> = articles.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["5", "4", "3", "2", "1"]);
        assert!(cache.has_any().await.unwrap());
        assert!(!cache.is_stale().await.unwrap());
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_fresh_cache_takes_fast_path() {
        let (repo, cache, source, _) = setup();
        cache.replace_all(vec![article("a", 1)]).await.unwrap();

        let articles = repo.get_collection(false).await.unwrap();

        assert_eq!(articles, vec![article("a", 1)]);
        assert_eq!(source.calls(), 0);
        assert_eq!(repo.stats().fast_path_hits, 1);
    }

    #[tokio::test]
    async fn test_stale_cache_refetches() {
        let (repo, cache, source, clock) = setup();
        cache.replace_all(vec![article("old", 1)]).await.unwrap();
        clock.advance(CACHE_TTL_MS + 1);
        source.push_list(Ok(vec![article("new", 2)]));

        let articles = repo.get_collection(false).await.unwrap();

        assert_eq!(articles, vec![article("new", 2)]);
        assert!(cache.get_by_id("old").await.unwrap().is_none());
        assert!(!cache.is_stale().await.unwrap());
    }

    #[tokio::test]
    async fn test_stale_cache_falls_back_on_timeout() {
        let (repo, cache, source, clock) = setup();
        let cached = vec![article("1", 3), article("2", 2), article("3", 1)];
        cache.replace_all(cached.clone()).await.unwrap();
        clock.advance(CACHE_TTL_MS + 1);
        source.push_list(Err(DataError::Timeout));

        let articles = repo.get_collection(false).await.unwrap();

        assert_eq!(articles, cached);
        assert_eq!(repo.stats().stale_fallbacks, 1);
        assert!(cache.is_stale().await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_cache_propagates_remote_error() {
        let (repo, _, source, _) = setup();
        let failure = DataError::backend("MAINTENANCE", "Maintenance", "Back soon");
        source.push_list(Err(failure.clone()));

        let err = repo.get_collection(false).await.unwrap_err();
        assert_eq!(err.as_remote(), Some(&failure));
    }

    #[tokio::test]
    async fn test_force_refresh_always_fetches() {
        let (repo, cache, source, _) = setup();
        cache.replace_all(vec![article("a", 1)]).await.unwrap();
        source.push_list(Ok(vec![article("b", 2), article("c", 3)]));

        let articles = repo.get_collection(true).await.unwrap();

        assert_eq!(articles, vec![article("c", 3), article("b", 2)]);
        assert_eq!(cache.get_all().await.unwrap(), articles);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_cache_write_failure_still_returns_fetch() {
        let source = Arc::new(ScriptedSource::default());
        let repo = Repository::new(Arc::new(ReadOnlyStore(ArticleCache::in_memory())), source.clone());
        source.push_list(Ok(vec![article("a", 1)]));
        source.push_item(Ok(article("b", 2)));

        assert_eq!(repo.get_collection(false).await.unwrap(), vec![article("a", 1)]);
        assert_eq!(repo.get_item("b", false).await.unwrap(), article("b", 2));
        assert_eq!(repo.stats().cache_write_failures, 2);
    }

    #[tokio::test]
    async fn test_get_item_cached_never_hits_remote_even_when_stale() {
        let (repo, cache, source, clock) = setup();
        cache.replace_all(vec![article("a", 1)]).await.unwrap();
        clock.advance(CACHE_TTL_MS * 3);

        let item = repo.get_item("a", false).await.unwrap();

        assert_eq!(item, article("a", 1));
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_get_item_miss_fetches_and_upserts() {
        let (repo, cache, source, _) = setup();
        cache.replace_all(vec![article("a", 1)]).await.unwrap();
        let meta = cache.metadata().await.unwrap();
        source.push_item(Ok(article("b", 2)));

        assert_eq!(repo.get_item("b", false).await.unwrap(), article("b", 2));
        assert_eq!(cache.get_all().await.unwrap().len(), 2);
        assert_eq!(cache.metadata().await.unwrap(), meta);
    }

    #[tokio::test]
    async fn test_get_item_forced_falls_back_to_cached_copy() {
        let (repo, cache, source, _) = setup();
        cache.upsert_one(article("a", 1)).await.unwrap();
        source.push_item(Err(DataError::Server { code: 500 }));

        assert_eq!(repo.get_item("a", true).await.unwrap(), article("a", 1));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_get_item_unknown_id_propagates_not_found() {
        let (repo, _, source, _) = setup();
        source.push_item(Err(DataError::not_found("zzz")));

        let err = repo.get_item("zzz", false).await.unwrap_err();
        assert_eq!(err.as_remote(), Some(&DataError::not_found("zzz")));
    }

    #[tokio::test]
    async fn test_refresh_outcomes() {
        let (repo, _, source, _) = setup();
        source.push_list(Err(DataError::network("offline")));
        assert_eq!(repo.trigger_refresh().await, RefreshOutcome::Retry);

        source.push_list(Ok(vec![article("a", 1)]));
        assert_eq!(repo.trigger_refresh().await, RefreshOutcome::Success);

        // Remote down but cache present: the fallback counts as success.
        source.push_list(Err(DataError::Timeout));
        assert_eq!(repo.trigger_refresh().await, RefreshOutcome::Success);
    }

    #[tokio::test]
    async fn test_observe_collection_reflects_fetches() {
        let (repo, _, source, _) = setup();
        let mut stream = repo.observe_collection();
        assert!(stream.next().await.unwrap().is_empty());

        source.push_list(Ok(vec![article("a", 1)]));
        repo.get_collection(false).await.unwrap();

        assert_eq!(stream.next().await.unwrap(), vec![article("a", 1)]);
    }

    #[tokio::test]
    async fn test_observe_item_reflects_detail_fetch() {
        let (repo, _, source, _) = setup();
        let mut stream = repo.observe_item("a");
        assert_eq!(stream.next().await.unwrap(), None);

        source.push_item(Ok(article("a", 1)));
        repo.get_item("a", false).await.unwrap();

        assert_eq!(stream.next().await.unwrap(), Some(article("a", 1)));
    }

    #[tokio::test]
    async fn test_clear_cache() {
        let (repo, cache, _, _) = setup();
        cache.replace_all(vec![article("a", 1)]).await.unwrap();

        repo.clear_cache().await.unwrap();

        assert!(!cache.has_any().await.unwrap());
        assert!(cache.is_stale().await.unwrap());
    }
}
