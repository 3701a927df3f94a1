use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use parking_lot::RwLock;
use tokio::sync::{watch, Mutex};

use crate::article::Article;
use crate::error::{Error, Result};
use crate::storage::persistent_cache::{
    CacheTables, CachedArticle, PersistentCache, PersistentCacheConfig,
};
use crate::storage::traits::{
    ArticleListStream, ArticleStore, ArticleStream, CacheMetadata, Clock, StoreStats,
    SystemClock, ARTICLES_LIST_KEY,
};

/// Article cache with optional on-disk persistence.
///
/// Tables live in memory behind a short-lived lock. Writers are serialized
/// and build the complete next state before publishing it, so readers only
/// ever observe whole tables. When persistence is enabled the next state is
/// saved first and published only if the save succeeded.
///
/// Each write runs on its own task. Dropping the caller's future does not
/// stop a write halfway, so memory and the snapshot never disagree.
pub struct ArticleCache {
    state: Arc<CacheState>,
    clock: Arc<dyn Clock>,
}

struct CacheState {
    tables: RwLock<CacheTables>,
    write_lock: Mutex<()>,
    changes: watch::Sender<Arc<Vec<Article>>>,
    persistence: Option<PersistentCache>,
}

impl CacheState {
    /// Persist and publish `next`. Callers hold `write_lock`.
    async fn commit(&self, next: CacheTables, now: i64) -> Result<()> {
        if let Some(persistence) = &self.persistence {
            persistence.save(&next, now).await?;
        }

        let snapshot = Arc::new(next.sorted_articles());
        *self.tables.write() = next;
        self.changes.send_replace(snapshot);
        Ok(())
    }

    fn list_metadata(&self) -> Option<CacheMetadata> {
        self.tables.read().metadata.get(ARTICLES_LIST_KEY).cloned()
    }
}

impl ArticleCache {
    fn from_parts(tables: CacheTables, persistence: Option<PersistentCache>) -> Self {
        let (changes, _) = watch::channel(Arc::new(tables.sorted_articles()));
        Self {
            state: Arc::new(CacheState {
                tables: RwLock::new(tables),
                write_lock: Mutex::new(()),
                changes,
                persistence,
            }),
            clock: Arc::new(SystemClock),
        }
    }

    /// A cache that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self::from_parts(CacheTables::default(), None)
    }

    /// A cache backed by a snapshot file in `config.cache_dir`.
    pub async fn open(config: PersistentCacheConfig) -> Result<Self> {
        let persistence = PersistentCache::new(config).await?;
        let tables = persistence.load().await?.unwrap_or_default();
        Ok(Self::from_parts(tables, Some(persistence)))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn is_valid(article: &Article) -> bool {
        !article.id.trim().is_empty()
    }

    /// Build the next tables from the current ones and commit them.
    ///
    /// Runs to completion on a spawned task even if the caller goes away.
    async fn write<F>(&self, build: F) -> Result<()>
    where
        F: FnOnce(&CacheTables, i64) -> CacheTables + Send + 'static,
    {
        let state = Arc::clone(&self.state);
        let clock = Arc::clone(&self.clock);

        let task = tokio::spawn(async move {
            let _guard = state.write_lock.lock().await;
            let now = clock.now_millis();
            let next = build(&state.tables.read(), now);
            state.commit(next, now).await
        });

        task.await
            .map_err(|e| Error::Storage(format!("Cache write did not complete: {}", e)))?
    }
}

#[async_trait]
impl ArticleStore for ArticleCache {
    async fn replace_all(&self, articles: Vec<Article>) -> Result<()> {
        let received = articles.len();
        let articles: Vec<Article> = articles.into_iter().filter(Self::is_valid).collect();
        if articles.len() < received {
            tracing::warn!(
                "Dropped {} articles with an empty id",
                received - articles.len()
            );
        }

        let count = articles.len();
        self.write(move |current, now| {
            let mut next = CacheTables {
                articles: Default::default(),
                metadata: current.metadata.clone(),
            };

            for article in articles {
                next.articles.insert(
                    article.id.clone(),
                    CachedArticle {
                        article,
                        cached_at_timestamp: now,
                    },
                );
            }

            next.metadata.insert(
                ARTICLES_LIST_KEY.to_string(),
                CacheMetadata {
                    key: ARTICLES_LIST_KEY.to_string(),
                    last_fetch_timestamp: now,
                    is_stale: false,
                },
            );
            next
        })
        .await?;

        tracing::info!("Cached {} articles", count);
        Ok(())
    }

    async fn upsert_one(&self, article: Article) -> Result<()> {
        if !Self::is_valid(&article) {
            return Err(Error::InvalidArticle(format!(
                "Article '{}' has an empty id",
                article.title
            )));
        }

        let id = article.id.clone();
        self.write(move |current, now| {
            let mut next = current.clone();
            next.articles.insert(
                article.id.clone(),
                CachedArticle {
                    article,
                    cached_at_timestamp: now,
                },
            );
            next
        })
        .await?;

        tracing::debug!("Cached article {}", id);
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<Article>> {
        Ok(self.state.tables.read().sorted_articles())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Article>> {
        Ok(self
            .state
            .tables
            .read()
            .articles
            .get(id)
            .map(|row| row.article.clone()))
    }

    async fn is_stale(&self) -> Result<bool> {
        let now = self.clock.now_millis();
        Ok(self
            .state
            .list_metadata()
            .map_or(true, |meta| meta.is_expired_at(now)))
    }

    async fn has_any(&self) -> Result<bool> {
        Ok(!self.state.tables.read().articles.is_empty())
    }

    async fn clear(&self) -> Result<()> {
        self.write(|current, _| {
            let mut next = CacheTables {
                articles: Default::default(),
                metadata: current.metadata.clone(),
            };
            next.metadata.remove(ARTICLES_LIST_KEY);
            next
        })
        .await?;

        tracing::info!("Cleared article cache");
        Ok(())
    }

    async fn metadata(&self) -> Result<Option<CacheMetadata>> {
        let now = self.clock.now_millis();
        Ok(self.state.list_metadata().map(|mut meta| {
            meta.is_stale = meta.is_expired_at(now);
            meta
        }))
    }

    async fn stats(&self) -> Result<StoreStats> {
        let now = self.clock.now_millis();
        let tables = self.state.tables.read();
        let meta = tables.metadata.get(ARTICLES_LIST_KEY);

        Ok(StoreStats {
            article_count: tables.articles.len(),
            last_fetch_timestamp: meta.map(|m| m.last_fetch_timestamp),
            is_stale: meta.map_or(true, |m| m.is_expired_at(now)),
        })
    }

    fn observe_all(&self) -> ArticleListStream {
        let rx = self.state.changes.subscribe();

        futures::stream::unfold((rx, true), |(mut rx, first)| async move {
            if !first {
                rx.changed().await.ok()?;
            }
            let snapshot = (**rx.borrow_and_update()).clone();
            Some((snapshot, (rx, false)))
        })
        .boxed()
    }

    fn observe_by_id(&self, id: &str) -> ArticleStream {
        let rx = self.state.changes.subscribe();
        let id = id.to_string();

        futures::stream::unfold(
            (rx, None::<Option<Article>>),
            move |(mut rx, last)| {
                let id = id.clone();
                async move {
                    loop {
                        if last.is_some() {
                            rx.changed().await.ok()?;
                        }
                        let current = rx
                            .borrow_and_update()
                            .iter()
                            .find(|article| article.id == id)
                            .cloned();
                        if last.as_ref() != Some(&current) {
                            return Some((current.clone(), (rx, Some(current))));
                        }
                    }
                }
            },
        )
        .boxed()
    }
}
