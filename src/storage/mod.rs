pub mod cache;
pub mod persistent_cache;
pub mod repository;
pub mod traits;

pub use cache::ArticleCache;
pub use persistent_cache::{CachedArticle, CacheTables, PersistentCache, PersistentCacheConfig};
pub use repository::{RefreshOutcome, Repository, RepositoryFactory, RepositoryStats};
pub use traits::{
    ArticleListStream, ArticleRepository, ArticleStore, ArticleStream, CacheMetadata, Clock,
    ManualClock, StoreStats, SystemClock, ARTICLES_LIST_KEY, CACHE_TTL_MS,
};
