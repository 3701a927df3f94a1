pub mod article;
pub mod cli;
pub mod config;
pub mod error;
pub mod remote;
pub mod storage;

pub use article::Article;
pub use config::Config;
pub use error::{Error, Result};
pub use remote::{DataError, HttpArticleSource, RemoteSource};
pub use storage::{ArticleCache, ArticleRepository, ArticleStore, RefreshOutcome, Repository};
