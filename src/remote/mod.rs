//! Remote article source: request/response access to the help backend.
//!
//! Nothing in here caches or retries. Every failure is classified into a
//! [`DataError`] so the repository can decide whether cached data can stand
//! in for it.

pub mod client;
pub mod error;
pub mod parser;

use async_trait::async_trait;

use crate::article::Article;

pub use client::HttpArticleSource;
pub use error::DataError;
pub use parser::ResponseParser;

/// Source of truth for article content.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Fetch the complete article list.
    async fn fetch_list(&self) -> Result<Vec<Article>, DataError>;

    /// Fetch one article. An unknown id is a [`DataError::Backend`]
    /// rejection, not a transport failure.
    async fn fetch_one(&self, id: &str) -> Result<Article, DataError>;
}
