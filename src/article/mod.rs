use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A single help article. Identity is `id`; two articles with the same id
/// are versions of the same entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub content: String,
    /// Epoch milliseconds, assigned by the author.
    pub last_updated_timestamp: i64,
}

/// Body of the list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticlesResponse {
    pub articles: Vec<Article>,
}

/// Body of the by-id endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleDetailResponse {
    pub article: Article,
}

/// Structured application-level rejection sent by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendErrorResponse {
    pub error_code: String,
    pub error_title: String,
    pub error_message: String,
}

impl Article {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        summary: impl Into<String>,
        content: impl Into<String>,
        last_updated_timestamp: i64,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            summary: summary.into(),
            content: content.into(),
            last_updated_timestamp,
        }
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.last_updated_timestamp).single()
    }

    /// Plain-text rendering used by the command line.
    pub fn to_text(&self) -> String {
        let mut text = String::new();

        text.push_str(&format!("Title: {}\n", self.title));
        text.push_str(&format!("Id: {}\n", self.id));

        if let Some(updated) = self.last_updated() {
            text.push_str(&format!("Updated: {}\n", updated.format("%Y-%m-%d %H:%M:%S UTC")));
        }

        text.push_str(&format!("\n{}\n\n---\n\n", self.summary));
        text.push_str(&self.content);

        text
    }
}

/// Newest first; ties ordered by id so snapshots are deterministic.
pub(crate) fn sort_newest_first(articles: &mut [Article]) {
    articles.sort_by(|a, b| {
        b.last_updated_timestamp
            .cmp(&a.last_updated_timestamp)
            .then_with(|| a.id.cmp(&b.id))
    });
}
