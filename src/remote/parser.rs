use crate::article::{Article, ArticleDetailResponse, ArticlesResponse, BackendErrorResponse};
use crate::remote::DataError;

/// Decodes response bodies from the article endpoints. Unknown fields are
/// ignored so newer servers stay readable.
pub struct ResponseParser;

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse_list(&self, body: &[u8]) -> Result<Vec<Article>, DataError> {
        let response: ArticlesResponse = serde_json::from_slice(body)
            .map_err(|e| DataError::parse(format!("Failed to decode article list: {}", e)))?;
        Ok(response.articles)
    }

    pub fn parse_detail(&self, body: &[u8]) -> Result<Article, DataError> {
        let response: ArticleDetailResponse = serde_json::from_slice(body)
            .map_err(|e| DataError::parse(format!("Failed to decode article: {}", e)))?;
        Ok(response.article)
    }

    /// Structured rejection carried in an error body, if there is one.
    pub fn parse_backend_error(&self, body: &[u8]) -> Option<DataError> {
        let response: BackendErrorResponse = serde_json::from_slice(body).ok()?;
        Some(DataError::backend(
            response.error_code,
            response.error_title,
            response.error_message,
        ))
    }

    pub fn validate_base_url(&self, base_url: &str) -> crate::Result<url::Url> {
        let parsed = url::Url::parse(base_url)
            .map_err(|e| crate::Error::InvalidUrl(format!("Invalid URL: {}", e)))?;

        if parsed.cannot_be_a_base() {
            return Err(crate::Error::InvalidUrl(format!("Not a base URL: {}", base_url)));
        }

        match parsed.scheme() {
            "http" | "https" => Ok(parsed),
            scheme => Err(crate::Error::InvalidUrl(format!("Unsupported scheme: {}", scheme))),
        }
    }
}
