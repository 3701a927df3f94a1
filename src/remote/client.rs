use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{Client, StatusCode};
use tokio::time::timeout;
use tracing::{debug, warn};
use url::Url;

use crate::article::Article;
use crate::config::RemoteSettings;
use crate::error::{Error, Result};
use crate::remote::{DataError, RemoteSource, ResponseParser};

/// Default per-request deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct HttpArticleSource {
    client: Client,
    base_url: Url,
    timeout_duration: Duration,
    user_agent: String,
}

impl HttpArticleSource {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = ResponseParser::new().validate_base_url(base_url)?;

        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::limited(10))
            .gzip(true)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            timeout_duration: DEFAULT_TIMEOUT,
            user_agent: format!("help-articles/{}", env!("CARGO_PKG_VERSION")),
        })
    }

    pub fn from_settings(settings: &RemoteSettings) -> Result<Self> {
        Ok(Self::new(&settings.base_url)?
            .with_timeout(Duration::from_secs(settings.timeout_secs))
            .with_user_agent(settings.user_agent.clone()))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_duration = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    fn endpoint(&self, segments: &[&str]) -> std::result::Result<Url, DataError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| DataError::Unknown {
                detail: Some(format!("Cannot build endpoint from {}", self.base_url)),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Issue a GET and read the whole body under one deadline.
    async fn get(&self, url: Url) -> std::result::Result<(StatusCode, Vec<u8>), DataError> {
        debug!("Fetching {}", url);

        let request = async {
            let response = self
                .client
                .get(url.clone())
                .header(USER_AGENT, &self.user_agent)
                .header(ACCEPT, "application/json")
                .send()
                .await
                .map_err(classify_transport)?;

            let status = response.status();
            let body = response.bytes().await.map_err(classify_transport)?;
            Ok::<_, DataError>((status, body.to_vec()))
        };

        match timeout(self.timeout_duration, request).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Request to {} timed out after {:?}", url, self.timeout_duration);
                Err(DataError::Timeout)
            }
        }
    }

    fn check_status(
        &self,
        status: StatusCode,
        body: &[u8],
        requested_id: Option<&str>,
    ) -> std::result::Result<(), DataError> {
        if status.is_success() {
            return Ok(());
        }

        if let Some(rejection) = ResponseParser::new().parse_backend_error(body) {
            return Err(rejection);
        }

        match (status, requested_id) {
            (StatusCode::NOT_FOUND, Some(id)) => Err(DataError::not_found(id)),
            _ => Err(DataError::Server { code: status.as_u16() }),
        }
    }
}

/// Map a reqwest failure onto the error taxonomy.
fn classify_transport(err: reqwest::Error) -> DataError {
    if err.is_timeout() {
        DataError::Timeout
    } else if err.is_decode() {
        DataError::parse(err.to_string())
    } else if err.is_builder() {
        DataError::Unknown { detail: Some(err.to_string()) }
    } else {
        DataError::network(err.to_string())
    }
}

#[async_trait]
impl RemoteSource for HttpArticleSource {
    async fn fetch_list(&self) -> std::result::Result<Vec<Article>, DataError> {
        let url = self.endpoint(&["articles"])?;
        let (status, body) = self.get(url).await?;
        self.check_status(status, &body, None)?;

        let articles = ResponseParser::new().parse_list(&body)?;
        debug!("Fetched {} articles", articles.len());
        Ok(articles)
    }

    async fn fetch_one(&self, id: &str) -> std::result::Result<Article, DataError> {
        let url = self.endpoint(&["articles", id])?;
        let (status, body) = self.get(url).await?;
        self.check_status(status, &body, Some(id))?;

        ResponseParser::new().parse_detail(&body)
    }
}
