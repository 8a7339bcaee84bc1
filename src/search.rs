//! Client for the backend search index
//!
//! The feed talks to the index through the `SearchBackend` trait so the
//! handler can be driven by a stub in tests. `HttpSearchClient` is the
//! production implementation: one `POST` per request, no retries.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::{debug, warn};

use crate::model::SearchResponse;
use crate::query::SearchQuery;

/// Path of the search endpoint, relative to the configured host
pub const SEARCH_PATH: &str = "/public-feed/ad/_search";

pub type SearchResult<T> = Result<T, SearchError>;

/// Failure talking to the backend search index
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Backend returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Invalid response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A backend able to run a feed search
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Runs the query and returns the decoded response
    async fn search(&self, query: &SearchQuery) -> SearchResult<SearchResponse>;
}

/// Configuration for the HTTP search client
#[derive(Debug, Clone)]
pub struct SearchClientConfig {
    /// Scheme and host of the search API, e.g. `http://search-api:9000`
    pub host: String,
    /// Upper bound on a single backend call
    pub timeout: Duration,
    /// Accept self-signed certificates; local development only
    pub accept_invalid_certs: bool,
}

/// reqwest-backed `SearchBackend`
pub struct HttpSearchClient {
    http: Client,
    url: String,
    timeout: Duration,
}

impl HttpSearchClient {
    /// Create a new search client.
    pub fn new(config: &SearchClientConfig) -> SearchResult<Self> {
        if config.accept_invalid_certs {
            warn!(host = %config.host, "TLS certificate verification is disabled for the search API");
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(SearchError::Network)?;

        Ok(Self {
            http,
            url: format!("{}{}", config.host.trim_end_matches('/'), SEARCH_PATH),
            timeout: config.timeout,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl SearchBackend for HttpSearchClient {
    async fn search(&self, query: &SearchQuery) -> SearchResult<SearchResponse> {
        let document = query.to_document();
        debug!(url = %self.url, from = query.pagination.from, size = query.pagination.fetch_size, "Sending search request");

        let response = self
            .http
            .post(&self.url)
            .json(&document)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Status { status, body });
        }

        let bytes = response.bytes().await.map_err(|e| self.classify(e))?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl HttpSearchClient {
    fn classify(&self, error: reqwest::Error) -> SearchError {
        if error.is_timeout() {
            SearchError::Timeout(self.timeout)
        } else {
            SearchError::Network(error)
        }
    }
}
