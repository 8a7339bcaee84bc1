//! Application state shared across all request handlers
//!
//! Everything in here is read-only after startup, so handlers never
//! contend on a lock; cloning the state only bumps reference counts.

use std::sync::Arc;

use crate::auth::TokenService;
use crate::config::FeedConfig;
use crate::mapper::LinkConfig;
use crate::search::{HttpSearchClient, SearchBackend, SearchResult};

#[derive(Clone)]
pub struct AppState {
    /// Service configuration
    pub config: Arc<FeedConfig>,
    /// Link settings derived from the configuration
    pub links: Arc<LinkConfig>,
    /// Backend the feed searches against
    pub search: Arc<dyn SearchBackend>,
    /// Token signer/verifier
    pub tokens: Arc<TokenService>,
}

impl AppState {
    /// Builds the production state, talking to the configured search API over HTTP
    pub fn new(config: FeedConfig) -> SearchResult<Self> {
        let client = HttpSearchClient::new(&config.search_client())?;
        Ok(Self::with_backend(config, Arc::new(client)))
    }

    /// Builds the state around any search backend
    pub fn with_backend(config: FeedConfig, search: Arc<dyn SearchBackend>) -> Self {
        Self {
            links: Arc::new(config.links()),
            tokens: Arc::new(TokenService::new(&config.auth_secret)),
            config: Arc::new(config),
            search,
        }
    }
}
