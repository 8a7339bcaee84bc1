//! Shared helpers for the integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use public_feed::config::FeedConfig;
use public_feed::model::SearchResponse;
use public_feed::query::SearchQuery;
use public_feed::route::create_app;
use public_feed::search::{SearchBackend, SearchError, SearchResult};
use public_feed::state::AppState;

pub const TEST_SECRET: &str = "test-secret";

/// What the stub backend answers with
pub enum Reply {
    /// A well-formed response with `total` hits, paged like the real index
    Hits { total: u64 },
    /// A fixed JSON document, decoded like a real response
    Raw(Value),
    /// A non-success status from the backend
    Unavailable,
}

/// In-memory `SearchBackend` that records every query document it receives
pub struct StubBackend {
    reply: Reply,
    pub queries: Mutex<Vec<Value>>,
}

impl StubBackend {
    pub fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            queries: Mutex::new(Vec::new()),
        })
    }

    pub fn last_query(&self) -> Value {
        self.queries
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("backend was not called")
    }

    pub fn calls(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

#[async_trait]
impl SearchBackend for StubBackend {
    async fn search(&self, query: &SearchQuery) -> SearchResult<SearchResponse> {
        self.queries.lock().unwrap().push(query.to_document());

        match &self.reply {
            Reply::Hits { total } => {
                let from = u64::from(query.pagination.from);
                let count = u64::from(query.pagination.fetch_size).min(total.saturating_sub(from));
                let hits: Vec<Value> = (from..from + count)
                    .map(|i| json!({ "_source": ad_source(&format!("ad-{i}")) }))
                    .collect();
                Ok(serde_json::from_value(json!({ "hits": { "total": total, "hits": hits } }))?)
            }
            Reply::Raw(body) => Ok(serde_json::from_value(body.clone())?),
            Reply::Unavailable => Err(SearchError::Status {
                status: StatusCode::SERVICE_UNAVAILABLE,
                body: "index is rebuilding".to_string(),
            }),
        }
    }
}

/// A backend `_source` document with every field the feed reads
pub fn ad_source(uuid: &str) -> Value {
    json!({
        "uuid": uuid,
        "created": "2018-01-01T10:00:00+01:00",
        "updated": "2018-01-02T10:00:00+01:00",
        "published": "2018-01-03T10:00:00+01:00",
        "expires": "2018-02-01T00:00:00+01:00",
        "title": "Systemutvikler",
        "source": "AMEDIA",
        "medium": "web",
        "reference": "REF-1",
        "businessName": "Acme AS",
        "status": "ACTIVE",
        "locationList": [{ "country": "NORGE", "county": "OSLO", "municipal": "OSLO" }],
        "properties": {
            "adtext": "<p>Join us</p>",
            "sourceurl": "https://source.example.org/ad",
            "occupation": "IT utvikling"
        }
    })
}

pub fn test_config(extra: &[(&str, &str)]) -> FeedConfig {
    let mut vars: Vec<(String, String)> = vec![("AUTH_SECRET".to_string(), TEST_SECRET.to_string())];
    vars.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));
    FeedConfig::from_lookup(move |name| {
        vars.iter()
            .rev()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    })
    .expect("test config")
}

/// Builds the router around a stub backend
pub fn setup_test_app(backend: Arc<StubBackend>, extra_config: &[(&str, &str)]) -> (axum::Router, AppState) {
    let state = AppState::with_backend(test_config(extra_config), backend);
    (create_app(state.clone()), state)
}

/// Issues a token through the token service shared with the router
pub fn token_for(state: &AppState, subject: &str) -> String {
    state
        .tokens
        .issue(subject, public_feed::auth::default_expiry())
        .expect("token")
}

/// Sends an authenticated GET and returns status and body bytes
pub async fn get_with_token(app: axum::Router, uri: &str, token: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(uri)
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    (status, body_bytes(response.into_body()).await)
}

pub async fn body_bytes(body: Body) -> Vec<u8> {
    body.collect()
        .await
        .expect("Failed to read response body")
        .to_bytes()
        .to_vec()
}

/// Helper function to parse response body as JSON
pub async fn response_json(body: Body) -> Value {
    serde_json::from_slice(&body_bytes(body).await).expect("Failed to parse JSON")
}
