//! Tests for the HTTP search client against an in-process search API

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use public_feed::query::build;
use public_feed::search::{HttpSearchClient, SearchBackend, SearchClientConfig, SearchError};

#[derive(Clone)]
struct FakeIndex {
    status: StatusCode,
    body: Value,
    delay: Duration,
    received: Arc<Mutex<Vec<Value>>>,
}

async fn fake_search(State(index): State<FakeIndex>, Json(query): Json<Value>) -> (StatusCode, Json<Value>) {
    index.received.lock().unwrap().push(query);
    tokio::time::sleep(index.delay).await;
    (index.status, Json(index.body.clone()))
}

/// Serves the fake index on an ephemeral port and returns its base URL
async fn serve(index: FakeIndex) -> String {
    let app = Router::new()
        .route("/public-feed/ad/_search", post(fake_search))
        .with_state(index);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

fn index(status: StatusCode, body: Value) -> FakeIndex {
    FakeIndex {
        status,
        body,
        delay: Duration::ZERO,
        received: Arc::new(Mutex::new(Vec::new())),
    }
}

fn client(host: String, timeout: Duration) -> HttpSearchClient {
    HttpSearchClient::new(&SearchClientConfig {
        host,
        timeout,
        accept_invalid_certs: false,
    })
    .unwrap()
}

fn source() -> Value {
    json!({
        "uuid": "ad-1",
        "created": "2018-01-01T10:00:00+01:00",
        "updated": "2018-01-02T10:00:00+01:00",
        "published": "2018-01-03T10:00:00+01:00",
        "expires": "2018-02-01T00:00:00+01:00",
        "title": "Lærer",
        "source": "DIR",
        "medium": "web",
        "reference": "R-9",
        "locationList": [],
        "properties": {}
    })
}

#[tokio::test]
async fn test_posts_query_document_and_decodes_hits() {
    let fake = index(
        StatusCode::OK,
        json!({ "took": 1, "hits": { "total": 1, "hits": [{ "_id": "x", "_source": source() }] } }),
    );
    let received = fake.received.clone();
    let host = serve(fake).await;

    let query = build(&[("size".to_string(), "5".to_string())]).unwrap();
    let client = client(format!("{host}/"), Duration::from_secs(5));
    assert_eq!(client.url(), format!("{host}/public-feed/ad/_search"));

    let response = client
        .search(&query)
        .await
        .unwrap();

    assert_eq!(response.hits.total.value(), 1);
    assert_eq!(response.hits.hits[0].source.uuid, "ad-1");

    let sent = received.lock().unwrap().clone();
    assert_eq!(sent, vec![query.to_document()]);
}

#[tokio::test]
async fn test_non_success_status_is_reported() {
    let host = serve(index(StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "shard failure" }))).await;
    let query = build(&[]).unwrap();

    let err = client(host, Duration::from_secs(5)).search(&query).await.unwrap_err();
    match err {
        SearchError::Status { status, body } => {
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert!(body.contains("shard failure"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_unexpected_payload_is_a_decode_error() {
    let host = serve(index(StatusCode::OK, json!({ "result": [] }))).await;
    let query = build(&[]).unwrap();

    let err = client(host, Duration::from_secs(5)).search(&query).await.unwrap_err();
    assert!(matches!(err, SearchError::Decode(_)));
}

#[tokio::test]
async fn test_slow_backend_times_out() {
    let mut fake = index(StatusCode::OK, json!({ "hits": { "total": 0, "hits": [] } }));
    fake.delay = Duration::from_secs(5);
    let host = serve(fake).await;
    let query = build(&[]).unwrap();

    let err = client(host, Duration::from_millis(200)).search(&query).await.unwrap_err();
    assert!(matches!(err, SearchError::Timeout(d) if d == Duration::from_millis(200)));
}

#[tokio::test]
async fn test_unreachable_backend_is_a_network_error() {
    // Bind and drop to get a port nobody listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let query = build(&[]).unwrap();
    let err = client(format!("http://{addr}"), Duration::from_secs(5))
        .search(&query)
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::Network(_)));
}
