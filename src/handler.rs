//! HTTP request handlers for the public feed
//!
//! This module implements:
//! - The authenticated, paginated ad feed
//! - Issuance of API tokens for feed consumers
//! - Liveness and readiness probes

use axum::{
    extract::{Form, Query, State},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE, HOST},
        HeaderMap, HeaderValue, Uri,
    },
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::auth::default_expiry;
use crate::error::{FeedError, FeedResult};
use crate::mapper::map_result;
use crate::middleware::AuthSubject;
use crate::model::TokenRequest;
use crate::query::{self, InvalidParameter};
use crate::state::AppState;
use crate::timestamp::parse_boundary;

/// Lists active advertisements, one page at a time
///
/// The caller has already been authenticated by the bearer middleware.
/// This handler:
/// 1. Validates and clamps paging, and collects whitelisted filters
/// 2. Runs one search against the backend (no retries)
/// 3. Maps the hits into the public feed page
///
/// # Query Parameters
///
/// - `size` (optional) - Items per page, clamped to 1..=100 (default: 20)
/// - `page` (optional) - Zero-based page index (default: 0)
/// - `uuid`, `source`, `orgnr` - Exact match, repeat the key for OR
/// - `municipal`, `county` - Exact match on any of the ad's locations
/// - `updated`, `published` - Range, `[from,to]` or `>=X` / `<X` style
///
/// # Example Request
///
/// `GET /api/v1/ads?size=10&page=2&county=OSLO&published=[2018-01-01,*]`
///
/// # Response
///
/// - **200 OK** - A `FeedPage`
/// - **400 Bad Request** - Non-numeric paging or malformed date filter
/// - **502 Bad Gateway** - Backend unreachable, slow, failing or returning garbage
pub async fn list_ads(
    State(state): State<AppState>,
    Extension(subject): Extension<AuthSubject>,
    uri: Uri,
    headers: HeaderMap,
    Query(params): Query<Vec<(String, String)>>,
) -> FeedResult<Response> {
    info!(%subject, params = params.len(), "Feed request");

    let query = query::build(&params)?;
    let response = state.search.search(&query).await?;

    let host = request_host(&uri, &headers);

    let page = map_result(
        response,
        query.pagination.page,
        query.pagination.size,
        host,
        &state.links,
    );
    debug!(%subject, returned = page.content.len(), total = page.total_elements, "Feed page mapped");

    json_response(&page, state.config.pretty_json)
}

/// Issues an API token for a feed consumer
///
/// # Form Fields
///
/// - `subject` (required) - Identity the token is bound to
/// - `expires` (optional) - ISO date or timestamp, defaults to far future
///
/// # Response
///
/// **200 OK** with the token in an `Authorization: Bearer <token>` header,
/// repeated as the single line of the text body.
pub async fn new_api_token(
    State(state): State<AppState>,
    Form(form): Form<TokenRequest>,
) -> FeedResult<Response> {
    let subject = form
        .subject
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| FeedError::bad_request("Missing subject"))?;

    let expires = match form.expires.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => {
            parse_boundary(raw).map_err(|e| InvalidParameter::date("expires", raw, e))?
        }
        _ => default_expiry(),
    };

    let token = state
        .tokens
        .issue(&subject, expires)
        .map_err(|e| FeedError::internal(format!("Failed to sign token: {e}")))?;

    info!(subject = %subject.trim(), expires = %expires, "Issued API token");

    let bearer = format!("Bearer {token}");
    let header = HeaderValue::from_str(&bearer)
        .map_err(|e| FeedError::internal(format!("Token is not a valid header value: {e}")))?;

    Ok(([(AUTHORIZATION, header)], format!("Authorization: {bearer}\n")).into_response())
}

/// Host the client addressed, used for feed links when no public host is configured
///
/// HTTP/2 requests carry it in the URI authority, HTTP/1.1 requests in the
/// `Host` header. Values that could inject a path or break the link fall
/// back to `localhost`.
fn request_host<'a>(uri: &'a Uri, headers: &'a HeaderMap) -> &'a str {
    uri.authority()
        .map(|authority| authority.as_str())
        .or_else(|| headers.get(HOST).and_then(|value| value.to_str().ok()))
        .filter(|host| is_plain_host(host))
        .unwrap_or("localhost")
}

fn is_plain_host(host: &str) -> bool {
    !host.is_empty()
        && !host
            .chars()
            .any(|c| c == '/' || c == '\\' || c == '@' || c.is_whitespace() || c.is_control())
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Liveness probe
pub async fn is_alive() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "alive",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Readiness probe
///
/// The service holds no connections of its own, so it is ready as soon as
/// it is serving.
pub async fn is_ready() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ready",
        version: env!("CARGO_PKG_VERSION"),
    })
}

fn json_response<T: Serialize>(value: &T, pretty: bool) -> FeedResult<Response> {
    let body = if pretty {
        serde_json::to_vec_pretty(value)
    } else {
        serde_json::to_vec(value)
    }
    .map_err(|e| FeedError::internal(format!("Failed to serialize response: {e}")))?;

    Ok((
        [(CONTENT_TYPE, HeaderValue::from_static("application/json"))],
        body,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with_host(host: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(HOST, HeaderValue::from_str(host).unwrap());
        headers
    }

    #[test]
    fn request_host_prefers_uri_authority() {
        let uri: Uri = "https://feed.example.org/api/v1/ads".parse().unwrap();
        let headers = headers_with_host("other.example.org");
        assert_eq!(request_host(&uri, &headers), "feed.example.org");
    }

    #[test]
    fn request_host_falls_back_to_host_header() {
        let uri: Uri = "/api/v1/ads".parse().unwrap();
        let headers = headers_with_host("feed.internal:9021");
        assert_eq!(request_host(&uri, &headers), "feed.internal:9021");
    }

    #[test]
    fn suspicious_host_is_not_trusted() {
        let uri: Uri = "/api/v1/ads".parse().unwrap();
        for host in ["evil.example/phish", "a b", ""] {
            assert_eq!(request_host(&uri, &headers_with_host(host)), "localhost");
        }
        assert_eq!(request_host(&uri, &HeaderMap::new()), "localhost");
    }
}
