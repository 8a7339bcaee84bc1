use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::fmt;

use crate::auth::bearer_token;
use crate::error::FeedError;
use crate::state::AppState;

/// Identity of the caller, taken from a validated token
///
/// Inserted into the request extensions by `require_bearer_token`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSubject(pub String);

impl fmt::Display for AuthSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Middleware requiring `Authorization: Bearer <token>` with a valid, unexpired token
///
/// On success the token subject is stored as an `AuthSubject` extension.
/// Any failure short-circuits with 401 before the handler runs; the reason
/// is logged but never returned to the caller.
pub async fn require_bearer_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, FeedError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| FeedError::unauthenticated("missing Authorization header"))?;

    let header = header
        .to_str()
        .map_err(|_| FeedError::unauthenticated("Authorization header is not valid text"))?;

    let token = bearer_token(header)
        .ok_or_else(|| FeedError::unauthenticated("Authorization header is not a bearer token"))?;

    let subject = state.tokens.validate(token)?;

    request.extensions_mut().insert(AuthSubject(subject));
    Ok(next.run(request).await)
}
