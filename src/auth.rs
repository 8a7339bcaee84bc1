//! Bearer token issuance and validation
//!
//! Tokens are HS256 JWTs signed with the shared secret. They carry the
//! subject they were issued to and an expiry; nothing else is checked.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Claims carried by an API token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenClaims {
    /// Subject the token was issued to
    pub sub: String,
    /// Issued at, unix seconds
    pub iat: i64,
    /// Expiration, unix seconds
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Token rejected: {0}")]
    Rejected(#[from] jsonwebtoken::errors::Error),

    #[error("Token subject is empty")]
    EmptySubject,
}

/// Expiry used when the issuer does not ask for one
pub fn default_expiry() -> DateTime<FixedOffset> {
    NaiveDate::from_ymd_opt(3000, 1, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
        .unwrap_or_else(|| DateTime::<Utc>::MAX_UTC.fixed_offset())
}

/// Signs and verifies API tokens with one shared secret
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Issues a token bound to `subject`, valid until `expires`
    pub fn issue(&self, subject: &str, expires: DateTime<FixedOffset>) -> Result<String, TokenError> {
        let subject = subject.trim();
        if subject.is_empty() {
            return Err(TokenError::EmptySubject);
        }

        let claims = TokenClaims {
            sub: subject.to_string(),
            iat: Utc::now().timestamp(),
            exp: expires.timestamp(),
        };

        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// Verifies signature and expiry, returning the token's subject
    pub fn validate(&self, token: &str) -> Result<String, TokenError> {
        let data = decode::<TokenClaims>(token, &self.decoding, &self.validation)?;
        if data.claims.sub.trim().is_empty() {
            return Err(TokenError::EmptySubject);
        }
        Ok(data.claims.sub)
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header value
pub fn bearer_token(header_value: &str) -> Option<&str> {
    let (scheme, token) = header_value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
