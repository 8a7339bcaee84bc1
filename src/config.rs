//! Service configuration.
//!
//! Everything is read once at startup from the environment (optionally
//! seeded from a `.env` file) and injected into the application state.

use std::time::Duration;

use thiserror::Error;

use crate::mapper::LinkConfig;
use crate::search::SearchClientConfig;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Feed service configuration.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Port the HTTP server listens on
    pub port: u16,
    /// Scheme and host of the backend search API
    pub search_api_host: String,
    /// Timeout for one backend call
    pub search_timeout: Duration,
    /// Trust self-signed backend certificates (local development)
    pub accept_invalid_certs: bool,
    /// Shared secret signing API tokens
    pub auth_secret: String,
    /// Public host name used for feed links
    ///
    /// When unset the host the client addressed is echoed into every
    /// `feedLink`, so production deployments should set it.
    pub public_host: Option<String>,
    /// Scheme used for feed links
    pub public_scheme: String,
    /// Base URL of ad permalinks
    pub permalink_base: String,
    /// Path prefix for all routes, empty for none
    pub context_path: String,
    /// Indent JSON responses
    pub pretty_json: bool,
}

impl FeedConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Create config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Ok(Self {
            port: parsed(&lookup, "PORT", 9021)?,
            search_api_host: var("SEARCH_API_HOST")
                .unwrap_or_else(|| "http://localhost:9000".to_string()),
            search_timeout: Duration::from_secs(parsed(&lookup, "SEARCH_API_TIMEOUT_SECS", 10)?),
            accept_invalid_certs: flag(&lookup, "SEARCH_API_ACCEPT_INVALID_CERTS", false)?,
            auth_secret: var("AUTH_SECRET").ok_or(ConfigError::Missing("AUTH_SECRET"))?,
            public_host: var("PUBLIC_HOST"),
            public_scheme: var("PUBLIC_SCHEME").unwrap_or_else(|| "https".to_string()),
            permalink_base: var("AD_PERMALINK_BASE")
                .unwrap_or_else(|| "https://arbeidsplassen.nav.no/stillinger/stilling".to_string()),
            context_path: normalize_context_path(var("CONTEXT_PATH").as_deref().unwrap_or("")),
            pretty_json: flag(&lookup, "PRETTY_JSON", true)?,
        })
    }

    pub fn search_client(&self) -> SearchClientConfig {
        SearchClientConfig {
            host: self.search_api_host.clone(),
            timeout: self.search_timeout,
            accept_invalid_certs: self.accept_invalid_certs,
        }
    }

    pub fn links(&self) -> LinkConfig {
        LinkConfig {
            permalink_base: self.permalink_base.clone(),
            public_host: self.public_host.clone(),
            public_scheme: self.public_scheme.clone(),
            context_path: self.context_path.clone(),
        }
    }
}

fn parsed<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        _ => Ok(default),
    }
}

fn flag<F>(lookup: &F, name: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name).map(|v| v.trim().to_lowercase()).as_deref() {
        None | Some("") => Ok(default),
        Some("true") | Some("1") | Some("yes") => Ok(true),
        Some("false") | Some("0") | Some("no") => Ok(false),
        Some(other) => Err(ConfigError::Invalid {
            name,
            value: other.to_string(),
        }),
    }
}

/// `public-feed/` and `/public-feed` both become `/public-feed`; `/` becomes empty
fn normalize_context_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}
