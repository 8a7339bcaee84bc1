//! Data models for the public feed
//!
//! This module defines both sides of the translation:
//! - the documents returned by the backend search index (`SearchResponse`, `RawAd`)
//! - the public feed contract (`FeedPage`, `FeedAd`, `FeedLocation`)
//! - the form accepted by the token issuance endpoint

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};

use crate::timestamp;

/// Root of a backend `_search` response
///
/// # Example
/// ```json
/// { "hits": { "total": 25, "hits": [ { "_source": { "uuid": "..." } } ] } }
/// ```
#[derive(Deserialize, Debug, Clone)]
pub struct SearchResponse {
    pub hits: Hits,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Hits {
    pub total: HitTotal,
    #[serde(default)]
    pub hits: Vec<Hit>,
}

/// Total hit count as reported by the index
///
/// Older index versions report a plain integer, newer ones an object
/// carrying the count in `value`.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(untagged)]
pub enum HitTotal {
    Count(u64),
    Object { value: u64 },
}

impl HitTotal {
    pub fn value(self) -> u64 {
        match self {
            HitTotal::Count(value) | HitTotal::Object { value } => value,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct Hit {
    #[serde(rename = "_source")]
    pub source: RawAd,
}

/// An advertisement as stored in the backend index
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawAd {
    pub uuid: String,

    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created: DateTime<FixedOffset>,

    #[serde(deserialize_with = "timestamp::deserialize")]
    pub updated: DateTime<FixedOffset>,

    #[serde(deserialize_with = "timestamp::deserialize")]
    pub published: DateTime<FixedOffset>,

    #[serde(deserialize_with = "timestamp::deserialize")]
    pub expires: DateTime<FixedOffset>,

    pub title: String,
    pub source: String,
    #[serde(default)]
    pub medium: Option<String>,
    pub reference: String,

    /// Employer name registered on the ad itself, preferred over the property bag
    pub business_name: Option<String>,

    #[serde(rename = "locationList", default)]
    pub locations: Vec<Location>,

    #[serde(default)]
    pub properties: AdProperties,
}

/// The subset of the free-form backend property bag the feed exposes
///
/// Every property the feed reads is a named field here, so a renamed or
/// removed property shows up as a compile error in the mapper rather than
/// a silently missing value. Keys not listed are ignored.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct AdProperties {
    #[serde(deserialize_with = "scalar_string")]
    pub adtext: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    pub sourceurl: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    pub applicationdue: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    pub employer: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    pub engagementtype: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    pub extent: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    pub occupation: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    pub positioncount: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    pub sector: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    pub industry: Option<String>,
}

impl AdProperties {
    /// Property keys requested from the backend, as `_source` paths
    pub const SOURCE_PATHS: [&'static str; 10] = [
        "properties.adtext",
        "properties.sourceurl",
        "properties.applicationdue",
        "properties.employer",
        "properties.engagementtype",
        "properties.extent",
        "properties.occupation",
        "properties.positioncount",
        "properties.sector",
        "properties.industry",
    ];
}

/// Reads a property value as text whatever its JSON scalar type
///
/// The index does not enforce a type on property values, so `3`, `"3"` and
/// `true` are all accepted. `null` reads as absent.
fn scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Unsigned(u64),
        Signed(i64),
        Float(f64),
        Flag(bool),
    }

    Ok(Option::<Scalar>::deserialize(deserializer)?.map(|value| match value {
        Scalar::Text(text) => text,
        Scalar::Unsigned(n) => n.to_string(),
        Scalar::Signed(n) => n.to_string(),
        Scalar::Float(n) => n.to_string(),
        Scalar::Flag(b) => b.to_string(),
    }))
}

/// A location attached to a backend advertisement
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub country: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub county: Option<String>,
    pub municipal: Option<String>,
}

/// One page of the public feed
///
/// # Example
/// ```json
/// {
///   "content": [ ... ],
///   "totalElements": 105,
///   "pageNumber": 0,
///   "pageSize": 20,
///   "totalPages": 5,
///   "first": true,
///   "last": false
/// }
/// ```
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage {
    pub content: Vec<FeedAd>,
    pub total_elements: u64,
    pub page_number: u32,
    pub page_size: u32,
    pub total_pages: u64,
    pub first: bool,
    pub last: bool,
}

/// An advertisement in its public shape
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeedAd {
    pub uuid: String,

    #[serde(serialize_with = "timestamp::serialize")]
    pub created: DateTime<FixedOffset>,

    #[serde(serialize_with = "timestamp::serialize")]
    pub published: DateTime<FixedOffset>,

    #[serde(serialize_with = "timestamp::serialize")]
    pub expires: DateTime<FixedOffset>,

    #[serde(serialize_with = "timestamp::serialize")]
    pub updated: DateTime<FixedOffset>,

    pub title: String,
    pub source: String,
    pub medium: Option<String>,
    pub reference: String,
    pub employer: Option<String>,
    pub description: Option<String>,
    pub source_link: Option<String>,
    pub applicationdue: Option<String>,
    pub occupation: Option<String>,
    pub industry: Option<String>,
    pub engagementtype: Option<String>,
    pub extent: Option<String>,
    pub positioncount: Option<u32>,
    pub sector: Option<String>,
    pub locations: Vec<FeedLocation>,

    /// Public permalink to the advertisement
    pub link: String,

    /// Link to this single ad within the feed on the configured public host
    pub feed_link: String,
}

/// A location in its public shape; absent parts are left out of the JSON
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FeedLocation {
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub county: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub municipal: Option<String>,
}

/// Form payload for `POST /internal/newApiToken`
///
/// # Example
/// Form body: `subject=consumer@example.org&expires=2030-01-01`
#[derive(Deserialize, Debug)]
pub struct TokenRequest {
    /// Identity the token is bound to; logged on every feed request
    pub subject: Option<String>,

    /// Optional expiry as an ISO date or timestamp
    pub expires: Option<String>,
}
