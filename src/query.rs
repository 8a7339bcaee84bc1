//! Translation of feed request parameters into a backend search query
//!
//! Parameters arrive as raw key/value pairs (keys may repeat). Only
//! whitelisted keys are read; anything else is ignored so that clients
//! sending extra parameters never break.

use chrono::{DateTime, FixedOffset};
use serde_json::{json, Value};
use thiserror::Error;

use crate::model::AdProperties;
use crate::timestamp::{format_timestamp, parse_boundary};

/// Hard ceiling on `from + size`, protecting the backend from deep pagination
pub const MAX_TOTAL_HITS: u32 = 5000;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MIN_PAGE_SIZE: u32 = 1;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Exact-match filters: request parameter name and index field
const VALUE_FILTERS: [(&str, &str); 3] = [
    ("uuid", "uuid"),
    ("source", "source"),
    ("orgnr", "employer.orgnr"),
];

/// Exact-match filters on the nested location documents
const LOCATION_FILTERS: [(&str, &str); 2] = [
    ("municipal", "locationList.municipal"),
    ("county", "locationList.county"),
];

const LOCATION_PATH: &str = "locationList";

/// Timestamp fields that accept range filters
const RANGE_FILTERS: [&str; 2] = ["updated", "published"];

/// Top-level `_source` fields the result mapper reads
const SOURCE_FIELDS: [&str; 12] = [
    "uuid",
    "created",
    "updated",
    "published",
    "expires",
    "title",
    "source",
    "medium",
    "reference",
    "businessName",
    "locationList",
    "employer",
];

/// Which kind of value a rejected parameter was expected to hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    Numeric,
    Date,
}

/// A request parameter whose value could not be used
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Bad {} parameter value: {name}={value} ({reason})", kind_label(.kind))]
pub struct InvalidParameter {
    pub kind: ParameterKind,
    pub name: String,
    pub value: String,
    pub reason: String,
}

fn kind_label(kind: &ParameterKind) -> &'static str {
    match kind {
        ParameterKind::Numeric => "numeric",
        ParameterKind::Date => "date",
    }
}

impl InvalidParameter {
    pub fn numeric(name: &str, value: &str, reason: impl ToString) -> Self {
        Self {
            kind: ParameterKind::Numeric,
            name: name.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn date(name: &str, value: &str, reason: impl ToString) -> Self {
        Self {
            kind: ParameterKind::Date,
            name: name.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Effective paging after clamping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Zero-based page index, clamped to `[0, MAX_TOTAL_HITS / size]`
    pub page: u32,
    /// Page size, clamped to `[1, 100]`
    pub size: u32,
    /// Offset of the first hit, `page * size`
    pub from: u32,
    /// Hits requested from the backend, `min(size, MAX_TOTAL_HITS - from)`
    pub fetch_size: u32,
}

impl Pagination {
    /// Clamps a requested page and size into the reachable window
    pub fn clamped(page: i64, size: i64) -> Self {
        let size = size.clamp(MIN_PAGE_SIZE as i64, MAX_PAGE_SIZE as i64) as u32;
        let max_page = MAX_TOTAL_HITS / size;
        let page = page.clamp(0, max_page as i64) as u32;
        let from = page * size;
        let fetch_size = size.min(MAX_TOTAL_HITS - from);

        Self {
            page,
            size,
            from,
            fetch_size,
        }
    }
}

/// One boundary of a range filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bound {
    pub at: DateTime<FixedOffset>,
    pub inclusive: bool,
}

/// A single filter clause of the backend query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterClause {
    /// Field must equal one of the values
    Terms { field: &'static str, values: Vec<String> },
    /// Some nested location must have the field equal to one of the values
    LocationTerms { field: &'static str, values: Vec<String> },
    /// Timestamp field must lie within the bounds
    Range {
        field: &'static str,
        lower: Option<Bound>,
        upper: Option<Bound>,
    },
}

impl FilterClause {
    fn to_document(&self) -> Value {
        match self {
            FilterClause::Terms { field, values } => json!({ "terms": { (*field): values } }),
            FilterClause::LocationTerms { field, values } => json!({
                "nested": {
                    "path": LOCATION_PATH,
                    "query": { "terms": { (*field): values } }
                }
            }),
            FilterClause::Range { field, lower, upper } => {
                let mut bounds = serde_json::Map::new();
                if let Some(bound) = lower {
                    let key = if bound.inclusive { "gte" } else { "gt" };
                    bounds.insert(key.to_string(), json!(format_timestamp(&bound.at)));
                }
                if let Some(bound) = upper {
                    let key = if bound.inclusive { "lte" } else { "lt" };
                    bounds.insert(key.to_string(), json!(format_timestamp(&bound.at)));
                }
                json!({ "range": { (*field): bounds } })
            }
        }
    }
}

/// A validated search against the backend index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub pagination: Pagination,
    pub filters: Vec<FilterClause>,
}

impl SearchQuery {
    /// Renders the query as the JSON document the backend `_search` endpoint expects
    ///
    /// Sorting, the `status == ACTIVE` filter and the `_source` projection are
    /// fixed; only paging and the user filters vary.
    pub fn to_document(&self) -> Value {
        let mut filter = vec![json!({ "term": { "status": "ACTIVE" } })];
        filter.extend(self.filters.iter().map(FilterClause::to_document));

        let includes: Vec<&str> = SOURCE_FIELDS
            .iter()
            .chain(AdProperties::SOURCE_PATHS.iter())
            .copied()
            .collect();

        json!({
            "sort": [{ "published": "desc" }],
            "query": {
                "bool": { "filter": filter }
            },
            "_source": {
                "includes": includes,
                "excludes": []
            },
            "from": self.pagination.from,
            "size": self.pagination.fetch_size
        })
    }
}

/// Builds a search query from raw request parameters
///
/// # Errors
///
/// Returns `InvalidParameter` when `size` or `page` is not an integer, or
/// when a range filter value cannot be parsed.
pub fn build(params: &[(String, String)]) -> Result<SearchQuery, InvalidParameter> {
    let size = numeric_param(params, "size")?.unwrap_or(DEFAULT_PAGE_SIZE as i64);
    let page = numeric_param(params, "page")?.unwrap_or(0);
    let pagination = Pagination::clamped(page, size);

    let mut filters = Vec::new();

    for (name, field) in VALUE_FILTERS {
        let values = values_of(params, name);
        if !values.is_empty() {
            filters.push(FilterClause::Terms { field, values });
        }
    }

    for (name, field) in LOCATION_FILTERS {
        let values = values_of(params, name);
        if !values.is_empty() {
            filters.push(FilterClause::LocationTerms { field, values });
        }
    }

    for field in RANGE_FILTERS {
        for value in params.iter().filter(|(key, _)| key == field).map(|(_, v)| v) {
            let (lower, upper) = parse_range(field, value)?;
            filters.push(FilterClause::Range { field, lower, upper });
        }
    }

    Ok(SearchQuery {
        pagination,
        filters,
    })
}

/// First value of a numeric parameter, if present
fn numeric_param(params: &[(String, String)], name: &str) -> Result<Option<i64>, InvalidParameter> {
    params
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| {
            value
                .trim()
                .parse::<i64>()
                .map_err(|e| InvalidParameter::numeric(name, value, e))
        })
        .transpose()
}

/// All non-empty values of a parameter, deduplicated, in request order
fn values_of(params: &[(String, String)], name: &str) -> Vec<String> {
    let mut values: Vec<String> = Vec::new();
    for (_, value) in params.iter().filter(|(key, _)| key == name) {
        let value = value.trim();
        if !value.is_empty() && !values.iter().any(|v| v == value) {
            values.push(value.to_string());
        }
    }
    values
}

/// Parses a range filter value
///
/// Accepted forms:
/// - `[from,to]`, both ends inclusive, `*` leaves an end open
/// - `>=X`, `>X`, `<=X`, `<X`
fn parse_range(
    field: &str,
    value: &str,
) -> Result<(Option<Bound>, Option<Bound>), InvalidParameter> {
    let trimmed = value.trim();

    if let Some(inner) = trimmed.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        let (from, to) = inner
            .split_once(',')
            .ok_or_else(|| InvalidParameter::date(field, value, "expected [from,to]"))?;
        let lower = interval_end(field, value, from)?;
        let upper = interval_end(field, value, to)?;

        if lower.is_none() && upper.is_none() {
            return Err(InvalidParameter::date(field, value, "both ends are open"));
        }
        if let (Some(l), Some(u)) = (lower, upper) {
            if l.at > u.at {
                return Err(InvalidParameter::date(field, value, "start is after end"));
            }
        }
        return Ok((lower, upper));
    }

    let comparisons: [(&str, bool, bool); 4] = [
        (">=", true, true),
        ("<=", false, true),
        (">", true, false),
        ("<", false, false),
    ];
    for (prefix, is_lower, inclusive) in comparisons {
        if let Some(rest) = trimmed.strip_prefix(prefix) {
            let bound = Some(Bound {
                at: boundary(field, value, rest)?,
                inclusive,
            });
            return Ok(if is_lower { (bound, None) } else { (None, bound) });
        }
    }

    Err(InvalidParameter::date(
        field,
        value,
        "expected [from,to] or a comparison such as >=2018-01-01",
    ))
}

fn interval_end(field: &str, value: &str, end: &str) -> Result<Option<Bound>, InvalidParameter> {
    let end = end.trim();
    if end == "*" {
        return Ok(None);
    }
    boundary(field, value, end).map(|at| Some(Bound { at, inclusive: true }))
}

/// Parses one boundary, undoing the `+` to space decoding of query strings
fn boundary(field: &str, value: &str, raw: &str) -> Result<DateTime<FixedOffset>, InvalidParameter> {
    parse_boundary(&raw.trim().replace(' ', "+")).map_err(|e| InvalidParameter::date(field, value, e))
}
