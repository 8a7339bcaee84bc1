//! Mapping of backend search results into the public feed shape

use crate::model::{FeedAd, FeedLocation, FeedPage, Location, RawAd, SearchResponse};

/// Configuration for the links derived on every feed item
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Base of the public permalink, the ad uuid is appended as a path segment
    pub permalink_base: String,
    /// Host name the feed is published under; the request host is used when unset
    pub public_host: Option<String>,
    /// Scheme used for the feed link
    pub public_scheme: String,
    /// Path prefix the feed routes are mounted under
    pub context_path: String,
}

impl LinkConfig {
    fn permalink(&self, uuid: &str) -> String {
        format!("{}/{}", self.permalink_base.trim_end_matches('/'), uuid)
    }

    fn feed_link(&self, request_host: &str, uuid: &str) -> String {
        let host = self.public_host.as_deref().unwrap_or(request_host);
        format!(
            "{}://{}{}/api/v1/ads?uuid={}",
            self.public_scheme, host, self.context_path, uuid
        )
    }
}

/// Maps a backend response into one feed page
///
/// `page` and `size` are the effective (clamped) paging values. `totalPages`
/// is `totalElements / size` using floor division, so a partial last page
/// is not counted; `last` is true exactly when `page == totalPages`.
pub fn map_result(
    response: SearchResponse,
    page: u32,
    size: u32,
    request_host: &str,
    links: &LinkConfig,
) -> FeedPage {
    let total_elements = response.hits.total.value();
    let total_pages = total_elements / u64::from(size.max(1));

    let content = response
        .hits
        .hits
        .into_iter()
        .map(|hit| map_ad(hit.source, request_host, links))
        .collect();

    FeedPage {
        content,
        total_elements,
        page_number: page,
        page_size: size,
        total_pages,
        first: page == 0,
        last: u64::from(page) == total_pages,
    }
}

fn map_ad(ad: RawAd, request_host: &str, links: &LinkConfig) -> FeedAd {
    let props = ad.properties;

    let employer = ad
        .business_name
        .filter(|name| !name.trim().is_empty())
        .or(props.employer);

    let positioncount = props
        .positioncount
        .as_deref()
        .and_then(|count| count.trim().parse().ok());

    FeedAd {
        link: links.permalink(&ad.uuid),
        feed_link: links.feed_link(request_host, &ad.uuid),
        uuid: ad.uuid,
        created: ad.created,
        published: ad.published,
        expires: ad.expires,
        updated: ad.updated,
        title: ad.title,
        source: ad.source,
        medium: ad.medium,
        reference: ad.reference,
        employer,
        description: props.adtext,
        source_link: props.sourceurl,
        applicationdue: props.applicationdue,
        occupation: props.occupation,
        industry: props.industry,
        engagementtype: props.engagementtype,
        extent: props.extent,
        positioncount,
        sector: props.sector,
        locations: ad.locations.into_iter().map(map_location).collect(),
    }
}

fn map_location(location: Location) -> FeedLocation {
    FeedLocation {
        country: location.country,
        address: location.address,
        city: location.city,
        postal_code: location.postal_code,
        county: location.county,
        municipal: location.municipal,
    }
}
