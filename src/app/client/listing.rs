//! Candidate listing through `assets:listImages`
//!
//! Builds the paged listing request for a collection, region, and time
//! window, and turns each returned image into a `Candidate`.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use url::Url;

use crate::app::models::{Candidate, DateRange, Region, YearRule};
use crate::constants::earth_engine;
use crate::errors::{ProviderError, ProviderResult};

/// One page of a `listImages` response
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListImagesPage {
    #[serde(default)]
    pub images: Vec<ImageSummary>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// The subset of an image asset the selection needs
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSummary {
    /// Full resource name, e.g. `projects/earthengine-public/assets/COPERNICUS/...`
    pub name: String,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub properties: serde_json::Map<String, serde_json::Value>,
}

/// Resource name of a collection
///
/// Bare catalog ids live under the public catalog project; ids that are
/// already full resource names are used unchanged.
pub fn collection_resource(collection: &str) -> String {
    if collection.starts_with("projects/") {
        collection.to_string()
    } else {
        format!(
            "projects/{}/assets/{}",
            earth_engine::PUBLIC_CATALOG_PROJECT,
            collection
        )
    }
}

/// Build `{base}/v1/{resource}{suffix}`
pub fn resource_url(base_url: &str, resource: &str, suffix: &str) -> ProviderResult<Url> {
    let raw = format!(
        "{}/{}/{}{}",
        base_url.trim_end_matches('/'),
        earth_engine::API_VERSION,
        resource,
        suffix
    );
    Url::parse(&raw).map_err(|e| ProviderError::InvalidUrl {
        url: raw.clone(),
        error: e.to_string(),
    })
}

/// Query parameters for one listing page
pub fn list_query(
    region: &Region,
    range: &DateRange,
    rule: &YearRule,
    page_token: Option<&str>,
) -> Vec<(&'static str, String)> {
    let mut query = vec![
        (
            "startTime",
            range.start.to_rfc3339_opts(SecondsFormat::Secs, true),
        ),
        (
            "endTime",
            range.end.to_rfc3339_opts(SecondsFormat::Secs, true),
        ),
        ("region", region.bounds().to_geojson().to_string()),
        ("pageSize", earth_engine::LIST_PAGE_SIZE.to_string()),
        ("view", "FULL".to_string()),
    ];

    if let Some(max) = rule.max_cloud_cover {
        query.push(("filter", format!("{} < {}", rule.cloud_field, max)));
    }
    if let Some(token) = page_token {
        query.push(("pageToken", token.to_string()));
    }
    query
}

/// Convert a page into candidates, skipping images without usable metadata
pub fn candidates_from_page(page: &ListImagesPage, cloud_field: &str) -> Vec<Candidate> {
    page.images
        .iter()
        .filter_map(|image| {
            let acquired = image
                .start_time
                .as_deref()
                .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
                .map(|t| t.with_timezone(&Utc));
            let cloud_cover = image.properties.get(cloud_field).and_then(|v| v.as_f64());

            match (acquired, cloud_cover) {
                (Some(acquired), Some(cloud_cover)) => {
                    Some(Candidate::new(image.name.clone(), acquired, cloud_cover))
                }
                _ => {
                    tracing::debug!(
                        "Ignoring {}: missing start time or '{}' property",
                        image.name,
                        cloud_field
                    );
                    None
                }
            }
        })
        .collect()
}
