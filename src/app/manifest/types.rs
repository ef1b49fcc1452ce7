//! Manifest document types
//!
//! The manifest is the single JSON file the slider viewer reads: the region,
//! one record per year in ascending order, and run metadata.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::app::models::{Region, SelectedImageRecord};

/// Viewer manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub location: Location,
    /// Ascending by year, at most one per year
    pub images: Vec<SelectedImageRecord>,
    pub metadata: ManifestMetadata,
}

/// Region summary shown by the viewer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub lat: f64,
    pub lon: f64,
    pub radius_meters: f64,
}

impl From<&Region> for Location {
    fn from(region: &Region) -> Self {
        Self {
            name: region.name.clone(),
            description: region.description.clone(),
            lat: region.lat,
            lon: region.lon,
            radius_meters: region.radius_m,
        }
    }
}

/// Run-level fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestMetadata {
    pub generated: DateTime<Utc>,
    pub total_images: usize,
    pub date_range: DateRangeSummary,
    #[serde(default)]
    pub skipped_years: Vec<i32>,
}

/// First and last acquisition dates, or "unknown" when there are no images
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateRangeSummary {
    pub start: String,
    pub end: String,
}

const UNKNOWN_DATE: &str = "unknown";

impl Manifest {
    /// Assemble a manifest, ordering records by year
    ///
    /// If several records share a year only the first one is kept.
    pub fn build(
        region: &Region,
        records: impl IntoIterator<Item = SelectedImageRecord>,
        skipped_years: impl IntoIterator<Item = i32>,
        generated: DateTime<Utc>,
    ) -> Self {
        let mut by_year: BTreeMap<i32, SelectedImageRecord> = BTreeMap::new();
        for record in records {
            by_year.entry(record.year).or_insert(record);
        }
        let images: Vec<_> = by_year.into_values().collect();

        let mut skipped_years: Vec<i32> = skipped_years.into_iter().collect();
        skipped_years.sort_unstable();
        skipped_years.dedup();

        let date_range = DateRangeSummary {
            start: images
                .first()
                .map(|r| r.date.clone())
                .unwrap_or_else(|| UNKNOWN_DATE.to_string()),
            end: images
                .last()
                .map(|r| r.date.clone())
                .unwrap_or_else(|| UNKNOWN_DATE.to_string()),
        };

        Self {
            location: Location::from(region),
            metadata: ManifestMetadata {
                generated,
                total_images: images.len(),
                date_range,
                skipped_years,
            },
            images,
        }
    }

    /// Years with an image, in manifest order
    pub fn years(&self) -> Vec<i32> {
        self.images.iter().map(|r| r.year).collect()
    }

    /// The record for a year, if present
    pub fn record_for(&self, year: i32) -> Option<&SelectedImageRecord> {
        self.images.iter().find(|r| r.year == year)
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}
