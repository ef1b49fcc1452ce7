//! Data models for the yearly imagery selection
//!
//! This module contains the region of interest, the provider rule table that
//! maps years to collections, the transient candidate images returned by a
//! provider, and the per-year records persisted in the manifest.

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::constants::{defaults, files, geo};

/// Fixed geographic area queried and cropped to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Display name carried into the manifest
    #[serde(default)]
    pub name: Option<String>,
    /// Free-text description carried into the manifest
    #[serde(default)]
    pub description: Option<String>,
    /// Center latitude in decimal degrees
    pub lat: f64,
    /// Center longitude in decimal degrees
    pub lon: f64,
    /// Buffer radius in meters
    pub radius_m: f64,
}

impl Region {
    /// Create an unnamed region
    pub fn new(lat: f64, lon: f64, radius_m: f64) -> Self {
        Self {
            name: None,
            description: None,
            lat,
            lon,
            radius_m,
        }
    }

    /// Attach a display name and description
    pub fn with_label(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self.description = Some(description.into());
        self
    }

    /// Axis-aligned bounds of the radius buffer around the center
    pub fn bounds(&self) -> BoundingBox {
        let lat_delta = self.radius_m / geo::METERS_PER_DEGREE;
        // Guard the poles; cos(lat) shrinks to zero there
        let lon_scale = self.lat.to_radians().cos().abs().max(1e-6);
        let lon_delta = self.radius_m / (geo::METERS_PER_DEGREE * lon_scale);

        BoundingBox {
            west: self.lon - lon_delta,
            south: self.lat - lat_delta,
            east: self.lon + lon_delta,
            north: self.lat + lat_delta,
        }
    }

    /// Reasons this region cannot be used as a query geometry
    ///
    /// The bounds are only checked once the center and radius are sane,
    /// so each mistake is reported once.
    pub fn validation_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !(-90.0..=90.0).contains(&self.lat) {
            errors.push(format!("lat {} is outside [-90, 90]", self.lat));
        }
        if !(-180.0..=180.0).contains(&self.lon) {
            errors.push(format!("lon {} is outside [-180, 180]", self.lon));
        }
        if !(self.radius_m.is_finite() && self.radius_m > 0.0) {
            errors.push(format!(
                "radius_m {} must be a positive finite number",
                self.radius_m
            ));
        }

        if errors.is_empty() && !self.bounds().is_within_world() {
            errors.push(format!(
                "a {} m buffer around ({}, {}) extends past the valid coordinate range",
                self.radius_m, self.lat, self.lon
            ));
        }
        errors
    }
}

impl Default for Region {
    fn default() -> Self {
        Region::new(defaults::CENTER_LAT, defaults::CENTER_LON, defaults::RADIUS_M)
            .with_label(defaults::REGION_NAME, defaults::REGION_DESCRIPTION)
    }
}

/// Bounding geometry in WGS84 degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BoundingBox {
    /// Width in degrees of longitude
    pub fn width_deg(&self) -> f64 {
        self.east - self.west
    }

    /// Height in degrees of latitude
    pub fn height_deg(&self) -> f64 {
        self.north - self.south
    }

    /// Whether every edge lies within [-180, 180] x [-90, 90]
    pub fn is_within_world(&self) -> bool {
        let lon_ok = |v: f64| (-180.0..=180.0).contains(&v);
        let lat_ok = |v: f64| (-90.0..=90.0).contains(&v);
        lon_ok(self.west) && lon_ok(self.east) && lat_ok(self.south) && lat_ok(self.north)
    }

    /// GeoJSON polygon with a closed, counter-clockwise ring
    pub fn to_geojson(&self) -> serde_json::Value {
        json!({
            "type": "Polygon",
            "coordinates": [[
                [self.west, self.south],
                [self.east, self.south],
                [self.east, self.north],
                [self.west, self.north],
                [self.west, self.south],
            ]]
        })
    }
}

/// Half-open UTC time window `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// The full calendar year, Jan 1 up to (not including) Jan 1 of the next year
    pub fn for_year(year: i32) -> Option<Self> {
        let start = Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).single()?;
        let end = Utc.with_ymd_and_hms(year + 1, 1, 1, 0, 0, 0).single()?;
        Some(Self { start, end })
    }

    /// Whether a timestamp falls inside the window
    pub fn contains(&self, instant: &DateTime<Utc>) -> bool {
        *instant >= self.start && *instant < self.end
    }
}

/// How an exported image is rendered to 8-bit RGB
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualizationParams {
    /// Band names mapped to red, green, blue
    pub bands: Vec<String>,
    /// Value mapped to black
    pub min: f64,
    /// Value mapped to white
    pub max: f64,
    /// Gamma correction
    pub gamma: f64,
}

/// Maps a sub-range of years to one provider collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearRule {
    /// Satellite/provider label written to the manifest
    pub label: String,
    /// Prefix of raster file names, unique per rule
    pub file_prefix: String,
    /// Provider collection identifier
    pub collection: String,
    /// Metadata property holding the cloud-cover percentage
    pub cloud_field: String,
    /// First year covered (inclusive)
    pub first_year: i32,
    /// Last year covered (inclusive)
    pub last_year: i32,
    /// Server-side pre-filter: only candidates strictly below this value
    #[serde(default)]
    pub max_cloud_cover: Option<f64>,
    /// Native sensor resolution in meters per pixel
    pub native_resolution_m: f64,
    /// Rendering of the exported raster
    pub visualization: VisualizationParams,
}

impl YearRule {
    /// Sentinel-2 surface reflectance, harmonized
    pub fn sentinel2(first_year: i32, last_year: i32) -> Self {
        Self {
            label: "Sentinel-2".to_string(),
            file_prefix: "sentinel2".to_string(),
            collection: "COPERNICUS/S2_SR_HARMONIZED".to_string(),
            cloud_field: "CLOUDY_PIXEL_PERCENTAGE".to_string(),
            first_year,
            last_year,
            max_cloud_cover: Some(defaults::MAX_CLOUD_COVER),
            native_resolution_m: 10.0,
            visualization: VisualizationParams {
                bands: vec!["B4".into(), "B3".into(), "B2".into()],
                min: 0.0,
                max: 3000.0,
                gamma: 1.4,
            },
        }
    }

    /// Landsat 8 Collection 2 Tier 1 Level 2
    pub fn landsat8(first_year: i32, last_year: i32) -> Self {
        Self {
            label: "Landsat 8".to_string(),
            file_prefix: "landsat8".to_string(),
            collection: "LANDSAT/LC08/C02/T1_L2".to_string(),
            cloud_field: "CLOUD_COVER".to_string(),
            first_year,
            last_year,
            max_cloud_cover: Some(defaults::MAX_CLOUD_COVER),
            native_resolution_m: 30.0,
            visualization: VisualizationParams {
                // Raw DN; ~7000 is zero reflectance, ~30000 is 0.6
                bands: vec!["SR_B4".into(), "SR_B3".into(), "SR_B2".into()],
                min: 7000.0,
                max: 30000.0,
                gamma: 1.4,
            },
        }
    }

    /// Whether the rule's sub-range contains the year
    pub fn covers(&self, year: i32) -> bool {
        (self.first_year..=self.last_year).contains(&year)
    }

    /// Whether the prefix yields a plain file name inside the output directory
    ///
    /// Only ASCII letters, digits, `_` and `-` are allowed.
    pub fn has_plain_file_prefix(&self) -> bool {
        !self.file_prefix.is_empty()
            && self
                .file_prefix
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    }

    /// Deterministic raster file name for a year
    pub fn raster_file_name(&self, year: i32) -> String {
        format!(
            "{}_{}.{}",
            self.file_prefix,
            year,
            files::RASTER_EXTENSION
        )
    }
}

/// Ordered rule table checked top to bottom
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleTable {
    rules: Vec<YearRule>,
}

impl RuleTable {
    /// Build a table preserving the given order
    pub fn new(rules: Vec<YearRule>) -> Self {
        Self { rules }
    }

    /// Rules applicable to a year, in priority order
    ///
    /// The first entry is the rule that applies; any later entries are
    /// fallbacks consulted only when an earlier rule finds no imagery.
    pub fn rules_for(&self, year: i32) -> impl Iterator<Item = &YearRule> {
        self.rules.iter().filter(move |rule| rule.covers(year))
    }

    /// The rule that applies to a year, if any
    pub fn primary_rule(&self, year: i32) -> Option<&YearRule> {
        self.rules_for(year).next()
    }

    pub fn iter(&self) -> impl Iterator<Item = &YearRule> {
        self.rules.iter()
    }

    pub fn as_slice(&self) -> &[YearRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// The default table: Sentinel-2 from 2015, Landsat 8 for earlier years and as fallback
pub fn default_rules() -> Vec<YearRule> {
    vec![
        YearRule::sentinel2(2015, defaults::END_YEAR),
        YearRule::landsat8(defaults::START_YEAR, defaults::END_YEAR),
    ]
}

/// Opaque provider reference to a single image
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageHandle(pub String);

impl fmt::Display for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An image returned by a provider query; exists only during selection
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub handle: ImageHandle,
    pub acquired: DateTime<Utc>,
    pub cloud_cover: f64,
}

impl Candidate {
    pub fn new(handle: impl Into<String>, acquired: DateTime<Utc>, cloud_cover: f64) -> Self {
        Self {
            handle: ImageHandle(handle.into()),
            acquired,
            cloud_cover,
        }
    }

    /// Acquisition date as `YYYY-MM-DD`
    pub fn date_string(&self) -> String {
        self.acquired.format("%Y-%m-%d").to_string()
    }
}

/// Pixel size of an exported raster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterDimensions {
    pub width: u32,
    pub height: u32,
}

/// One manifest entry; written once per year, never mutated afterwards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedImageRecord {
    pub year: i32,
    pub satellite: String,
    pub date: String,
    pub cloud_cover: f64,
    /// Raster location relative to the manifest's directory
    pub path: String,
    pub width: u32,
    pub height: u32,
    pub resolution_meters_per_pixel: f64,
}

impl SelectedImageRecord {
    /// Build the record for an exported candidate
    pub fn new(
        year: i32,
        rule: &YearRule,
        candidate: &Candidate,
        path: impl Into<String>,
        dimensions: RasterDimensions,
    ) -> Self {
        Self {
            year,
            satellite: rule.label.clone(),
            date: candidate.date_string(),
            cloud_cover: candidate.cloud_cover,
            path: path.into(),
            width: dimensions.width,
            height: dimensions.height,
            resolution_meters_per_pixel: rule.native_resolution_m,
        }
    }
}
