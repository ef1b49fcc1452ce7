//! In-memory imagery provider for pipeline tests

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Datelike, TimeZone, Utc};

use imagery_fetcher::app::models::{
    Candidate, DateRange, RasterDimensions, Region, VisualizationParams, YearRule,
};
use imagery_fetcher::app::ImageryProvider;
use imagery_fetcher::errors::{ProviderError, ProviderResult};

/// Edge length of the rasters the fake provider writes
pub const FAKE_PX: u32 = 16;

/// Provider answering from a fixed candidate table
#[derive(Default)]
pub struct FakeProvider {
    candidates: HashMap<(String, i32), Vec<Candidate>>,
    failing_exports: HashSet<i32>,
    failing_queries: HashSet<(String, i32)>,
    pub queries: Mutex<Vec<(String, i32)>>,
    pub exports: Mutex<Vec<String>>,
}

impl FakeProvider {
    /// Add candidates for a collection and year, acquired on consecutive days
    pub fn with_candidates(mut self, collection: &str, year: i32, clouds: &[f64]) -> Self {
        let list = clouds
            .iter()
            .enumerate()
            .map(|(i, &cloud)| {
                Candidate::new(
                    format!("{}/{}_{:02}", collection, year, i),
                    Utc.with_ymd_and_hms(year, 4, 1 + i as u32, 21, 30, 0).unwrap(),
                    cloud,
                )
            })
            .collect();
        self.candidates.insert((collection.to_string(), year), list);
        self
    }

    pub fn failing_export(mut self, year: i32) -> Self {
        self.failing_exports.insert(year);
        self
    }

    pub fn failing_query(mut self, collection: &str, year: i32) -> Self {
        self.failing_queries.insert((collection.to_string(), year));
        self
    }

    pub fn export_count(&self) -> usize {
        self.exports.lock().unwrap().len()
    }
}

#[async_trait]
impl ImageryProvider for FakeProvider {
    fn provider_name(&self) -> &'static str {
        "fake"
    }

    async fn query_candidates(
        &self,
        _region: &Region,
        range: &DateRange,
        rule: &YearRule,
    ) -> ProviderResult<Vec<Candidate>> {
        let key = (rule.collection.clone(), range.start.year());
        self.queries.lock().unwrap().push(key.clone());

        if self.failing_queries.contains(&key) {
            return Err(ProviderError::ServerError {
                status: 500,
                body: "internal error".to_string(),
            });
        }

        let found = self.candidates.get(&key).cloned().unwrap_or_default();
        assert!(found.iter().all(|c| range.contains(&c.acquired)));
        Ok(found)
    }

    async fn export_raster(
        &self,
        candidate: &Candidate,
        _region: &Region,
        _rule: &YearRule,
        destination: &Path,
    ) -> ProviderResult<RasterDimensions> {
        self.exports
            .lock()
            .unwrap()
            .push(candidate.handle.0.clone());

        if self.failing_exports.contains(&candidate.acquired.year()) {
            return Err(ProviderError::NotAnImage {
                content_type: "application/json".to_string(),
            });
        }

        image::RgbImage::new(FAKE_PX, FAKE_PX)
            .save_with_format(destination, image::ImageFormat::Png)
            .map_err(ProviderError::ImageDecode)?;

        Ok(RasterDimensions {
            width: FAKE_PX,
            height: FAKE_PX,
        })
    }
}

/// A rule over `first..=last` for a made-up provider
pub fn rule(label: &str, collection: &str, first: i32, last: i32) -> YearRule {
    YearRule {
        label: label.to_string(),
        file_prefix: label.to_lowercase(),
        collection: collection.to_string(),
        cloud_field: "CLOUDS".to_string(),
        first_year: first,
        last_year: last,
        max_cloud_cover: None,
        native_resolution_m: 20.0,
        visualization: VisualizationParams {
            bands: vec!["R".into(), "G".into(), "B".into()],
            min: 0.0,
            max: 1.0,
            gamma: 1.0,
        },
    }
}
