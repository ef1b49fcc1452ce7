//! Yearly run orchestration
//!
//! The coordinator walks the configured years in ascending order. For each
//! year it asks the provider for candidates under the applicable rule, picks
//! the least cloudy one, exports it, and collects a record. A year whose
//! query or export fails is logged and skipped; the run continues. When every
//! year has been visited the manifest is rewritten in full.
//!
//! - [`config`] - what a run covers and where it writes
//! - [`stats`] - per-year outcomes and run totals
//!
//! # Examples
//!
//! ```rust,no_run
//! use imagery_fetcher::app::{Coordinator, CoordinatorConfig, EarthEngineClient};
//! use imagery_fetcher::app::client::ClientConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CoordinatorConfig::default().with_years(2016, 2018);
//! let probe = config.rules.iter().next().map(|r| r.collection.clone()).unwrap_or_default();
//! let client = EarthEngineClient::from_env(ClientConfig::default(), &probe).await?;
//!
//! let report = Coordinator::new(config, &client).run().await?;
//! println!("{}", report.stats.summary());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod stats;

use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::app::manifest::Manifest;
use crate::app::models::{Candidate, DateRange, SelectedImageRecord, YearRule};
use crate::app::provider::ImageryProvider;
use crate::app::selection::select_best;
use crate::errors::{AppError, Result};

pub use config::CoordinatorConfig;
pub use stats::{RunReport, RunStats, SkipReason, SkippedYear, YearOutcome};

/// Drives the per-year selection against one provider session
pub struct Coordinator<'a, P: ImageryProvider + ?Sized> {
    config: CoordinatorConfig,
    provider: &'a P,
}

impl<'a, P: ImageryProvider + ?Sized> Coordinator<'a, P> {
    pub fn new(config: CoordinatorConfig, provider: &'a P) -> Self {
        Self { config, provider }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Run every year and write the manifest
    pub async fn run(&self) -> Result<RunReport> {
        self.run_with_progress(|_, _| {}).await
    }

    /// Run every year, calling `on_year` after each one
    ///
    /// # Errors
    ///
    /// Fails only when the configuration is invalid, the output directory
    /// cannot be created, or the manifest cannot be written. Provider
    /// failures are confined to the year they occur in.
    pub async fn run_with_progress<F>(&self, mut on_year: F) -> Result<RunReport>
    where
        F: FnMut(i32, &YearOutcome),
    {
        self.config.validate().map_err(AppError::generic)?;

        let started = Instant::now();
        let mut stats = RunStats::default();
        let mut outcomes = Vec::with_capacity(self.config.year_count());

        if !self.config.dry_run {
            tokio::fs::create_dir_all(&self.config.output_dir).await?;
        }

        info!(
            "Processing {}-{} with {} (output: {})",
            self.config.start_year,
            self.config.end_year,
            self.provider.provider_name(),
            self.config.output_dir.display()
        );

        for year in self.config.years() {
            let outcome = self.process_year(year).await;
            match &outcome {
                YearOutcome::Produced(record) => info!(
                    "{}: {} {} ({:.2}% cloud) -> {}",
                    year, record.satellite, record.date, record.cloud_cover, record.path
                ),
                YearOutcome::Selected {
                    satellite,
                    date,
                    cloud_cover,
                    ..
                } => info!(
                    "{}: would export {} {} ({:.2}% cloud)",
                    year, satellite, date, cloud_cover
                ),
                YearOutcome::Skipped(reason) => warn!("{}: skipped, {}", year, reason),
            }
            stats.record(year, &outcome);
            on_year(year, &outcome);
            outcomes.push((year, outcome));
        }

        stats.duration = started.elapsed();

        let (manifest, manifest_path) = if self.config.dry_run {
            (None, None)
        } else {
            let records = outcomes.iter().filter_map(|(_, outcome)| match outcome {
                YearOutcome::Produced(record) => Some(record.clone()),
                _ => None,
            });
            let manifest = Manifest::build(
                &self.config.region,
                records,
                stats.skipped_years(),
                Utc::now(),
            );
            let path = self.config.manifest_path();
            manifest.write_to(&path)?;
            (Some(manifest), Some(path))
        };

        info!("{}", stats.summary());

        Ok(RunReport {
            stats,
            outcomes,
            manifest,
            manifest_path,
        })
    }

    /// Select and (unless dry-running) export the image for one year
    pub async fn process_year(&self, year: i32) -> YearOutcome {
        let (rule, candidate) = match self.select_for_year(year).await {
            Ok(selection) => selection,
            Err(reason) => return YearOutcome::Skipped(reason),
        };

        let file_name = rule.raster_file_name(year);

        if self.config.dry_run {
            return YearOutcome::Selected {
                satellite: rule.label.clone(),
                date: candidate.date_string(),
                cloud_cover: candidate.cloud_cover,
                path: file_name,
            };
        }

        let destination = self.config.output_dir.join(&file_name);
        match self
            .provider
            .export_raster(&candidate, &self.config.region, rule, &destination)
            .await
        {
            Ok(dimensions) => YearOutcome::Produced(SelectedImageRecord::new(
                year, rule, &candidate, file_name, dimensions,
            )),
            Err(e) => YearOutcome::Skipped(SkipReason::ExportFailed(e.to_string())),
        }
    }

    /// Find the least cloudy candidate for a year
    ///
    /// Matching rules are tried in table order; a later rule is consulted
    /// only when the earlier ones yield nothing.
    pub async fn select_for_year(
        &self,
        year: i32,
    ) -> std::result::Result<(&YearRule, Candidate), SkipReason> {
        let range = DateRange::for_year(year).ok_or(SkipReason::NoRule)?;
        let mut last_reason = SkipReason::NoRule;

        for rule in self.config.rules.rules_for(year) {
            let candidates = match self
                .provider
                .query_candidates(&self.config.region, &range, rule)
                .await
            {
                Ok(candidates) => candidates,
                Err(e) => {
                    warn!("{}: {} query failed: {}", year, rule.label, e);
                    last_reason = SkipReason::QueryFailed(e.to_string());
                    continue;
                }
            };

            debug!("{}: {} returned {} candidates", year, rule.label, candidates.len());

            match select_best(&candidates) {
                Some(best) => return Ok((rule, best.clone())),
                None => {
                    debug!("{}: no {} imagery, trying next rule", year, rule.label);
                    last_reason = SkipReason::NoCandidates;
                }
            }
        }

        Err(last_reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::{RasterDimensions, Region};
    use crate::errors::{ProviderError, ProviderResult};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Provider serving fixed candidates keyed by (collection, year)
    #[derive(Default)]
    struct StubProvider {
        candidates: HashMap<(String, i32), Vec<Candidate>>,
        failing_queries: Vec<(String, i32)>,
        exports: Mutex<Vec<String>>,
    }

    impl StubProvider {
        fn with(mut self, collection: &str, year: i32, clouds: &[f64]) -> Self {
            let list = clouds
                .iter()
                .enumerate()
                .map(|(i, &cloud)| {
                    Candidate::new(
                        format!("{}/{}_{}", collection, year, i),
                        Utc.with_ymd_and_hms(year, 3, 1 + i as u32, 0, 0, 0).unwrap(),
                        cloud,
                    )
                })
                .collect();
            self.candidates.insert((collection.to_string(), year), list);
            self
        }
    }

    #[async_trait]
    impl ImageryProvider for StubProvider {
        fn provider_name(&self) -> &'static str {
            "stub"
        }

        async fn query_candidates(
            &self,
            _region: &Region,
            range: &DateRange,
            rule: &YearRule,
        ) -> ProviderResult<Vec<Candidate>> {
            let year = chrono::Datelike::year(&range.start);
            if self.failing_queries.contains(&(rule.collection.clone(), year)) {
                return Err(ProviderError::MaxRetriesExceeded { max_retries: 3 });
            }
            Ok(self
                .candidates
                .get(&(rule.collection.clone(), year))
                .cloned()
                .unwrap_or_default())
        }

        async fn export_raster(
            &self,
            candidate: &Candidate,
            _region: &Region,
            _rule: &YearRule,
            destination: &Path,
        ) -> ProviderResult<RasterDimensions> {
            tokio::fs::write(destination, b"raster").await?;
            self.exports.lock().unwrap().push(candidate.handle.0.clone());
            Ok(RasterDimensions {
                width: 64,
                height: 64,
            })
        }
    }

    fn config(dir: &TempDir) -> CoordinatorConfig {
        CoordinatorConfig::default()
            .with_years(2016, 2018)
            .with_rules(vec![
                YearRule::sentinel2(2015, 2024),
                YearRule::landsat8(2013, 2024),
            ])
            .with_output_dir(dir.path())
    }

    #[tokio::test]
    async fn test_fallback_rule_only_consulted_on_empty_result() {
        let dir = TempDir::new().unwrap();
        let provider = StubProvider::default()
            .with("COPERNICUS/S2_SR_HARMONIZED", 2016, &[8.0])
            .with("LANDSAT/LC08/C02/T1_L2", 2016, &[0.5])
            .with("LANDSAT/LC08/C02/T1_L2", 2017, &[4.0, 2.0]);
        let coordinator = Coordinator::new(config(&dir), &provider);

        let (rule, best) = coordinator.select_for_year(2016).await.unwrap();
        assert_eq!(rule.label, "Sentinel-2");
        assert_eq!(best.cloud_cover, 8.0);

        let (rule, best) = coordinator.select_for_year(2017).await.unwrap();
        assert_eq!(rule.label, "Landsat 8");
        assert_eq!(best.cloud_cover, 2.0);

        assert_eq!(
            coordinator.select_for_year(2018).await.unwrap_err(),
            SkipReason::NoCandidates
        );
    }

    #[tokio::test]
    async fn test_query_failure_falls_through_then_skips() {
        let dir = TempDir::new().unwrap();
        let mut provider = StubProvider::default().with("LANDSAT/LC08/C02/T1_L2", 2016, &[9.0]);
        provider
            .failing_queries
            .push(("COPERNICUS/S2_SR_HARMONIZED".to_string(), 2016));
        provider
            .failing_queries
            .push(("COPERNICUS/S2_SR_HARMONIZED".to_string(), 2017));
        provider
            .failing_queries
            .push(("LANDSAT/LC08/C02/T1_L2".to_string(), 2017));
        let coordinator = Coordinator::new(config(&dir), &provider);

        let (rule, _) = coordinator.select_for_year(2016).await.unwrap();
        assert_eq!(rule.label, "Landsat 8");

        assert!(matches!(
            coordinator.select_for_year(2017).await.unwrap_err(),
            SkipReason::QueryFailed(_)
        ));
    }

    #[tokio::test]
    async fn test_year_without_rule_is_skipped() {
        let dir = TempDir::new().unwrap();
        let provider = StubProvider::default();
        let config = config(&dir).with_rules(vec![YearRule::sentinel2(2015, 2016)]);
        let coordinator = Coordinator::new(config, &provider);

        assert_eq!(
            coordinator.process_year(2018).await,
            YearOutcome::Skipped(SkipReason::NoRule)
        );
    }

    #[tokio::test]
    async fn test_run_writes_manifest_with_skipped_years() {
        let dir = TempDir::new().unwrap();
        let provider = StubProvider::default()
            .with("COPERNICUS/S2_SR_HARMONIZED", 2016, &[12.0, 3.0, 45.0])
            .with("COPERNICUS/S2_SR_HARMONIZED", 2018, &[7.0]);
        let coordinator = Coordinator::new(config(&dir), &provider);

        let mut seen = Vec::new();
        let report = coordinator
            .run_with_progress(|year, _| seen.push(year))
            .await
            .unwrap();

        assert_eq!(seen, vec![2016, 2017, 2018]);
        assert_eq!(report.stats.years_produced, 2);
        assert_eq!(report.stats.skipped_years(), vec![2017]);

        let manifest = report.manifest.unwrap();
        assert_eq!(manifest.years(), vec![2016, 2018]);
        assert_eq!(manifest.record_for(2016).unwrap().cloud_cover, 3.0);
        assert_eq!(manifest.metadata.skipped_years, vec![2017]);
        assert!(dir.path().join("sentinel2_2016.png").exists());
        assert!(dir.path().join("viewer_config.json").exists());
    }

    #[tokio::test]
    async fn test_dry_run_exports_nothing() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out");
        let provider =
            StubProvider::default().with("COPERNICUS/S2_SR_HARMONIZED", 2017, &[1.0]);
        let config = config(&dir).with_output_dir(&output).with_dry_run(true);

        let report = Coordinator::new(config, &provider).run().await.unwrap();

        assert!(report.manifest.is_none());
        assert_eq!(report.stats.years_produced, 1);
        assert!(provider.exports.lock().unwrap().is_empty());
        assert!(!output.exists());
        assert!(matches!(
            report.outcomes[1].1,
            YearOutcome::Selected { ref path, .. } if path == "sentinel2_2017.png"
        ));
    }

    #[tokio::test]
    async fn test_invalid_config_rejected_before_any_query() {
        let dir = TempDir::new().unwrap();
        let provider = StubProvider::default();
        let config = config(&dir).with_years(2020, 2010);

        let result = Coordinator::new(config, &provider).run().await;
        assert!(matches!(result, Err(AppError::Generic { .. })));
    }
}
