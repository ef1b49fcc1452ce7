//! Integration tests for the yearly selection pipeline
//!
//! These tests drive the coordinator end to end against an in-memory
//! provider and read the result back through the manifest read path.

mod fake;

use std::path::Path;

use tempfile::TempDir;

use fake::{rule, FakeProvider, FAKE_PX};
use imagery_fetcher::app::{
    verify_manifest, Coordinator, CoordinatorConfig, Manifest, SkipReason, YearOutcome,
};
use imagery_fetcher::errors::AppError;

const P1: &str = "TEST/P1";
const P2: &str = "TEST/P2";

/// Two partitioning rules: P1 for 2013-2021, P2 for 2022-2024
fn two_rule_config(output: &Path) -> CoordinatorConfig {
    CoordinatorConfig::default()
        .with_years(2013, 2024)
        .with_rules(vec![rule("P1", P1, 2013, 2021), rule("P2", P2, 2022, 2024)])
        .with_output_dir(output)
}

/// Every year has imagery except 2020; 2017 offers {12, 3, 45}
fn two_rule_provider() -> FakeProvider {
    let mut provider = FakeProvider::default();
    for year in 2013..=2021 {
        if year == 2020 {
            continue;
        }
        let clouds: &[f64] = if year == 2017 {
            &[12.0, 3.0, 45.0]
        } else {
            &[20.0, 10.0]
        };
        provider = provider.with_candidates(P1, year, clouds);
    }
    for year in 2022..=2024 {
        provider = provider.with_candidates(P2, year, &[5.0]);
    }
    provider
}

#[tokio::test]
async fn test_two_rule_scenario() {
    let temp_dir = TempDir::new().unwrap();
    let provider = two_rule_provider();

    let report = Coordinator::new(two_rule_config(temp_dir.path()), &provider)
        .run()
        .await
        .unwrap();

    let manifest = report.manifest.expect("manifest written");
    assert_eq!(manifest.images.len(), 11);
    assert_eq!(manifest.metadata.total_images, 11);

    let record_2017 = manifest.record_for(2017).unwrap();
    assert_eq!(record_2017.cloud_cover, 3.0);
    assert_eq!(record_2017.satellite, "P1");
    assert_eq!(record_2017.path, "p1_2017.png");
    assert_eq!(record_2017.width, FAKE_PX);

    assert!(manifest.record_for(2020).is_none());
    assert_eq!(manifest.metadata.skipped_years, vec![2020]);
    assert_eq!(manifest.record_for(2023).unwrap().satellite, "P2");

    // Ascending and at most one per year
    let years = manifest.years();
    assert!(years.windows(2).all(|w| w[0] < w[1]));
    assert!(years.iter().all(|y| (2013..=2024).contains(y)));

    // One export per produced year, none for the empty year
    assert_eq!(provider.export_count(), 11);
    assert_eq!(report.stats.years_total, 12);
    assert_eq!(report.stats.years_produced, 11);
    assert_eq!(report.stats.skipped[0].reason, SkipReason::NoCandidates);
}

#[tokio::test]
async fn test_selected_cloud_cover_is_minimum() {
    let temp_dir = TempDir::new().unwrap();
    let provider = two_rule_provider();

    let report = Coordinator::new(two_rule_config(temp_dir.path()), &provider)
        .run()
        .await
        .unwrap();

    for record in &report.manifest.unwrap().images {
        let expected = match record.year {
            2017 => 3.0,
            2022..=2024 => 5.0,
            _ => 10.0,
        };
        assert_eq!(record.cloud_cover, expected, "year {}", record.year);
    }
}

#[tokio::test]
async fn test_manifest_round_trips_through_read_path() {
    let temp_dir = TempDir::new().unwrap();
    let provider = two_rule_provider();

    let report = Coordinator::new(two_rule_config(temp_dir.path()), &provider)
        .run()
        .await
        .unwrap();
    let manifest_path = report.manifest_path.unwrap();
    assert_eq!(manifest_path, temp_dir.path().join("viewer_config.json"));

    let loaded = Manifest::load(&manifest_path).unwrap();
    assert_eq!(Some(loaded.clone()), report.manifest);

    // Every path resolves to a decodable raster of the recorded size
    for record in &loaded.images {
        let bytes = std::fs::read(temp_dir.path().join(&record.path)).unwrap();
        let img = image::load_from_memory(&bytes).unwrap();
        assert_eq!((img.width(), img.height()), (record.width, record.height));
    }
    assert!(verify_manifest(&loaded, temp_dir.path()).is_ok());
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let provider = two_rule_provider();
    let coordinator = Coordinator::new(two_rule_config(temp_dir.path()), &provider);

    let first = coordinator.run().await.unwrap().manifest.unwrap();
    let second = coordinator.run().await.unwrap().manifest.unwrap();

    assert_eq!(first.images, second.images);
    assert_eq!(first.metadata.skipped_years, second.metadata.skipped_years);

    // Rasters were overwritten in place, not duplicated
    let rasters = std::fs::read_dir(temp_dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "png"))
        .count();
    assert_eq!(rasters, 11);
}

#[tokio::test]
async fn test_export_failure_skips_only_that_year() {
    let temp_dir = TempDir::new().unwrap();
    let provider = two_rule_provider().failing_export(2015);

    let report = Coordinator::new(two_rule_config(temp_dir.path()), &provider)
        .run()
        .await
        .unwrap();
    let manifest = report.manifest.unwrap();

    assert_eq!(manifest.images.len(), 10);
    assert!(manifest.record_for(2015).is_none());
    assert!(manifest.record_for(2016).is_some());
    assert_eq!(manifest.metadata.skipped_years, vec![2015, 2020]);
    assert!(!temp_dir.path().join("p1_2015.png").exists());

    let outcome_2015 = &report.outcomes.iter().find(|(y, _)| *y == 2015).unwrap().1;
    assert!(matches!(
        outcome_2015,
        YearOutcome::Skipped(SkipReason::ExportFailed(_))
    ));
}

#[tokio::test]
async fn test_query_failure_skips_only_that_year() {
    let temp_dir = TempDir::new().unwrap();
    let provider = two_rule_provider().failing_query(P2, 2023);

    let report = Coordinator::new(two_rule_config(temp_dir.path()), &provider)
        .run()
        .await
        .unwrap();
    let manifest = report.manifest.unwrap();

    assert_eq!(manifest.images.len(), 10);
    assert!(manifest.record_for(2023).is_none());
    assert!(manifest.record_for(2024).is_some());
}

#[tokio::test]
async fn test_overlapping_rules_fall_back_on_empty_years() {
    let temp_dir = TempDir::new().unwrap();
    let provider = FakeProvider::default()
        .with_candidates(P1, 2016, &[6.0])
        .with_candidates(P2, 2016, &[1.0])
        .with_candidates(P2, 2017, &[4.0]);
    let config = CoordinatorConfig::default()
        .with_years(2016, 2017)
        .with_rules(vec![rule("P1", P1, 2015, 2024), rule("P2", P2, 2013, 2024)])
        .with_output_dir(temp_dir.path());

    let manifest = Coordinator::new(config, &provider)
        .run()
        .await
        .unwrap()
        .manifest
        .unwrap();

    // 2016: P1 has imagery, so P2's clearer image is never considered
    assert_eq!(manifest.record_for(2016).unwrap().satellite, "P1");
    assert_eq!(manifest.record_for(2017).unwrap().satellite, "P2");

    let queries = provider.queries.lock().unwrap().clone();
    assert_eq!(
        queries,
        vec![
            (P1.to_string(), 2016),
            (P1.to_string(), 2017),
            (P2.to_string(), 2017),
        ]
    );
}

#[tokio::test]
async fn test_no_imagery_at_all_writes_empty_manifest() {
    let temp_dir = TempDir::new().unwrap();
    let provider = FakeProvider::default();

    let report = Coordinator::new(two_rule_config(temp_dir.path()), &provider)
        .run()
        .await
        .unwrap();
    let manifest = Manifest::load(&report.manifest_path.unwrap()).unwrap();

    assert!(manifest.is_empty());
    assert_eq!(manifest.metadata.skipped_years.len(), 12);
    assert_eq!(manifest.metadata.date_range.start, "unknown");
}

#[tokio::test]
async fn test_manifest_write_failure_is_fatal() {
    let temp_dir = TempDir::new().unwrap();
    // A directory where the manifest file should go cannot be replaced
    std::fs::create_dir_all(temp_dir.path().join("viewer_config.json").join("blocker")).unwrap();
    let provider = two_rule_provider();

    let result = Coordinator::new(two_rule_config(temp_dir.path()), &provider)
        .run()
        .await;

    assert!(matches!(result, Err(AppError::Manifest(_))));
}
