//! Command handlers for the imagery fetcher CLI
//!
//! This module implements the command handlers that connect CLI arguments to
//! the coordinator, the manifest read path, credentials, and configuration.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{error, info, warn};

use crate::app::{
    verify_manifest, Coordinator, CoordinatorConfig, EarthEngineClient, Manifest, RunReport,
    YearOutcome,
};
use crate::auth::{clear_credentials, setup_credentials, show_auth_status, verify_credentials};
use crate::cli::{
    validate_startup, AuthAction, AuthArgs, ConfigAction, ConfigArgs, FetchArgs, ManifestAction,
    ManifestArgs, ProgressConfig, YearProgress,
};
use crate::config::AppConfig;
use crate::errors::{AppError, Result};

/// Handle the fetch command
///
/// Validates startup, opens one Earth Engine session, runs every year, and
/// prints a summary of produced and skipped years.
pub async fn handle_fetch(args: FetchArgs, config: &AppConfig, quiet: bool) -> Result<()> {
    let start_time = Instant::now();
    args.validate().map_err(AppError::generic)?;

    let coordinator_config = fetch_coordinator_config(&args, config);
    coordinator_config.validate().map_err(AppError::generic)?;

    info!(
        "Starting fetch for {}-{} into {}",
        coordinator_config.start_year,
        coordinator_config.end_year,
        coordinator_config.output_dir.display()
    );

    let startup_status = validate_startup(
        config,
        &coordinator_config.output_dir,
        !coordinator_config.dry_run,
    )
    .await?;
    if !startup_status.is_ready() {
        error!("Startup validation failed: {}", startup_status.summary());
        return Err(AppError::generic(startup_status.summary()));
    }

    let probe = config
        .probe_collection()
        .ok_or_else(|| AppError::generic("No rules configured"))?;

    print!("🔐 Connecting to Earth Engine...");
    io::stdout().flush()?;
    let client = EarthEngineClient::from_env(config.to_client_config(), probe).await?;
    println!(" ✅ (project {})", client.project_id());

    if coordinator_config.dry_run {
        println!("🔍 Dry run - selecting without exporting");
    }

    let mut progress = YearProgress::start(
        coordinator_config.year_count(),
        ProgressConfig {
            enable_progress_bars: !quiet,
            show_year_lines: !quiet,
        },
    );

    let coordinator = Coordinator::new(coordinator_config, &client);
    let result = coordinator
        .run_with_progress(|year, outcome| progress.on_year(year, outcome))
        .await;
    progress.finish();

    let report = result?;
    print_report(&report, coordinator.config(), start_time);

    Ok(())
}

/// Apply command-line overrides on top of the configured run
pub fn fetch_coordinator_config(args: &FetchArgs, config: &AppConfig) -> CoordinatorConfig {
    let mut coordinator_config = config.to_coordinator_config();
    let start = args.start_year.unwrap_or(coordinator_config.start_year);
    let end = args.end_year.unwrap_or(coordinator_config.end_year);

    coordinator_config = coordinator_config
        .with_years(start, end)
        .with_dry_run(args.dry_run);
    if let Some(dir) = &args.output_dir {
        coordinator_config = coordinator_config.with_output_dir(dir);
    }
    coordinator_config
}

fn print_report(report: &RunReport, config: &CoordinatorConfig, start_time: Instant) {
    let stats = &report.stats;

    if config.dry_run {
        println!("\n🔍 Dry-run selection:");
        for (year, outcome) in &report.outcomes {
            if let YearOutcome::Selected {
                satellite,
                date,
                cloud_cover,
                path,
            } = outcome
            {
                println!(
                    "  {}  {:<12} {}  {:>6.2}%  {}",
                    year, satellite, date, cloud_cover, path
                );
            }
        }
    }

    println!("\n📊 Fetch Summary:");
    println!("  Years processed: {}", stats.years_total);
    println!("  Images: {}", stats.years_produced);
    println!("  Skipped: {}", stats.years_skipped());
    for skipped in &stats.skipped {
        println!("    • {}: {}", skipped.year, skipped.reason);
    }
    if let Some(path) = &report.manifest_path {
        println!("  Manifest: {}", path.display());
    }
    println!("  Total time: {:.1}s", start_time.elapsed().as_secs_f64());

    if stats.years_produced == 0 {
        warn!("No year produced an image");
    }
}

/// Handle manifest commands
pub async fn handle_manifest(args: ManifestArgs, config: &AppConfig) -> Result<()> {
    match args.action {
        ManifestAction::Info { file } => handle_manifest_info(&manifest_path(file, config)),
        ManifestAction::Verify { file } => handle_manifest_verify(&manifest_path(file, config)),
    }
}

fn manifest_path(file: Option<PathBuf>, config: &AppConfig) -> PathBuf {
    file.unwrap_or_else(|| config.output.dir.join(&config.output.manifest_file_name))
}

/// Show a manifest's records in year order
fn handle_manifest_info(path: &Path) -> Result<()> {
    let manifest = Manifest::load(path)?;

    println!("📋 Manifest Information");
    println!("=======================");
    println!("File: {}", path.display());
    if let Some(name) = &manifest.location.name {
        println!("Location: {}", name);
    }
    println!(
        "Center: {:.6}, {:.6} (radius {} m)",
        manifest.location.lat, manifest.location.lon, manifest.location.radius_meters
    );
    println!("Generated: {}", manifest.metadata.generated.to_rfc3339());
    println!(
        "Images: {} ({} to {})",
        manifest.metadata.total_images,
        manifest.metadata.date_range.start,
        manifest.metadata.date_range.end
    );
    println!();

    if manifest.is_empty() {
        println!("No images in manifest.");
    } else {
        println!(
            "{:<6} {:<12} {:<10} {:>8} {:>11}  File",
            "Year", "Satellite", "Date", "Cloud %", "Size"
        );
        println!("{}", "-".repeat(72));
        for record in &manifest.images {
            println!(
                "{:<6} {:<12} {:<10} {:>8.2} {:>11}  {}",
                record.year,
                record.satellite,
                record.date,
                record.cloud_cover,
                format!("{}x{}", record.width, record.height),
                record.path
            );
        }
    }

    if !manifest.metadata.skipped_years.is_empty() {
        let years: Vec<String> = manifest
            .metadata
            .skipped_years
            .iter()
            .map(|y| y.to_string())
            .collect();
        println!();
        println!("Skipped years: {}", years.join(", "));
    }

    Ok(())
}

/// Verify a manifest against its output directory
fn handle_manifest_verify(path: &Path) -> Result<()> {
    let manifest = Manifest::load(path)?;
    let base_dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let report = verify_manifest(&manifest, base_dir);

    println!("🔍 Verifying {} ({} records)", path.display(), report.records);
    for problem in &report.problems {
        println!("  ❌ {}", problem);
    }
    for (year, raster) in &report.missing_rasters {
        println!("  ❌ {}: missing {}", year, raster.display());
    }

    if report.is_ok() {
        println!("✅ Manifest is consistent");
        Ok(())
    } else {
        Err(AppError::generic(format!(
            "Manifest verification failed: {} problems, {} missing rasters",
            report.problems.len(),
            report.missing_rasters.len()
        )))
    }
}

/// Handle authentication commands
pub async fn handle_auth(args: AuthArgs, config: &AppConfig) -> Result<()> {
    let probe = config.probe_collection().unwrap_or_default();

    match args.action {
        AuthAction::Setup => {
            setup_credentials(config.to_client_config(), probe).await?;
        }
        AuthAction::Verify => {
            if verify_credentials(config.to_client_config(), probe).await? {
                println!("✅ Credentials verified successfully");
            } else {
                return Err(AppError::generic("Credential verification failed"));
            }
        }
        AuthAction::Status => {
            show_auth_status(config.to_client_config(), probe).await?;
        }
        AuthAction::Clear => {
            println!("🗑️  Clearing stored credentials...");
            clear_credentials()?;
        }
    }

    Ok(())
}

/// Handle configuration commands
///
/// `config` is `None` for `init`, which must work even when the current
/// file does not parse.
pub async fn handle_config(
    args: ConfigArgs,
    config: Option<&AppConfig>,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match args.action {
        ConfigAction::Init { path, force } => {
            let written = AppConfig::write_default(path, force).await?;
            println!("📁 Created default configuration file:");
            println!("   {}", written.display());
            println!("   You can customize settings by editing this file.");
        }
        ConfigAction::Show => {
            let source = config_override.or_else(AppConfig::find_config_file);
            match source {
                Some(path) => println!("# Loaded from {}", path.display()),
                None => println!("# No config file found; built-in defaults"),
            }
            let default_config = AppConfig::default();
            let effective = config.unwrap_or(&default_config);
            print!("{}", effective.to_toml_string()?);
        }
    }

    Ok(())
}
