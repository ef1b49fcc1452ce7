//! Core application logic for the imagery fetcher
//!
//! This module contains the data models, the least-cloud selection, the
//! provider capability and its Earth Engine client, the yearly coordinator,
//! and the viewer manifest.
//!
//! # Examples
//!
//! ```rust,no_run
//! use imagery_fetcher::app::{Manifest, verify_manifest};
//! use std::path::Path;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let dir = Path::new("nikumaroro_imagery");
//! let manifest = Manifest::load(&dir.join("viewer_config.json"))?;
//!
//! for record in &manifest.images {
//!     println!("{}: {} ({}% cloud)", record.year, record.satellite, record.cloud_cover);
//! }
//!
//! let report = verify_manifest(&manifest, dir);
//! println!("{} rasters missing", report.missing_rasters.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod coordinator;
pub mod manifest;
pub mod models;
pub mod provider;
pub mod selection;

// Re-export main public API
pub use client::{ClientConfig, Credentials, EarthEngineClient};
pub use coordinator::{
    Coordinator, CoordinatorConfig, RunReport, RunStats, SkipReason, YearOutcome,
};
pub use manifest::{verify_manifest, Manifest, VerificationReport};
pub use models::{
    default_rules, Candidate, DateRange, ImageHandle, RasterDimensions, Region, RuleTable,
    SelectedImageRecord, YearRule,
};
pub use provider::ImageryProvider;
pub use selection::select_best;
