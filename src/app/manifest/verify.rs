//! Consistency checks on a written manifest

use std::path::{Path, PathBuf};

use crate::app::manifest::types::Manifest;
use crate::errors::ManifestError;

/// Outcome of checking a manifest against its output directory
#[derive(Debug, Default)]
pub struct VerificationReport {
    /// Records checked
    pub records: usize,
    /// Records whose raster file does not exist
    pub missing_rasters: Vec<(i32, PathBuf)>,
    /// Ordering and uniqueness violations
    pub problems: Vec<ManifestError>,
}

impl VerificationReport {
    pub fn is_ok(&self) -> bool {
        self.missing_rasters.is_empty() && self.problems.is_empty()
    }
}

/// Check year ordering, uniqueness, and that every raster exists under `base_dir`
pub fn verify_manifest(manifest: &Manifest, base_dir: &Path) -> VerificationReport {
    let mut report = VerificationReport {
        records: manifest.images.len(),
        ..Default::default()
    };

    for pair in manifest.images.windows(2) {
        let (previous, next) = (pair[0].year, pair[1].year);
        if previous == next {
            report.problems.push(ManifestError::DuplicateYear { year: next });
        } else if previous > next {
            report
                .problems
                .push(ManifestError::OutOfOrder { previous, next });
        }
    }

    for record in &manifest.images {
        let raster = base_dir.join(&record.path);
        if !raster.is_file() {
            tracing::warn!("Raster for {} missing: {}", record.year, raster.display());
            report.missing_rasters.push((record.year, raster));
        }
    }

    report
}
