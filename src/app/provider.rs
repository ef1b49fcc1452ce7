//! Imagery provider capability
//!
//! The coordinator only talks to imagery through this trait: list the
//! candidates for a region and time window, then export one of them as a
//! raster file. `EarthEngineClient` is the production implementation; tests
//! drive the coordinator with in-memory providers.

use std::path::Path;

use async_trait::async_trait;

use crate::app::models::{Candidate, DateRange, RasterDimensions, Region, YearRule};
use crate::errors::ProviderResult;

/// Query and export operations offered by a remote-sensing imagery service
#[async_trait]
pub trait ImageryProvider: Send + Sync {
    /// Short tag for logs
    fn provider_name(&self) -> &'static str;

    /// List every image in the rule's collection intersecting the region
    /// within the window, each with its cloud-cover value
    async fn query_candidates(
        &self,
        region: &Region,
        range: &DateRange,
        rule: &YearRule,
    ) -> ProviderResult<Vec<Candidate>>;

    /// Render the candidate clipped to the region and write it to
    /// `destination`, replacing any existing file
    async fn export_raster(
        &self,
        candidate: &Candidate,
        region: &Region,
        rule: &YearRule,
        destination: &Path,
    ) -> ProviderResult<RasterDimensions>;
}
