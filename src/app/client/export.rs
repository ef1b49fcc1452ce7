//! Raster export through `assets:getPixels` with atomic writes
//!
//! The selected image is rendered server-side to an 8-bit PNG on a square
//! pixel grid spanning the region's bounding box. The returned bytes must
//! decode as an image before they replace the destination file.

use std::path::{Path, PathBuf};

use serde_json::json;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::app::client::http::HttpHandler;
use crate::app::client::listing::resource_url;
use crate::app::models::{Candidate, RasterDimensions, Region, YearRule};
use crate::constants::{earth_engine, files};
use crate::errors::{ProviderError, ProviderResult};

/// Raster export operations handler
pub struct ExportHandler<'a> {
    http_handler: &'a HttpHandler,
    base_url: &'a str,
    image_px: u32,
}

impl<'a> ExportHandler<'a> {
    pub fn new(http_handler: &'a HttpHandler, base_url: &'a str, image_px: u32) -> Self {
        Self {
            http_handler,
            base_url,
            image_px,
        }
    }

    /// Exports the candidate to `destination`
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` if:
    /// - The request fails or returns a non-success status
    /// - The response is not an image or does not decode
    /// - Writing or renaming the file fails
    pub async fn export(
        &self,
        candidate: &Candidate,
        region: &Region,
        rule: &YearRule,
        destination: &Path,
    ) -> ProviderResult<RasterDimensions> {
        let url = resource_url(self.base_url, &candidate.handle.0, ":getPixels")?;
        let body = get_pixels_body(region, rule, self.image_px);

        let response = self
            .http_handler
            .execute(|client| client.post(url.as_str()).json(&body))
            .await?;

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !content_type.contains("image") {
            return Err(ProviderError::NotAnImage { content_type });
        }

        let bytes = response.bytes().await?;
        let dimensions = decode_dimensions(&bytes)?;

        write_atomically(destination, &bytes).await?;
        tracing::info!(
            "Exported {} ({}x{}) to {}",
            candidate.handle,
            dimensions.width,
            dimensions.height,
            destination.display()
        );

        Ok(dimensions)
    }
}

/// Request body for `getPixels`
pub fn get_pixels_body(region: &Region, rule: &YearRule, image_px: u32) -> serde_json::Value {
    let bbox = region.bounds();
    let px = f64::from(image_px);
    let vis = &rule.visualization;

    json!({
        "fileFormat": "PNG",
        "bandIds": vis.bands,
        "region": bbox.to_geojson(),
        "grid": {
            "dimensions": { "width": image_px, "height": image_px },
            "affineTransform": {
                "scaleX": bbox.width_deg() / px,
                "shearX": 0.0,
                "translateX": bbox.west,
                "shearY": 0.0,
                "scaleY": -bbox.height_deg() / px,
                "translateY": bbox.north,
            },
            "crsCode": earth_engine::EXPORT_CRS,
        },
        "visualizationOptions": {
            "ranges": [{ "min": vis.min, "max": vis.max }],
            "gamma": vis.gamma,
        },
    })
}

/// Decode the bytes fully and report their size
pub fn decode_dimensions(bytes: &[u8]) -> ProviderResult<RasterDimensions> {
    let decoded = image::load_from_memory(bytes)?;
    Ok(RasterDimensions {
        width: decoded.width(),
        height: decoded.height(),
    })
}

/// Sibling temp path, e.g. `sentinel2_2017.png.tmp`
fn temp_path_for(destination: &Path) -> PathBuf {
    destination.with_extension(format!(
        "{}{}",
        destination
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or(""),
        files::TEMP_FILE_SUFFIX
    ))
}

/// Write through a temp file and rename over the destination
pub async fn write_atomically(destination: &Path, bytes: &[u8]) -> ProviderResult<()> {
    if let Some(parent) = destination.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let temp_path = temp_path_for(destination);
    let write_result = async {
        let mut file = File::create(&temp_path).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        Ok::<(), std::io::Error>(())
    }
    .await;

    if let Err(e) = write_result {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(ProviderError::Io(e));
    }

    tokio::fs::rename(&temp_path, destination)
        .await
        .map_err(|_| ProviderError::AtomicOperationFailed {
            temp_path: temp_path.clone(),
            final_path: destination.to_path_buf(),
        })
}
