//! Manifest persistence
//!
//! Writes replace the previous manifest in full through a temp file in the
//! same directory, so a reader never sees a half-written document.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::app::manifest::types::Manifest;
use crate::errors::{ManifestError, ManifestResult};

impl Manifest {
    /// Serialise the manifest to `path`, overwriting any previous file
    ///
    /// # Errors
    ///
    /// Returns `ManifestError` if the directory cannot be created, the JSON
    /// cannot be written, or the temp file cannot replace the target
    pub fn write_to(&self, path: &Path) -> ManifestResult<()> {
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        {
            let mut writer = BufWriter::new(temp.as_file());
            serde_json::to_writer_pretty(&mut writer, self)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;

        temp.persist(path)
            .map_err(|e| ManifestError::PersistFailed {
                path: path.to_path_buf(),
                reason: e.error.to_string(),
            })?;

        tracing::info!(
            "Saved manifest {} ({} images)",
            path.display(),
            self.images.len()
        );
        Ok(())
    }

    /// Read a manifest back the way the viewer does
    ///
    /// # Errors
    ///
    /// Returns `ManifestError::NotFound` if the file is missing, or a JSON
    /// error if it does not match the manifest layout
    pub fn load(path: &Path) -> ManifestResult<Self> {
        if !path.exists() {
            return Err(ManifestError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}
