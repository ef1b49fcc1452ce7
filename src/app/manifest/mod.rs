//! Viewer manifest
//!
//! The manifest lists the selected image for each year and is regenerated
//! in full on every run.
//!
//! - `types`: the JSON document layout
//! - `io`: atomic write and read-back
//! - `verify`: ordering and raster presence checks

pub mod io;
pub mod types;
pub mod verify;

pub use types::{DateRangeSummary, Location, Manifest, ManifestMetadata};
pub use verify::{verify_manifest, VerificationReport};
