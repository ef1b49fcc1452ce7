//! Imagery Fetcher Library
//!
//! Selects the least-cloudy satellite image of a fixed region for each year
//! in a range, exports it as PNG, and writes the JSON manifest read by a
//! time-slider viewer.

pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};
