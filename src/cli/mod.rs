//! Command-line interface components
//!
//! This module contains CLI-specific code for the imagery fetcher,
//! including argument parsing, progress display, and startup checks.

pub mod args;
pub mod commands;
pub mod progress;
pub mod startup;

pub use args::{
    AuthAction, AuthArgs, Cli, Commands, ConfigAction, ConfigArgs, FetchArgs, GlobalArgs,
    ManifestAction, ManifestArgs,
};
pub use commands::{handle_auth, handle_config, handle_fetch, handle_manifest};
pub use progress::{format_outcome, ProgressConfig, YearProgress};
pub use startup::{check_output_dir, validate_startup, StartupStatus};
