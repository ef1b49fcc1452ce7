//! Command-line argument parsing for the imagery fetcher
//!
//! This module defines the CLI structure using clap derive macros: the yearly
//! fetch, manifest inspection, credential management, and configuration.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Imagery Fetcher - yearly least-cloudy satellite images of one place
#[derive(Parser, Debug)]
#[command(
    name = "imagery_fetcher",
    version,
    about = "Fetch the least-cloudy satellite image of a region for every year",
    long_about = "Queries Earth Engine for each calendar year in a range, exports the least-cloudy image of a
fixed region as PNG, and writes a viewer_config.json manifest for a time-slider viewer."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Select and export one image per year, then write the manifest
    Fetch(FetchArgs),

    /// Inspect a written manifest
    Manifest(ManifestArgs),

    /// Manage authentication credentials
    Auth(AuthArgs),

    /// Manage the configuration file
    Config(ConfigArgs),
}

/// Arguments for the fetch command
#[derive(Args, Debug, Clone, Default)]
pub struct FetchArgs {
    /// First year to process (overrides config)
    #[arg(long, value_name = "YEAR")]
    pub start_year: Option<i32>,

    /// Last year to process, inclusive (overrides config)
    #[arg(long, value_name = "YEAR")]
    pub end_year: Option<i32>,

    /// Output directory (overrides config)
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Dry run - show the selection for each year without exporting
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for manifest inspection
#[derive(Args, Debug)]
pub struct ManifestArgs {
    #[command(subcommand)]
    pub action: ManifestAction,
}

/// Manifest actions
#[derive(Subcommand, Debug)]
pub enum ManifestAction {
    /// Show the records of a manifest in year order
    Info {
        /// Path to manifest file (defaults to the configured output)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Check year ordering and that every raster exists
    Verify {
        /// Path to manifest file (defaults to the configured output)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },
}

/// Arguments for authentication management
#[derive(Args, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub action: AuthAction,
}

/// Authentication actions
#[derive(Subcommand, Debug)]
pub enum AuthAction {
    /// Store a project id and access token in .env
    Setup,

    /// Verify current credentials against Earth Engine
    Verify,

    /// Show authentication status
    Status,

    /// Clear stored credentials
    Clear,
}

/// Arguments for configuration management
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a commented default configuration file
    Init {
        /// Where to write (defaults to the user config directory)
        #[arg(value_name = "FILE")]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Level requested by flags, if any
    pub fn explicit_log_level(&self) -> Option<tracing::Level> {
        if self.global.quiet {
            Some(tracing::Level::ERROR)
        } else if self.global.very_verbose {
            Some(tracing::Level::DEBUG)
        } else if self.global.verbose {
            Some(tracing::Level::INFO)
        } else {
            None
        }
    }

    /// Get the logging level based on global arguments
    pub fn log_level(&self) -> tracing::Level {
        self.explicit_log_level().unwrap_or(tracing::Level::WARN)
    }
}

impl FetchArgs {
    /// Reject an inverted year range given on the command line
    pub fn validate(&self) -> Result<(), String> {
        if let (Some(start), Some(end)) = (self.start_year, self.end_year) {
            if end < start {
                return Err(format!(
                    "--end-year {} is before --start-year {}",
                    end, start
                ));
            }
        }
        Ok(())
    }

    /// Whether any option overrides the configuration
    pub fn has_overrides(&self) -> bool {
        self.start_year.is_some() || self.end_year.is_some() || self.output_dir.is_some()
    }
}
