//! Prelude module for the imagery fetcher library
//!
//! Re-exports the items needed to drive a yearly run with a single
//! `use imagery_fetcher::prelude::*;` statement.
//!
//! # Usage
//!
//! ```rust,no_run
//! use imagery_fetcher::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = AppConfig::load(None).await?;
//!     let probe = config.probe_collection().unwrap_or_default().to_string();
//!     let client = EarthEngineClient::from_env(config.to_client_config(), &probe).await?;
//!
//!     let report = Coordinator::new(config.to_coordinator_config(), &client).run().await?;
//!     println!("{}", report.stats.summary());
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, Result};

pub use crate::app::{
    // Orchestration
    Coordinator,
    CoordinatorConfig,
    RunReport,
    RunStats,
    SkipReason,
    YearOutcome,

    // Provider
    ClientConfig,
    Credentials,
    EarthEngineClient,
    ImageryProvider,

    // Data types
    Candidate,
    DateRange,
    Manifest,
    RasterDimensions,
    Region,
    SelectedImageRecord,
    YearRule,

    select_best,
    verify_manifest,
};

// Authentication functions
pub use crate::auth::{check_credentials, get_auth_status, AuthStatus};

pub use crate::config::AppConfig;

// Commonly used constants
pub use crate::constants::{DEFAULT_RATE_LIMIT_RPS, MANIFEST_FILE_NAME, USER_AGENT};

pub use std::path::{Path, PathBuf};

pub use tokio;
