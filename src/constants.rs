//! Application constants for the imagery fetcher
//!
//! This module centralizes all constants used throughout the application,
//! organized by functional domain.

use std::time::Duration;

/// Environment variable names for authentication
pub mod env {
    /// Google Cloud project used for Earth Engine quota and billing
    pub const PROJECT_ID: &str = "GOOGLE_PROJECT_ID";

    /// OAuth2 access token (e.g. from `gcloud auth print-access-token`)
    pub const ACCESS_TOKEN: &str = "EE_ACCESS_TOKEN";
}

/// Authentication and credential-related constants
pub mod auth {
    /// Minimum Google Cloud project id length
    pub const MIN_PROJECT_ID_LENGTH: usize = 6;

    /// Maximum Google Cloud project id length
    pub const MAX_PROJECT_ID_LENGTH: usize = 30;

    /// File permissions for .env file (Unix only) - owner read/write only
    #[cfg(unix)]
    pub const ENV_FILE_PERMISSIONS: u32 = 0o600;
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = "Imagery-Fetcher/0.1.0 (Yearly Satellite Time Series)";

    /// Default HTTP request timeout; exports of large thumbnails can be slow
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection pool idle timeout
    pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

    /// Maximum idle connections per host in pool
    pub const POOL_MAX_PER_HOST: usize = 4;

    /// Header naming the project charged for the request
    pub const USER_PROJECT_HEADER: &str = "x-goog-user-project";
}

/// Rate limiting and retry configuration
pub mod limits {
    /// Default rate limit for provider requests (requests per second)
    pub const DEFAULT_RATE_LIMIT_RPS: u32 = 5;

    /// Maximum retry attempts for throttled or failed requests
    pub const MAX_RETRIES: u32 = 3;

    /// Highest retry count accepted from configuration
    pub const MAX_CONFIGURED_RETRIES: u32 = 10;

    /// Base delay for exponential backoff (milliseconds)
    pub const RETRY_BASE_DELAY_MS: u64 = 1000;

    /// Ceiling for a single backoff delay (milliseconds)
    pub const MAX_RETRY_DELAY_MS: u64 = 60_000;

    /// Upper bound on random jitter added before each request (milliseconds)
    pub const RATE_LIMIT_JITTER_MS: u64 = 100;
}

/// Earth Engine REST endpoints
pub mod earth_engine {
    /// REST API root
    pub const BASE_URL: &str = "https://earthengine.googleapis.com";

    /// API version path segment
    pub const API_VERSION: &str = "v1";

    /// Project hosting the public data catalog
    pub const PUBLIC_CATALOG_PROJECT: &str = "earthengine-public";

    /// Page size for `listImages`
    pub const LIST_PAGE_SIZE: u32 = 100;

    /// Upper bound on pages followed for a single year query
    pub const MAX_LIST_PAGES: usize = 50;

    /// CRS used for the export grid
    pub const EXPORT_CRS: &str = "EPSG:4326";
}

/// Geodesy constants
pub mod geo {
    /// Meters per degree of latitude (mean)
    pub const METERS_PER_DEGREE: f64 = 111_320.0;
}

/// File operation constants
pub mod files {
    /// Temporary file suffix for atomic operations
    pub const TEMP_FILE_SUFFIX: &str = ".tmp";

    /// Manifest file name inside the output directory
    pub const MANIFEST_FILE_NAME: &str = "viewer_config.json";

    /// Extension of exported rasters
    pub const RASTER_EXTENSION: &str = "png";

    /// Project-local configuration file name
    pub const LOCAL_CONFIG_FILE: &str = "imagery-fetcher.toml";

    /// Directory under the user config dir
    pub const CONFIG_DIR_NAME: &str = "imagery-fetcher";
}

/// Defaults reproducing the Nikumaroro survey run
pub mod defaults {
    /// Taraia Object latitude (4°41'10.2"S)
    pub const CENTER_LAT: f64 = -4.686167;

    /// Taraia Object longitude (174°29'53.1"W)
    pub const CENTER_LON: f64 = -174.498083;

    /// Buffer radius around the center, giving a ~3x3 km ROI
    pub const RADIUS_M: f64 = 1500.0;

    /// Output image edge length in pixels
    pub const IMAGE_PX: u32 = 1024;

    /// First year queried
    pub const START_YEAR: i32 = 2013;

    /// Last year queried (inclusive)
    pub const END_YEAR: i32 = 2024;

    /// Cloud cover pre-filter applied by the default rules
    pub const MAX_CLOUD_COVER: f64 = 30.0;

    /// Output directory
    pub const OUTPUT_DIR: &str = "nikumaroro_imagery";

    /// Region display name
    pub const REGION_NAME: &str = "Taraia Object, Nikumaroro Island";

    /// Region description
    pub const REGION_DESCRIPTION: &str =
        "Suspected location of Amelia Earhart's Lockheed Electra 10E";
}

// Re-export commonly used constants for convenience
pub use earth_engine::BASE_URL as EARTH_ENGINE_BASE_URL;
pub use env::{ACCESS_TOKEN as ENV_ACCESS_TOKEN, PROJECT_ID as ENV_PROJECT_ID};
pub use files::{MANIFEST_FILE_NAME, TEMP_FILE_SUFFIX};
pub use http::{DEFAULT_TIMEOUT as HTTP_TIMEOUT, USER_AGENT};
pub use limits::{DEFAULT_RATE_LIMIT_RPS, MAX_RETRIES, RETRY_BASE_DELAY_MS};
