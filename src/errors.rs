//! Error types for the imagery fetcher
//!
//! This module defines the error taxonomy for every component of the application.
//! Errors separate the fatal cases (authentication, session initialisation,
//! manifest persistence) from the per-year failures that only skip a year.

use std::path::PathBuf;
use thiserror::Error;

/// Authentication and session initialisation errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// Missing environment variables for credentials
    #[error(
        "Missing Earth Engine credentials. Set GOOGLE_PROJECT_ID and EE_ACCESS_TOKEN environment variables or run 'auth setup'"
    )]
    MissingCredentials,

    /// HTTP request failed during session initialisation
    #[error("HTTP request failed during authentication")]
    Http(#[from] reqwest::Error),

    /// The provider rejected the access token or project
    #[error("Earth Engine rejected the credentials (HTTP {status}). Refresh the access token and try again")]
    Unauthorized { status: u16 },

    /// The provider could not be initialised for another reason
    #[error("Earth Engine initialization failed: {reason}")]
    InitializationFailed { reason: String },

    /// Invalid project identifier format
    #[error("Invalid project id: {reason}")]
    InvalidProjectId { reason: String },

    /// File I/O error during credential storage
    #[error("Failed to save credentials to file")]
    CredentialStorage(#[from] std::io::Error),
}

/// Errors raised by an imagery provider while querying or exporting
///
/// Every variant is recoverable at the run level: the coordinator logs it
/// and skips the year.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O error while writing an exported raster
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid URL built for a request
    #[error("Invalid URL: {url} - {error}")]
    InvalidUrl { url: String, error: String },

    /// Server returned error status
    #[error("Server error: HTTP {status}: {body}")]
    ServerError { status: u16, body: String },

    /// Rate limit exceeded
    #[error("Rate limit exceeded. Server responded with HTTP 429")]
    RateLimitExceeded,

    /// Server overloaded
    #[error("Server overloaded. Server responded with HTTP 503")]
    ServerOverloaded,

    /// Maximum retries exceeded
    #[error("Maximum retry attempts ({max_retries}) exceeded")]
    MaxRetriesExceeded { max_retries: u32 },

    /// Query response could not be interpreted
    #[error("Malformed provider response: {reason}")]
    MalformedResponse { reason: String },

    /// Export returned something other than an image
    #[error("Export did not return an image (content type '{content_type}')")]
    NotAnImage { content_type: String },

    /// Exported bytes failed to decode
    #[error("Exported image could not be decoded: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// Atomic file operation failed
    #[error("Atomic file operation failed: could not rename {temp_path} to {final_path}")]
    AtomicOperationFailed {
        temp_path: PathBuf,
        final_path: PathBuf,
    },
}

/// Manifest persistence and read-back errors
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Manifest file not found
    #[error("Manifest file not found: {path}")]
    NotFound { path: PathBuf },

    /// JSON error
    #[error("JSON error in manifest: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error reading or writing the manifest
    #[error("I/O error on manifest: {0}")]
    Io(#[from] std::io::Error),

    /// Temp file could not be moved over the manifest
    #[error("Failed to replace manifest at {path}: {reason}")]
    PersistFailed { path: PathBuf, reason: String },

    /// More than one record for a year
    #[error("Duplicate record for year {year} in manifest")]
    DuplicateYear { year: i32 },

    /// Records are not in ascending year order
    #[error("Manifest records out of order: {previous} followed by {next}")]
    OutOfOrder { previous: i32, next: i32 },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Invalid configuration format
    #[error("Invalid configuration format: {0}")]
    InvalidFormat(#[from] toml::de::Error),

    /// Configuration could not be serialised
    #[error("Failed to serialise configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Configuration validation failed
    #[error("Configuration validation failed: {errors:?}")]
    ValidationFailed { errors: Vec<String> },
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Authentication error
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Provider error
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Manifest error
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Authentication result type alias
pub type AuthResult<T> = std::result::Result<T, AuthError>;

/// Provider result type alias
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Manifest result type alias
pub type ManifestResult<T> = std::result::Result<T, ManifestError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
