//! Startup validation for the fetch command
//!
//! Checks that credentials are available (offering interactive setup when
//! they are not) and that the output directory can be written, before any
//! request is sent.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::auth::{ensure_authenticated, get_auth_status};
use crate::config::AppConfig;
use crate::errors::Result;

/// Results of startup validation checks
#[derive(Debug, Clone, Default)]
pub struct StartupStatus {
    /// Whether authentication is configured
    pub auth_configured: bool,
    /// Whether the output directory exists and accepts files
    pub output_writable: bool,
}

impl StartupStatus {
    /// Check if startup validation passed
    pub fn is_ready(&self) -> bool {
        self.auth_configured && self.output_writable
    }

    /// Get a summary message for display
    pub fn summary(&self) -> String {
        if self.is_ready() {
            "✅ Ready to fetch".to_string()
        } else {
            let mut issues = Vec::new();
            if !self.auth_configured {
                issues.push("authentication not configured");
            }
            if !self.output_writable {
                issues.push("output directory not writable");
            }
            format!("⚠️  Setup required: {}", issues.join(", "))
        }
    }
}

/// Run the startup checks for a fetch
///
/// `require_output` is false for dry runs, which write nothing.
pub async fn validate_startup(
    config: &AppConfig,
    output_dir: &Path,
    require_output: bool,
) -> Result<StartupStatus> {
    info!("Performing startup validation...");

    let status = StartupStatus {
        auth_configured: check_authentication(config).await,
        output_writable: !require_output || check_output_dir(output_dir).await,
    };

    debug!("Startup validation completed: {}", status.summary());
    Ok(status)
}

async fn check_authentication(config: &AppConfig) -> bool {
    if get_auth_status().has_credentials() {
        debug!("Authentication credentials found");
        return true;
    }

    warn!("Authentication credentials not found");

    let probe = config.probe_collection().unwrap_or_default();
    match ensure_authenticated(config.to_client_config(), probe).await {
        Ok(()) => true,
        Err(e) => {
            warn!("Authentication setup failed: {}", e);
            false
        }
    }
}

/// Create the directory if needed and confirm a file can be placed in it
pub async fn check_output_dir(output_dir: &Path) -> bool {
    if let Err(e) = tokio::fs::create_dir_all(output_dir).await {
        warn!("Cannot create {}: {}", output_dir.display(), e);
        return false;
    }

    match tempfile::NamedTempFile::new_in(output_dir) {
        Ok(_) => true,
        Err(e) => {
            warn!("Cannot write to {}: {}", output_dir.display(), e);
            false
        }
    }
}
