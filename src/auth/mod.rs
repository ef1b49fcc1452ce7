//! Authentication management for Earth Engine credentials
//!
//! This module provides functions for managing the Google Cloud project id
//! and access token, including interactive setup, verification, and storage
//! in .env files.
//!
//! # Examples
//!
//! ```rust,no_run
//! use imagery_fetcher::app::ClientConfig;
//! use imagery_fetcher::auth::{check_credentials, setup_credentials};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Check if credentials are available
//! if !check_credentials() {
//!     println!("Setting up credentials...");
//!     setup_credentials(ClientConfig::default(), "LANDSAT/LC08/C02/T1_L2").await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod credentials;

// Re-export main public API
pub use credentials::{
    check_credentials, clear_credentials, ensure_authenticated, get_auth_status,
    prompt_credentials, save_credentials, setup_credentials, show_auth_status,
    validate_project_id, verify_credentials, AuthStatus,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_structure() {
        // Ensure public API is accessible
        let status = get_auth_status();
        assert_eq!(
            status.has_credentials(),
            status.project_id_set && status.access_token_set
        );
        assert!(validate_project_id("my-project").is_ok());
    }
}
