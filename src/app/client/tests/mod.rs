//! Tests for the Earth Engine client
//!
//! `rest_calls` drives the client against a local server serving canned
//! responses, covering paging, retries, session checks and exports.

mod canned_server;

use super::*;
use crate::errors::AuthError;

#[test]
fn test_unverified_client_creation() {
    let client = EarthEngineClient::new_unverified(
        Credentials::new("my-project-123", "token"),
        ClientConfig::default(),
    )
    .unwrap();

    assert_eq!(client.project_id(), "my-project-123");
    assert_eq!(client.provider_name(), "earth-engine");
    assert_eq!(client.image_px, 1024);
}

#[test]
fn test_zero_rate_limit_is_rejected() {
    let config = ClientConfig {
        rate_limit_rps: 0,
        ..Default::default()
    };
    let result = EarthEngineClient::new_unverified(Credentials::new("p", "t"), config);
    assert!(matches!(result, Err(AuthError::InitializationFailed { .. })));
}
