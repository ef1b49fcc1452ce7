//! Earth Engine session initialisation
//!
//! Credentials are read once at startup and checked against the provider
//! before any per-year work begins. A failure here aborts the run.

use std::env;
use std::fmt;

use crate::app::client::http::HttpHandler;
use crate::app::client::listing::{collection_resource, resource_url};
use crate::constants::env as env_constants;
use crate::errors::{AuthError, AuthResult, ProviderError};

/// Project id and OAuth2 access token
#[derive(Clone)]
pub struct Credentials {
    pub project_id: String,
    pub access_token: String,
}

impl Credentials {
    pub fn new(project_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            access_token: access_token.into(),
        }
    }

    /// Load from `GOOGLE_PROJECT_ID` and `EE_ACCESS_TOKEN`
    pub fn from_env() -> AuthResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load from an arbitrary variable lookup
    ///
    /// Missing and blank values are both `AuthError::MissingCredentials`.
    pub fn from_lookup<F>(lookup: F) -> AuthResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        match (
            value(env_constants::PROJECT_ID),
            value(env_constants::ACCESS_TOKEN),
        ) {
            (Some(project_id), Some(access_token)) => Ok(Self::new(project_id, access_token)),
            _ => Err(AuthError::MissingCredentials),
        }
    }
}

// Never print the token
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("project_id", &self.project_id)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// Handles session verification
pub struct SessionHandler;

impl SessionHandler {
    /// Confirms the token can read `probe_collection`
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Unauthorized` on HTTP 401/403 and
    /// `AuthError::InitializationFailed` for every other failure.
    pub async fn verify(
        http_handler: &HttpHandler,
        base_url: &str,
        probe_collection: &str,
    ) -> AuthResult<()> {
        let url = resource_url(base_url, &collection_resource(probe_collection), "")
            .map_err(|e| AuthError::InitializationFailed {
                reason: e.to_string(),
            })?;

        tracing::info!(
            "Verifying Earth Engine access for project {} via {}",
            http_handler.project_id(),
            probe_collection
        );

        match http_handler.execute(|client| client.get(url.as_str())).await {
            Ok(_) => Ok(()),
            Err(e) => Err(classify_failure(e)),
        }
    }
}

fn classify_failure(error: ProviderError) -> AuthError {
    match error {
        ProviderError::ServerError { status, .. } if status == 401 || status == 403 => {
            AuthError::Unauthorized { status }
        }
        other => AuthError::InitializationFailed {
            reason: other.to_string(),
        },
    }
}
