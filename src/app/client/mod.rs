//! Earth Engine REST client
//!
//! This module provides the production `ImageryProvider`: an authenticated,
//! rate-limited client for the Earth Engine REST API.
//!
//! The module is organized into specialized components:
//! - `config`: HTTP client configuration and building
//! - `session`: credentials and the startup access check
//! - `http`: core HTTP operations with rate limiting and backoff
//! - `listing`: candidate listing via `listImages`
//! - `export`: raster export via `getPixels` with atomic writes

use std::path::Path;

use async_trait::async_trait;

use crate::app::models::{Candidate, DateRange, RasterDimensions, Region, YearRule};
use crate::app::provider::ImageryProvider;
use crate::constants::earth_engine;
use crate::errors::{AuthResult, ProviderError, ProviderResult};

pub mod config;
pub mod export;
pub mod http;
pub mod listing;
pub mod session;

pub use config::ClientConfig;
pub use session::Credentials;

use export::ExportHandler;
use http::HttpHandler;
use listing::{candidates_from_page, collection_resource, list_query, resource_url, ListImagesPage};
use session::SessionHandler;

/// Authenticated session with the Earth Engine REST API
///
/// Created once at startup and passed to every query of the run.
#[derive(Debug)]
pub struct EarthEngineClient {
    http_handler: HttpHandler,
    base_url: String,
    image_px: u32,
}

impl EarthEngineClient {
    /// Creates a client without checking the credentials against the service
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the HTTP client or rate limiter cannot be built
    pub fn new_unverified(credentials: Credentials, config: ClientConfig) -> AuthResult<Self> {
        let client = config.build_http_client()?;
        let http_handler = HttpHandler::new(
            client,
            config.rate_limit_rps,
            config.max_retries,
            credentials.access_token,
            credentials.project_id,
        )?;

        Ok(Self {
            http_handler,
            base_url: config.base_url,
            image_px: config.image_px,
        })
    }

    /// Creates a client and confirms the credentials can read `probe_collection`
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the client cannot be built or the service
    /// rejects the credentials
    pub async fn connect(
        credentials: Credentials,
        config: ClientConfig,
        probe_collection: &str,
    ) -> AuthResult<Self> {
        let client = Self::new_unverified(credentials, config)?;
        SessionHandler::verify(&client.http_handler, &client.base_url, probe_collection).await?;

        tracing::info!(
            "Earth Engine initialized (project: {})",
            client.http_handler.project_id()
        );
        Ok(client)
    }

    /// Connects with credentials from the environment
    pub async fn from_env(config: ClientConfig, probe_collection: &str) -> AuthResult<Self> {
        let credentials = Credentials::from_env()?;
        Self::connect(credentials, config, probe_collection).await
    }

    /// Project charged for requests
    pub fn project_id(&self) -> &str {
        self.http_handler.project_id()
    }

    async fn list_page(
        &self,
        region: &Region,
        range: &DateRange,
        rule: &YearRule,
        page_token: Option<&str>,
    ) -> ProviderResult<ListImagesPage> {
        let url = resource_url(
            &self.base_url,
            &collection_resource(&rule.collection),
            ":listImages",
        )?;
        let query = list_query(region, range, rule, page_token);

        let response = self
            .http_handler
            .execute(|client| client.get(url.as_str()).query(&query))
            .await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ProviderError::MalformedResponse {
            reason: format!("listImages for {}: {}", rule.collection, e),
        })
    }
}

#[async_trait]
impl ImageryProvider for EarthEngineClient {
    fn provider_name(&self) -> &'static str {
        "earth-engine"
    }

    async fn query_candidates(
        &self,
        region: &Region,
        range: &DateRange,
        rule: &YearRule,
    ) -> ProviderResult<Vec<Candidate>> {
        let mut candidates = Vec::new();
        let mut page_token: Option<String> = None;

        for page_number in 1..=earth_engine::MAX_LIST_PAGES {
            let page = self
                .list_page(region, range, rule, page_token.as_deref())
                .await?;
            candidates.extend(candidates_from_page(&page, &rule.cloud_field));

            match page.next_page_token.filter(|token| !token.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }

            if page_number == earth_engine::MAX_LIST_PAGES {
                tracing::warn!(
                    "Stopped listing {} after {} pages",
                    rule.collection,
                    page_number
                );
            }
        }

        tracing::debug!(
            "{} candidates in {} for {}..{}",
            candidates.len(),
            rule.collection,
            range.start,
            range.end
        );
        Ok(candidates)
    }

    async fn export_raster(
        &self,
        candidate: &Candidate,
        region: &Region,
        rule: &YearRule,
        destination: &Path,
    ) -> ProviderResult<RasterDimensions> {
        ExportHandler::new(&self.http_handler, &self.base_url, self.image_px)
            .export(candidate, region, rule, destination)
            .await
    }
}

#[cfg(test)]
mod tests;
