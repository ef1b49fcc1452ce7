//! Core HTTP operations with rate limiting and retry logic
//!
//! Every Earth Engine request goes through `HttpHandler`, which attaches the
//! bearer token and billing project, waits on a shared rate limiter, and
//! backs off on throttling, overload, and transport failures.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::{clock::DefaultClock, state::InMemoryState, Jitter, Quota, RateLimiter};
use reqwest::{Client, RequestBuilder, Response, StatusCode};

use crate::constants::{http, limits};
use crate::errors::{AuthError, AuthResult, ProviderError, ProviderResult};

type DirectRateLimiter = RateLimiter<governor::state::NotKeyed, InMemoryState, DefaultClock>;

/// HTTP operations handler with resilience patterns
pub struct HttpHandler {
    client: Client,
    rate_limiter: DirectRateLimiter,
    access_token: String,
    project_id: String,
    max_retries: u32,
}

impl std::fmt::Debug for HttpHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpHandler")
            .field("project_id", &self.project_id)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl HttpHandler {
    /// Creates a new HttpHandler for an authenticated project
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the rate limit is zero
    pub fn new(
        client: Client,
        rate_limit_rps: u32,
        max_retries: u32,
        access_token: impl Into<String>,
        project_id: impl Into<String>,
    ) -> AuthResult<Self> {
        let rate_limiter = Self::build_rate_limiter(rate_limit_rps)?;
        Ok(Self {
            client,
            rate_limiter,
            access_token: access_token.into(),
            project_id: project_id.into(),
            max_retries,
        })
    }

    fn build_rate_limiter(rate_limit_rps: u32) -> AuthResult<DirectRateLimiter> {
        let rps = NonZeroU32::new(rate_limit_rps).ok_or_else(|| AuthError::InitializationFailed {
            reason: "Rate limit must be non-zero".to_string(),
        })?;
        Ok(RateLimiter::direct(Quota::per_second(rps)))
    }

    /// Sends a request built by `build`, retrying with exponential backoff
    ///
    /// `build` is called once per attempt. Success statuses are returned as
    /// is; any other status becomes `ProviderError::ServerError` carrying the
    /// response body.
    pub async fn execute<F>(&self, build: F) -> ProviderResult<Response>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let mut retries = 0;
        loop {
            self.rate_limiter
                .until_ready_with_jitter(Jitter::up_to(Duration::from_millis(
                    limits::RATE_LIMIT_JITTER_MS,
                )))
                .await;

            let request = build(&self.client)
                .bearer_auth(&self.access_token)
                .header(http::USER_PROJECT_HEADER, &self.project_id);

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    let retryable = status == StatusCode::TOO_MANY_REQUESTS
                        || status == StatusCode::SERVICE_UNAVAILABLE;

                    if retryable && retries < self.max_retries {
                        retries += 1;
                        let delay = Self::backoff_delay(retries);
                        tracing::warn!(
                            "Provider responded {} (attempt {}/{}). Backing off for {}ms",
                            status.as_u16(),
                            retries,
                            self.max_retries,
                            delay.as_millis()
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        return Err(ProviderError::RateLimitExceeded);
                    }
                    if status == StatusCode::SERVICE_UNAVAILABLE {
                        return Err(ProviderError::ServerOverloaded);
                    }

                    if !status.is_success() {
                        let body = response.text().await.unwrap_or_default();
                        return Err(ProviderError::ServerError {
                            status: status.as_u16(),
                            body: truncate_body(&body),
                        });
                    }

                    tracing::debug!("Request succeeded: {}", response.url());
                    return Ok(response);
                }
                Err(e) if retries < self.max_retries => {
                    retries += 1;
                    let delay = Self::backoff_delay(retries);
                    tracing::warn!(
                        "Request failed (attempt {}/{}): {}. Retrying in {}ms",
                        retries,
                        self.max_retries,
                        e,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    tracing::error!("Request failed after {} retries: {}", self.max_retries, e);
                    if self.max_retries == 0 {
                        return Err(ProviderError::Http(e));
                    }
                    return Err(ProviderError::MaxRetriesExceeded {
                        max_retries: self.max_retries,
                    });
                }
            }
        }
    }

    fn backoff_delay(attempt: u32) -> Duration {
        let millis = 2_u64
            .checked_pow(attempt)
            .map_or(u64::MAX, |factor| {
                limits::RETRY_BASE_DELAY_MS.saturating_mul(factor)
            })
            .min(limits::MAX_RETRY_DELAY_MS);
        Duration::from_millis(millis)
    }

    /// Project charged for requests
    pub fn project_id(&self) -> &str {
        &self.project_id
    }
}

/// Keep error bodies short enough for a log line
fn truncate_body(body: &str) -> String {
    const MAX: usize = 300;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::client::config::ClientConfig;

    #[tokio::test]
    async fn test_rate_limiter_creation() {
        let rate_limiter = HttpHandler::build_rate_limiter(5).unwrap();
        rate_limiter.until_ready().await;
    }

    #[test]
    fn test_rate_limiter_zero_fails() {
        let result = HttpHandler::build_rate_limiter(0);
        assert!(matches!(
            result,
            Err(AuthError::InitializationFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_http_handler_creation() {
        let config = ClientConfig::default();
        let client = config.build_http_client().unwrap();
        let handler = HttpHandler::new(client, 5, 3, "token", "my-project-123").unwrap();
        assert_eq!(handler.project_id(), "my-project-123");
    }

    #[test]
    fn test_exponential_backoff_calculation() {
        assert_eq!(HttpHandler::backoff_delay(1).as_millis(), 2000);
        assert_eq!(HttpHandler::backoff_delay(2).as_millis(), 4000);
        assert_eq!(HttpHandler::backoff_delay(3).as_millis(), 8000);
    }

    #[test]
    fn test_backoff_delay_is_capped() {
        let cap = limits::MAX_RETRY_DELAY_MS as u128;
        assert_eq!(HttpHandler::backoff_delay(6).as_millis(), cap);
        assert_eq!(HttpHandler::backoff_delay(54).as_millis(), cap);
        assert_eq!(HttpHandler::backoff_delay(u32::MAX).as_millis(), cap);
    }

    #[test]
    fn test_truncate_body() {
        assert_eq!(truncate_body("short"), "short");

        let long = "x".repeat(1000);
        let truncated = truncate_body(&long);
        assert_eq!(truncated.len(), 303);
        assert!(truncated.ends_with("..."));
    }
}
