//! HTTP client for the storefront's JSON listing and GraphQL endpoints.

mod origin;

use std::time::Duration;

use reqwest::{Client, Response};
use shelfscan_core::{AppConfig, RawRecord};

use crate::error::ScraperError;
use crate::rate_limit::retry_with_backoff;
use crate::types::{products_from_body, GraphqlResponse};

pub use origin::{collection_handle, extract_store_origin, locale_prefix, site_root};
// Re-export for test visibility via `use super::*`
#[cfg(test)]
use origin::extract_domain;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Identity headers, timeouts and retry policy for [`StorefrontClient`].
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub user_agent: String,
    pub accept: String,
    /// Sent as `Referer`; when `None` the source listing URL is used.
    pub referer: Option<String>,
    pub request_timeout: Duration,
    pub graphql_timeout: Duration,
    /// Additional attempts after the first failure for transient errors.
    pub max_retries: u32,
    /// Base delay for exponential backoff: `backoff_base_secs * 2^attempt`.
    pub backoff_base_secs: u64,
}

impl From<&AppConfig> for HttpSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.scraper_user_agent.clone(),
            accept: config.scraper_accept.clone(),
            referer: config.scraper_referer.clone(),
            request_timeout: Duration::from_secs(config.scraper_request_timeout_secs),
            graphql_timeout: Duration::from_secs(config.scraper_graphql_timeout_secs),
            max_retries: config.scraper_max_retries,
            backoff_base_secs: config.scraper_retry_backoff_base_secs,
        }
    }
}

/// HTTP client for storefront JSON endpoints.
///
/// Handles rate limiting (429), not-found (404), and other non-2xx responses
/// as typed errors. Transient errors (429, 5xx, network failures, timeouts)
/// are retried with exponential backoff up to `max_retries` additional
/// attempts.
pub struct StorefrontClient {
    client: Client,
    settings: HttpSettings,
}

impl StorefrontClient {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(settings: HttpSettings) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(settings.request_timeout)
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(settings.user_agent.as_str())
            .build()?;
        Ok(Self { client, settings })
    }

    #[must_use]
    pub fn settings(&self) -> &HttpSettings {
        &self.settings
    }

    fn referer<'a>(&'a self, source_url: &'a str) -> &'a str {
        self.settings.referer.as_deref().unwrap_or(source_url)
    }

    /// Fetches a REST listing endpoint and returns its `products` elements.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::RateLimited`]: HTTP 429 after all retries exhausted.
    /// - [`ScraperError::NotFound`]: HTTP 404 (not retried).
    /// - [`ScraperError::UnexpectedStatus`]: any other non-2xx status (5xx retried, 4xx not).
    /// - [`ScraperError::Timeout`] / [`ScraperError::Http`]: transport failure after all retries.
    /// - [`ScraperError::Deserialize`] / [`ScraperError::MissingProducts`]: body is not a listing (not retried).
    pub async fn fetch_listing(
        &self,
        endpoint: &str,
        source_url: &str,
    ) -> Result<Vec<RawRecord>, ScraperError> {
        let referer = self.referer(source_url);

        retry_with_backoff(
            self.settings.max_retries,
            self.settings.backoff_base_secs,
            || async move {
                let response = self
                    .client
                    .get(endpoint)
                    .header(reqwest::header::ACCEPT, &self.settings.accept)
                    .header(reqwest::header::REFERER, referer)
                    .send()
                    .await
                    .map_err(|e| transport_error(e, endpoint, self.settings.request_timeout))?;

                let body = checked_body(response, endpoint, self.settings.request_timeout).await?;
                products_from_body(&body, endpoint)
            },
        )
        .await
    }

    /// Posts a GraphQL query and returns the parsed response.
    ///
    /// Uses the (longer) GraphQL timeout instead of the client default.
    ///
    /// # Errors
    ///
    /// Same status and transport errors as [`Self::fetch_listing`];
    /// [`ScraperError::Deserialize`] if the body is not a GraphQL response.
    pub async fn post_graphql(
        &self,
        endpoint: &str,
        query: &str,
        source_url: &str,
    ) -> Result<GraphqlResponse, ScraperError> {
        let referer = self.referer(source_url);
        let payload = serde_json::json!({ "query": query });
        let timeout = self.settings.graphql_timeout;

        retry_with_backoff(
            self.settings.max_retries,
            self.settings.backoff_base_secs,
            || {
                let payload = &payload;
                async move {
                    let response = self
                        .client
                        .post(endpoint)
                        .timeout(timeout)
                        .header(reqwest::header::ACCEPT, &self.settings.accept)
                        .header(reqwest::header::REFERER, referer)
                        .json(payload)
                        .send()
                        .await
                        .map_err(|e| transport_error(e, endpoint, timeout))?;

                    let body = checked_body(response, endpoint, timeout).await?;
                    serde_json::from_str::<GraphqlResponse>(&body).map_err(|e| {
                        ScraperError::Deserialize {
                            context: format!("GraphQL response from {endpoint}"),
                            source: e,
                        }
                    })
                }
            },
        )
        .await
    }
}

/// Classifies a `reqwest` failure, surfacing timeouts as
/// [`ScraperError::Timeout`].
fn transport_error(err: reqwest::Error, url: &str, timeout: Duration) -> ScraperError {
    if err.is_timeout() {
        ScraperError::Timeout {
            operation: format!("request to {url}"),
            timeout,
        }
    } else {
        ScraperError::Http(err)
    }
}

/// Maps non-2xx statuses to typed errors and returns the body text.
async fn checked_body(
    response: Response,
    url: &str,
    timeout: Duration,
) -> Result<String, ScraperError> {
    let status = response.status();

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(60);

        return Err(ScraperError::RateLimited {
            domain: origin::extract_domain(url),
            retry_after_secs,
        });
    }

    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(ScraperError::NotFound {
            url: url.to_owned(),
        });
    }

    if !status.is_success() {
        return Err(ScraperError::UnexpectedStatus {
            status: status.as_u16(),
            url: url.to_owned(),
        });
    }

    response
        .text()
        .await
        .map_err(|e| transport_error(e, url, timeout))
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
