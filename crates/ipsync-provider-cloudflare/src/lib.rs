// # Cloudflare DNS Provider
//
// This crate provides the Cloudflare API v4 client used by the reconciler
// to read and write the managed A record.
//
// ## Behavior
//
// - One HTTP request per trait call
// - Any status other than 200 is an error carrying the status code
// - HTTP timeout configured (30 seconds by default)
// - NO retry, NO backoff, NO caching: the reconciler owns the run and a
//   failed call ends it
//
// ## Security Requirements
//
// - API token NEVER appears in logs or Debug output
// - Client construction fails if the token is empty
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List DNS Records: GET `/zones/:zone_id/dns_records?name=...`
// - Update DNS Record: PUT `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use ipsync_core::config::Configuration;
use ipsync_core::traits::{DnsProvider, DnsProviderFactory, DnsRecord, UpdateRequest};
use ipsync_core::{Error, Result};
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use std::time::Duration;

/// Cloudflare API base URL
pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests (30 seconds)
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Body of a record listing response
///
/// Only `result` is read; `success`, `errors` and paging info are ignored.
#[derive(Debug, Deserialize)]
struct ListResponse {
    result: Vec<DnsRecord>,
}

/// Cloudflare DNS client
///
/// Stateless and single-shot. Build one per run from the loaded
/// configuration via [`CloudflareFactory`].
pub struct CloudflareClient {
    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// API base URL without trailing slash
    api_base: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareClient")
            .field("api_token", &"<REDACTED>")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl CloudflareClient {
    /// Create a new Cloudflare client
    ///
    /// # Parameters
    ///
    /// - `api_token`: Cloudflare API token with Zone:DNS:Edit permissions
    /// - `api_base`: API base URL (e.g. [`CLOUDFLARE_API_BASE`])
    /// - `timeout`: Per-request timeout
    ///
    /// # Errors
    ///
    /// `Error::Config` if the token is empty or the HTTP client cannot be built.
    pub fn new(
        api_token: impl Into<String>,
        api_base: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_token,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Create a client against the public API with the default timeout
    pub fn with_defaults(api_token: impl Into<String>) -> Result<Self> {
        Self::new(api_token, CLOUDFLARE_API_BASE, DEFAULT_HTTP_TIMEOUT)
    }

    fn records_url(&self, zone_id: &str) -> String {
        format!("{}/zones/{}/dns_records", self.api_base, zone_id)
    }
}

/// Describe a non-200 response for an error message
fn describe_failure(action: &str, status: StatusCode, body: &str) -> String {
    match status.as_u16() {
        401 | 403 => format!(
            "{}: authentication failed, invalid API token or insufficient permissions",
            action
        ),
        404 => format!("{}: zone or record not found", action),
        409 => format!("{}: conflict, record is being changed concurrently", action),
        429 => format!("{}: rate limit exceeded", action),
        500..=599 => format!("{}: Cloudflare server error: {}", action, body),
        _ => format!("{}: {}", action, body),
    }
}

#[async_trait]
impl DnsProvider for CloudflareClient {
    /// List the records named `hostname` in `zone_id`
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /zones/:zone_id/dns_records?name=host.example.com
    /// Authorization: Bearer <token>
    /// ```
    async fn list_records(&self, zone_id: &str, hostname: &str) -> Result<Vec<DnsRecord>> {
        tracing::debug!("Listing Cloudflare DNS records for {}", hostname);

        let response = self
            .client
            .get(self.records_url(zone_id))
            .bearer_auth(&self.api_token)
            .query(&[("name", hostname)])
            .send()
            .await
            .map_err(|e| Error::list(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if status != StatusCode::OK {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(Error::list_status(
                status.as_u16(),
                describe_failure("Record listing", status, &error_text),
            ));
        }

        let body: ListResponse = response
            .json()
            .await
            .map_err(|e| Error::list(format!("Failed to parse response: {}", e)))?;

        tracing::debug!("Cloudflare returned {} record(s)", body.result.len());
        Ok(body.result)
    }

    /// Replace record `record_id` with `request`
    ///
    /// # API Call
    ///
    /// ```http
    /// PUT /zones/:zone_id/dns_records/:record_id
    /// Authorization: Bearer <token>
    /// Content-Type: application/json
    ///
    /// {"type": "A", "name": "host.example.com", "content": "203.0.113.9", "ttl": 1, "proxied": false}
    /// ```
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        request: &UpdateRequest,
    ) -> Result<()> {
        tracing::debug!(
            "Updating Cloudflare DNS record {}: {} -> {}",
            record_id,
            request.name,
            request.content
        );

        let url = format!("{}/{}", self.records_url(zone_id), record_id);
        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.api_token)
            .header(CONTENT_TYPE, "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| Error::update(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if status != StatusCode::OK {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(Error::update_status(
                status.as_u16(),
                describe_failure("Record update", status, &error_text),
            ));
        }

        tracing::debug!("Cloudflare accepted update of record {}", record_id);
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }
}

/// Factory for creating Cloudflare clients from the loaded configuration
#[derive(Debug, Clone)]
pub struct CloudflareFactory {
    api_base: String,
    timeout: Duration,
}

impl CloudflareFactory {
    /// Factory targeting the public API with the default timeout
    pub fn new() -> Self {
        Self {
            api_base: CLOUDFLARE_API_BASE.to_string(),
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }

    /// Override the API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Override the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for CloudflareFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl DnsProviderFactory for CloudflareFactory {
    fn create(&self, config: &Configuration) -> Result<Box<dyn DnsProvider>> {
        let client = CloudflareClient::new(config.api_token.clone(), self.api_base.clone(), self.timeout)?;
        Ok(Box::new(client))
    }
}
