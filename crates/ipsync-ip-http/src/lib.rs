// # HTTP IP Resolver
//
// This crate provides the public IP resolver used by the reconciler.
//
// ## Behavior
//
// One GET against an "echo my address" service (https://ident.me by
// default). The response body IS the address: it is returned exactly as
// received, with no trimming and no parsing, so the comparison against the
// DNS record stays byte-for-byte.
//
// - Any status other than 200 fails the lookup
// - An empty body fails the lookup
// - No caching and no retry

use ipsync_core::traits::IpResolver;
use ipsync_core::{Error, Result};

use reqwest::StatusCode;
use std::time::Duration;

/// Default address echo service
pub const DEFAULT_RESOLVER_URL: &str = "https://ident.me";

/// Default request timeout
pub const DEFAULT_RESOLVER_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP-based public IP resolver
#[derive(Debug, Clone)]
pub struct HttpIpResolver {
    /// URL to fetch the address from
    url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpResolver {
    /// Create a resolver against `url` with the default timeout
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_timeout(url, DEFAULT_RESOLVER_TIMEOUT)
    }

    /// Create a resolver against `url` with a custom timeout
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }

    /// URL the address is fetched from
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Default for HttpIpResolver {
    fn default() -> Self {
        Self::new(DEFAULT_RESOLVER_URL)
    }
}

#[async_trait::async_trait]
impl IpResolver for HttpIpResolver {
    async fn resolve_current_ip(&self) -> Result<String> {
        tracing::debug!("Fetching public address from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::resolve(format!("Request failed: {}", e)))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(Error::resolve_status(
                status.as_u16(),
                format!("{} answered {}", self.url, status),
            ));
        }

        let address = response
            .text()
            .await
            .map_err(|e| Error::resolve(format!("Failed to read response: {}", e)))?;

        if address.is_empty() {
            return Err(Error::resolve(format!("{} returned an empty body", self.url)));
        }

        Ok(address)
    }

    fn resolver_name(&self) -> &'static str {
        "http"
    }
}
