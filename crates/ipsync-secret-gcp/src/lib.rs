// # Google Secret Manager Secret Provider
//
// Reads the reconciler's configuration from Secret Manager (REST API v1).
//
// ## Behavior
//
// - Always reads the `latest` version of a secret
// - `payload.data` is base64 on the wire and must decode to UTF-8
// - One GET per secret, no caching, no retry
//
// ## Authentication
//
// - On GCE/GKE: an OAuth2 access token is fetched once from the metadata
//   server when the provider is built ([`GcpSecretManager::connect`])
// - Elsewhere: the caller supplies a token ([`GcpSecretManager::new`])
//
// The access token and decoded secret values never appear in logs or Debug
// output.
//
// ## API Reference
//
// - Access: GET `/v1/projects/:project/secrets/:secret/versions/latest:access`
// - Metadata token: GET `/computeMetadata/v1/instance/service-accounts/default/token`

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use ipsync_core::traits::SecretProvider;
use ipsync_core::{Error, Result};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

/// Secret Manager API base URL
pub const SECRET_MANAGER_BASE: &str = "https://secretmanager.googleapis.com";

/// Metadata server endpoint issuing tokens for the default service account
pub const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Default HTTP timeout for API requests
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Response of `versions/latest:access`
#[derive(Debug, Deserialize)]
struct AccessSecretVersionResponse {
    /// `projects/*/secrets/*/versions/*`, logged at debug level
    name: String,
    payload: SecretPayload,
}

#[derive(Debug, Deserialize)]
struct SecretPayload {
    /// Base64-encoded secret data
    data: String,
}

/// Standard GCP error body
#[derive(Debug, Deserialize)]
struct GcpErrorResponse {
    error: GcpError,
}

#[derive(Debug, Deserialize)]
struct GcpError {
    code: u16,
    message: String,
    /// e.g. "NOT_FOUND", "PERMISSION_DENIED"
    #[serde(default)]
    status: String,
}

/// OAuth2 token issued by the metadata server
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

/// Secret provider backed by Google Secret Manager
pub struct GcpSecretManager {
    http_client: reqwest::Client,
    base_url: String,
    project_id: String,

    /// OAuth2 access token
    /// ⚠️ NEVER log this value
    access_token: String,
}

impl std::fmt::Debug for GcpSecretManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GcpSecretManager")
            .field("project_id", &self.project_id)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GcpSecretManager {
    /// Create a provider with an explicit access token
    ///
    /// # Errors
    ///
    /// `Error::Config` if the project or token is empty, or the HTTP client
    /// cannot be built.
    pub fn new(project_id: impl Into<String>, access_token: impl Into<String>) -> Result<Self> {
        let project_id = project_id.into();
        let access_token = access_token.into();

        if project_id.is_empty() {
            return Err(Error::config("GCP project id cannot be empty"));
        }
        if access_token.is_empty() {
            return Err(Error::config("GCP access token cannot be empty"));
        }

        Ok(Self {
            http_client: build_client()?,
            base_url: SECRET_MANAGER_BASE.to_string(),
            project_id,
            access_token,
        })
    }

    /// Create a provider authenticated through the GCE metadata server
    pub async fn connect(project_id: impl Into<String>) -> Result<Self> {
        Self::connect_with_metadata_url(project_id, METADATA_TOKEN_URL).await
    }

    /// Like [`GcpSecretManager::connect`], against a custom token endpoint
    pub async fn connect_with_metadata_url(
        project_id: impl Into<String>,
        metadata_url: &str,
    ) -> Result<Self> {
        let client = build_client()?;
        let access_token = fetch_metadata_token(&client, metadata_url).await?;
        Self::new(project_id, access_token)
    }

    /// Override the API base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Project the secrets are read from
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    fn access_url(&self, name: &str) -> String {
        format!(
            "{}/v1/projects/{}/secrets/{}/versions/latest:access",
            self.base_url, self.project_id, name
        )
    }
}

fn build_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(DEFAULT_HTTP_TIMEOUT)
        .build()
        .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))
}

/// Fetch an access token for the default service account
async fn fetch_metadata_token(client: &reqwest::Client, metadata_url: &str) -> Result<String> {
    let response = client
        .get(metadata_url)
        .header("Metadata-Flavor", "Google")
        .send()
        .await
        .map_err(|e| Error::secret(format!("Metadata server not available: {}", e)))?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(Error::secret(format!(
            "Metadata server returned {} for token request",
            status
        )));
    }

    let token: TokenResponse = response
        .json()
        .await
        .map_err(|e| Error::secret(format!("Failed to parse token response: {}", e)))?;

    tracing::info!(
        "Retrieved access token from metadata server (expires in {}s)",
        token.expires_in
    );
    Ok(token.access_token)
}

/// Turn a non-200 response body into a readable message
fn describe_failure(name: &str, status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<GcpErrorResponse>(body) {
        Ok(parsed) => format!(
            "secret '{}': {} (code: {}, status: {})",
            name, parsed.error.message, parsed.error.code, parsed.error.status
        ),
        Err(_) => format!("secret '{}': HTTP {}: {}", name, status, body),
    }
}

/// Decode a base64 payload into a UTF-8 value
fn decode_payload(name: &str, data: &str) -> Result<String> {
    let bytes = general_purpose::STANDARD
        .decode(data)
        .map_err(|e| Error::secret(format!("secret '{}': payload is not base64: {}", name, e)))?;

    String::from_utf8(bytes)
        .map_err(|_| Error::secret(format!("secret '{}': payload is not valid UTF-8", name)))
}

#[async_trait]
impl SecretProvider for GcpSecretManager {
    async fn get_secret(&self, name: &str) -> Result<String> {
        tracing::debug!("Accessing secret {} in project {}", name, self.project_id);

        let response = self
            .http_client
            .get(self.access_url(name))
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| Error::secret(format!("secret '{}': request failed: {}", name, e)))?;

        let status = response.status();
        if status != StatusCode::OK {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::secret(describe_failure(name, status, &error_text)));
        }

        let body: AccessSecretVersionResponse = response.json().await.map_err(|e| {
            Error::secret(format!("secret '{}': failed to parse response: {}", name, e))
        })?;

        tracing::debug!("Read {}", body.name);
        decode_payload(name, &body.payload.data)
    }

    fn backend_name(&self) -> &'static str {
        "gcp-secret-manager"
    }
}
