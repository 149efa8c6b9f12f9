//! Configuration types for the reconciler
//!
//! The run configuration is loaded once from a [`SecretProvider`] and then
//! passed by reference to every collaborator. Nothing mutates it afterwards.

use crate::traits::SecretProvider;
use crate::{Error, Result};
use tracing::debug;

/// Default secret name holding the zone identifier
pub const DEFAULT_ZONE_ID_SECRET: &str = "dns-zone-id";
/// Default secret name holding the record identifier
pub const DEFAULT_RECORD_ID_SECRET: &str = "dns-record-id";
/// Default secret name holding the provider API token
pub const DEFAULT_API_TOKEN_SECRET: &str = "dns-api-token";
/// Default secret name holding the target hostname
pub const DEFAULT_HOSTNAME_SECRET: &str = "dns-hostname";

/// Names of the four secrets making up a [`Configuration`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretNames {
    /// Secret holding the zone identifier
    pub zone_id: String,
    /// Secret holding the record identifier
    pub record_id: String,
    /// Secret holding the provider API token
    pub api_token: String,
    /// Secret holding the target hostname
    pub hostname: String,
}

impl SecretNames {
    /// Create secret names with the defaults
    pub fn new() -> Self {
        Self {
            zone_id: DEFAULT_ZONE_ID_SECRET.to_string(),
            record_id: DEFAULT_RECORD_ID_SECRET.to_string(),
            api_token: DEFAULT_API_TOKEN_SECRET.to_string(),
            hostname: DEFAULT_HOSTNAME_SECRET.to_string(),
        }
    }

    /// Set the zone identifier secret name
    pub fn with_zone_id(mut self, name: impl Into<String>) -> Self {
        self.zone_id = name.into();
        self
    }

    /// Set the record identifier secret name
    pub fn with_record_id(mut self, name: impl Into<String>) -> Self {
        self.record_id = name.into();
        self
    }

    /// Set the API token secret name
    pub fn with_api_token(mut self, name: impl Into<String>) -> Self {
        self.api_token = name.into();
        self
    }

    /// Set the hostname secret name
    pub fn with_hostname(mut self, name: impl Into<String>) -> Self {
        self.hostname = name.into();
        self
    }
}

impl Default for SecretNames {
    fn default() -> Self {
        Self::new()
    }
}

/// Run configuration
///
/// # Security
///
/// The Debug implementation does NOT expose the API token.
#[derive(Clone, PartialEq, Eq)]
pub struct Configuration {
    /// Provider zone containing the record
    pub zone_id: String,
    /// Provider identifier of the record to update
    pub record_id: String,
    /// Provider API token
    /// ⚠️ NEVER log this value
    pub api_token: String,
    /// Hostname the record publishes
    pub target_hostname: String,
}

impl std::fmt::Debug for Configuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Configuration")
            .field("zone_id", &self.zone_id)
            .field("record_id", &self.record_id)
            .field("api_token", &"<REDACTED>")
            .field("target_hostname", &self.target_hostname)
            .finish()
    }
}

impl Configuration {
    /// Load the configuration from `secrets`
    ///
    /// Secrets are fetched one after another. The first failure aborts the
    /// load; no partially filled configuration is ever returned.
    ///
    /// # Errors
    ///
    /// `Error::Config` naming the secret that could not be fetched or was
    /// empty.
    pub async fn load(secrets: &dyn SecretProvider, names: &SecretNames) -> Result<Self> {
        debug!(
            "Loading configuration from {} secret backend",
            secrets.backend_name()
        );

        let zone_id = fetch_required(secrets, &names.zone_id).await?;
        let record_id = fetch_required(secrets, &names.record_id).await?;
        let api_token = fetch_required(secrets, &names.api_token).await?;
        let target_hostname = fetch_required(secrets, &names.hostname).await?;

        Ok(Self {
            zone_id,
            record_id,
            api_token,
            target_hostname,
        })
    }
}

/// Fetch one secret, trimming surrounding whitespace and rejecting empty values
async fn fetch_required(secrets: &dyn SecretProvider, name: &str) -> Result<String> {
    let value = secrets
        .get_secret(name)
        .await
        .map_err(|e| Error::config(format!("secret '{}' could not be retrieved: {}", name, e)))?;

    let value = value.trim();
    if value.is_empty() {
        return Err(Error::config(format!("secret '{}' is empty", name)));
    }

    debug!("Loaded secret '{}'", name);
    Ok(value.to_string())
}
