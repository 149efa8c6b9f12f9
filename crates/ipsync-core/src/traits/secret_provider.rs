// # Secret Provider Trait
//
// Defines the interface for retrieving configuration values by name.
//
// ## Implementations
//
// - Environment variables: `ipsync_core::secrets::EnvSecretProvider`
// - In-memory map: `ipsync_core::secrets::MemorySecretProvider`
// - Google Secret Manager: `ipsync-secret-gcp` crate

use async_trait::async_trait;

/// Trait for secret provider implementations
///
/// # Security
///
/// Implementations must never log secret values, only secret names.
#[async_trait]
pub trait SecretProvider: Send + Sync {
    /// Get the latest value of the secret called `name`
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The decoded secret value
    /// - `Err(Error::Secret)`: If the secret is missing, access was denied,
    ///   or the backend could not be reached
    async fn get_secret(&self, name: &str) -> Result<String, crate::Error>;

    /// Get the backend name (for logging/debugging)
    fn backend_name(&self) -> &'static str;
}
