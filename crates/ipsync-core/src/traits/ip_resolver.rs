// # IP Resolver Trait
//
// Defines the interface for discovering the host's current public address.
//
// ## Implementations
//
// - HTTP "what is my IP" services: `ipsync-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use ipsync_core::IpResolver;
//
// let resolver = /* IpResolver implementation */;
// let address = resolver.resolve_current_ip().await?;
// println!("public address: {}", address);
// ```

use async_trait::async_trait;

/// Trait for public IP resolver implementations
///
/// The returned address is opaque text. Implementations must not reformat
/// it: the reconciler compares it byte-for-byte with the published record.
#[async_trait]
pub trait IpResolver: Send + Sync {
    /// Get the current public address
    ///
    /// Called exactly once per run. No caching and no retry.
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The current address, non-empty
    /// - `Err(Error::Resolve)`: If the lookup failed or returned non-200
    async fn resolve_current_ip(&self) -> Result<String, crate::Error>;

    /// Get the resolver name (for logging/debugging)
    fn resolver_name(&self) -> &'static str;
}
