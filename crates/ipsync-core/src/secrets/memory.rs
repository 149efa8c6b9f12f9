// # Memory Secret Provider
//
// In-memory implementation of SecretProvider.
//
// ## Purpose
//
// Provides secrets from a map held by the process. Useful for tests and for
// embedding the reconciler in a program that already holds its credentials.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use async_trait::async_trait;

use crate::traits::SecretProvider;
use crate::Error;

/// In-memory secret provider
///
/// Clones share the same underlying map.
///
/// # Example
///
/// ```rust
/// use ipsync_core::secrets::MemorySecretProvider;
/// use ipsync_core::traits::SecretProvider;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemorySecretProvider::from_pairs([("dns-hostname", "host.example.com")]);
///
///     let hostname = store.get_secret("dns-hostname").await?;
///     assert_eq!(hostname, "host.example.com");
///
///     Ok(())
/// }
/// ```
#[derive(Clone, Default)]
pub struct MemorySecretProvider {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

// Custom Debug implementation that lists names only
impl std::fmt::Debug for MemorySecretProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self
            .inner
            .try_read()
            .map(|guard| guard.keys().cloned().collect())
            .unwrap_or_default();
        f.debug_struct("MemorySecretProvider")
            .field("names", &names)
            .finish()
    }
}

impl MemorySecretProvider {
    /// Create a new empty provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider holding the given name/value pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            inner: Arc::new(RwLock::new(map)),
        }
    }

    /// Set or replace a secret
    pub async fn insert(&self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.write().await.insert(name.into(), value.into());
    }

    /// Remove a secret
    pub async fn remove(&self, name: &str) {
        self.inner.write().await.remove(name);
    }

    /// Get the number of secrets held
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the provider holds no secrets
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl SecretProvider for MemorySecretProvider {
    async fn get_secret(&self, name: &str) -> Result<String, Error> {
        let guard = self.inner.read().await;
        guard
            .get(name)
            .cloned()
            .ok_or_else(|| Error::secret(format!("secret '{}' not found", name)))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
