// # Environment Secret Provider
//
// Reads secrets from environment variables.
//
// ## Name Mapping
//
// The secret name is upper-cased, `-` and `.` become `_`, and the prefix is
// prepended:
//
// | secret name     | variable (prefix `IPSYNC_SECRET_`) |
// |-----------------|------------------------------------|
// | `dns-zone-id`   | `IPSYNC_SECRET_DNS_ZONE_ID`        |
// | `dns-api-token` | `IPSYNC_SECRET_DNS_API_TOKEN`      |
//
// The environment is snapshotted at construction time.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::Error;
use crate::traits::SecretProvider;

/// Default prefix for secret environment variables
pub const DEFAULT_ENV_PREFIX: &str = "IPSYNC_SECRET_";

/// Environment-backed secret provider
pub struct EnvSecretProvider {
    prefix: String,
    vars: HashMap<String, String>,
}

// Custom Debug implementation that hides the values
impl std::fmt::Debug for EnvSecretProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvSecretProvider")
            .field("prefix", &self.prefix)
            .field("vars", &self.vars.len())
            .finish()
    }
}

impl EnvSecretProvider {
    /// Snapshot the process environment
    pub fn from_env(prefix: impl Into<String>) -> Self {
        Self::from_vars(prefix, std::env::vars())
    }

    /// Build from an explicit set of variables
    ///
    /// Only variables starting with `prefix` are kept.
    pub fn from_vars<I, K, V>(prefix: impl Into<String>, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let prefix = prefix.into();
        let vars = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(k, _)| k.starts_with(&prefix))
            .collect();

        Self { prefix, vars }
    }

    /// Environment variable that holds the secret `name`
    pub fn var_name(&self, name: &str) -> String {
        let suffix: String = name
            .chars()
            .map(|c| match c {
                '-' | '.' => '_',
                c => c.to_ascii_uppercase(),
            })
            .collect();
        format!("{}{}", self.prefix, suffix)
    }
}

#[async_trait]
impl SecretProvider for EnvSecretProvider {
    async fn get_secret(&self, name: &str) -> Result<String, Error> {
        let var = self.var_name(name);
        self.vars
            .get(&var)
            .cloned()
            .ok_or_else(|| Error::secret(format!("environment variable {} is not set", var)))
    }

    fn backend_name(&self) -> &'static str {
        "env"
    }
}
