// # ipsync - one-shot DNS address reconciler
//
// This binary is a THIN integration layer:
// - Reading process configuration from environment variables
// - Initializing logging and the runtime
// - Wiring the secret backend, IP resolver and DNS provider
// - Running one reconciliation pass and mapping the result to an exit code
//
// All reconciliation logic lives in ipsync-core.
//
// ## Configuration
//
// ### Secret backend
// - `IPSYNC_SECRET_BACKEND`: Where the run configuration lives (gcp, env)
// - `IPSYNC_GCP_PROJECT`: Project holding the secrets (gcp backend)
// - `IPSYNC_GCP_SECRET_MANAGER_URL`: Secret Manager API base
// - `IPSYNC_GCP_ACCESS_TOKEN`: Use this token instead of the metadata server
//
// ### Secret names
// - `IPSYNC_ZONE_ID_SECRET`, `IPSYNC_RECORD_ID_SECRET`,
//   `IPSYNC_API_TOKEN_SECRET`, `IPSYNC_HOSTNAME_SECRET`
//
// These stay outside `IPSYNC_SECRET_`, which the env backend reads values from.
//
// ### Endpoints
// - `IPSYNC_IP_RESOLVER_URL`: Public address echo service
// - `IPSYNC_DNS_API_URL`: Cloudflare API base
//
// ### Behavior
// - `IPSYNC_MODE`: live or dry-run
// - `IPSYNC_LOG_LEVEL`: trace, debug, info, warn, error
//
// ## Example
//
// ```bash
// export IPSYNC_GCP_PROJECT=my-project
// ipsync
//
// # Without GCP, secrets come from IPSYNC_SECRET_DNS_* variables
// export IPSYNC_SECRET_BACKEND=env
// export IPSYNC_SECRET_DNS_ZONE_ID=... IPSYNC_SECRET_DNS_RECORD_ID=...
// export IPSYNC_SECRET_DNS_API_TOKEN=... IPSYNC_SECRET_DNS_HOSTNAME=vm.example.com
// IPSYNC_MODE=dry-run ipsync
// ```

use anyhow::Result;
use ipsync_core::secrets::DEFAULT_ENV_PREFIX;
use ipsync_core::{EnvSecretProvider, Reconciler, SecretNames, SecretProvider};
use ipsync_ip_http::{DEFAULT_RESOLVER_URL, HttpIpResolver};
use ipsync_provider_cloudflare::{CLOUDFLARE_API_BASE, CloudflareFactory};
use std::env;
use std::process::ExitCode;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

const DEFAULT_SECRET_MANAGER_URL: &str = "https://secretmanager.googleapis.com";

// Secret name overrides
const ZONE_ID_SECRET_VAR: &str = "IPSYNC_ZONE_ID_SECRET";
const RECORD_ID_SECRET_VAR: &str = "IPSYNC_RECORD_ID_SECRET";
const API_TOKEN_SECRET_VAR: &str = "IPSYNC_API_TOKEN_SECRET";
const HOSTNAME_SECRET_VAR: &str = "IPSYNC_HOSTNAME_SECRET";

/// Exit codes for the possible run results
///
/// - 0: Record already current, updated, or dry-run completed
/// - 1: Configuration error (environment or secrets)
/// - 2: Reconciliation error (lookup, listing, matching or update)
/// - 3: Runtime error (logging or runtime initialization)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IpsyncExitCode {
    Success = 0,
    ConfigError = 1,
    ReconcileError = 2,
    RuntimeError = 3,
}

impl From<IpsyncExitCode> for ExitCode {
    fn from(code: IpsyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

impl From<&ipsync_core::Error> for IpsyncExitCode {
    fn from(err: &ipsync_core::Error) -> Self {
        if err.is_config() {
            IpsyncExitCode::ConfigError
        } else {
            IpsyncExitCode::ReconcileError
        }
    }
}

/// Process configuration
struct Config {
    secret_backend: String,
    gcp_project: Option<String>,
    gcp_secret_manager_url: String,
    gcp_access_token: Option<String>,
    secret_names: SecretNames,
    ip_resolver_url: String,
    dns_api_url: String,
    mode: String,
    log_level: String,
}

// Keeps the GCP access token out of any output
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("secret_backend", &self.secret_backend)
            .field("gcp_project", &self.gcp_project)
            .field("gcp_secret_manager_url", &self.gcp_secret_manager_url)
            .field(
                "gcp_access_token",
                &self.gcp_access_token.as_ref().map(|_| "<REDACTED>"),
            )
            .field("secret_names", &self.secret_names)
            .field("ip_resolver_url", &self.ip_resolver_url)
            .field("dns_api_url", &self.dns_api_url)
            .field("mode", &self.mode)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`; empty values count as unset
    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let defaults = SecretNames::new();

        Self {
            secret_backend: get("IPSYNC_SECRET_BACKEND").unwrap_or_else(|| "gcp".to_string()),
            gcp_project: get("IPSYNC_GCP_PROJECT"),
            gcp_secret_manager_url: get("IPSYNC_GCP_SECRET_MANAGER_URL")
                .unwrap_or_else(|| DEFAULT_SECRET_MANAGER_URL.to_string()),
            gcp_access_token: get("IPSYNC_GCP_ACCESS_TOKEN"),
            secret_names: SecretNames {
                zone_id: get(ZONE_ID_SECRET_VAR).unwrap_or(defaults.zone_id),
                record_id: get(RECORD_ID_SECRET_VAR).unwrap_or(defaults.record_id),
                api_token: get(API_TOKEN_SECRET_VAR).unwrap_or(defaults.api_token),
                hostname: get(HOSTNAME_SECRET_VAR).unwrap_or(defaults.hostname),
            },
            ip_resolver_url: get("IPSYNC_IP_RESOLVER_URL")
                .unwrap_or_else(|| DEFAULT_RESOLVER_URL.to_string()),
            dns_api_url: get("IPSYNC_DNS_API_URL")
                .unwrap_or_else(|| CLOUDFLARE_API_BASE.to_string()),
            mode: get("IPSYNC_MODE").unwrap_or_else(|| "live".to_string()),
            log_level: get("IPSYNC_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        }
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        match self.secret_backend.as_str() {
            "gcp" => {
                if self.gcp_project.is_none() {
                    anyhow::bail!(
                        "IPSYNC_GCP_PROJECT is required when IPSYNC_SECRET_BACKEND=gcp. \
                        Set it via: export IPSYNC_GCP_PROJECT=your-project"
                    );
                }
                if !cfg!(feature = "gcp") {
                    anyhow::bail!(
                        "IPSYNC_SECRET_BACKEND=gcp but this binary was built without the gcp feature"
                    );
                }
                validate_url("IPSYNC_GCP_SECRET_MANAGER_URL", &self.gcp_secret_manager_url)?;
            }
            "env" => {}
            other => anyhow::bail!(
                "IPSYNC_SECRET_BACKEND '{}' is not supported. \
                Supported backends: gcp, env",
                other
            ),
        }

        for (var, name) in [
            (ZONE_ID_SECRET_VAR, &self.secret_names.zone_id),
            (RECORD_ID_SECRET_VAR, &self.secret_names.record_id),
            (API_TOKEN_SECRET_VAR, &self.secret_names.api_token),
            (HOSTNAME_SECRET_VAR, &self.secret_names.hostname),
        ] {
            if name.trim().is_empty() {
                anyhow::bail!("{} cannot be blank", var);
            }
        }

        validate_url("IPSYNC_IP_RESOLVER_URL", &self.ip_resolver_url)?;
        validate_url("IPSYNC_DNS_API_URL", &self.dns_api_url)?;

        // The API token travels to this endpoint
        if self.dns_api_url.starts_with("http://") {
            eprintln!(
                "WARNING: IPSYNC_DNS_API_URL uses HTTP (not HTTPS). \
                The API token is sent in clear text."
            );
        }

        match self.mode.as_str() {
            "live" | "dry-run" => {}
            _ => anyhow::bail!(
                "IPSYNC_MODE '{}' is not valid. Valid modes: live, dry-run",
                self.mode
            ),
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "IPSYNC_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    fn is_dry_run(&self) -> bool {
        self.mode == "dry-run"
    }

    fn tracing_level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

fn validate_url(var: &str, url: &str) -> Result<()> {
    if !url.starts_with("https://") && !url.starts_with("http://") {
        anyhow::bail!("{} must use HTTP or HTTPS scheme. Got: {}", var, url);
    }
    Ok(())
}

fn main() -> ExitCode {
    let config = Config::from_env();

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return IpsyncExitCode::ConfigError.into();
    }

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.tracing_level())
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return IpsyncExitCode::RuntimeError.into();
    }

    info!(
        "Starting ipsync (mode={}, secrets={})",
        config.mode, config.secret_backend
    );

    // One pass, every call awaited in turn
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return IpsyncExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run(config)).into()
}

/// Wire the components and run one reconciliation pass
async fn run(config: Config) -> IpsyncExitCode {
    let secrets = match secret_provider(&config).await {
        Ok(secrets) => secrets,
        Err(e) => {
            error!("Secret backend unavailable: {}", e);
            return IpsyncExitCode::ConfigError;
        }
    };
    info!("Reading configuration from {}", secrets.backend_name());

    let reconciler = Reconciler::new(
        secrets,
        config.secret_names.clone(),
        Box::new(HttpIpResolver::new(config.ip_resolver_url.clone())),
        Box::new(CloudflareFactory::new().with_api_base(config.dns_api_url.clone())),
    )
    .with_dry_run(config.is_dry_run());

    // The outcome line is logged by the reconciler
    match reconciler.run().await {
        Ok(_) => IpsyncExitCode::Success,
        Err(e) => {
            error!("Reconciliation failed: {}", e);
            IpsyncExitCode::from(&e)
        }
    }
}

async fn secret_provider(config: &Config) -> Result<Box<dyn SecretProvider>> {
    match config.secret_backend.as_str() {
        "env" => Ok(Box::new(EnvSecretProvider::from_env(DEFAULT_ENV_PREFIX))),
        "gcp" => gcp_secret_provider(config).await,
        other => anyhow::bail!("Unsupported secret backend: {}", other),
    }
}

#[cfg(feature = "gcp")]
async fn gcp_secret_provider(config: &Config) -> Result<Box<dyn SecretProvider>> {
    use ipsync_secret_gcp::GcpSecretManager;

    let project = config
        .gcp_project
        .clone()
        .ok_or_else(|| anyhow::anyhow!("IPSYNC_GCP_PROJECT is not set"))?;

    let provider = match &config.gcp_access_token {
        Some(token) => GcpSecretManager::new(project, token.clone())?,
        None => GcpSecretManager::connect(project).await?,
    };

    Ok(Box::new(
        provider.with_base_url(config.gcp_secret_manager_url.clone()),
    ))
}

#[cfg(not(feature = "gcp"))]
async fn gcp_secret_provider(_config: &Config) -> Result<Box<dyn SecretProvider>> {
    anyhow::bail!("Built without the gcp feature")
}
