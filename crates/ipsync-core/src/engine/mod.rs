//! Reconciliation engine
//!
//! The Reconciler performs one pass per process:
//! - Loading the configuration via SecretProvider
//! - Resolving the current address via IpResolver
//! - Fetching the published record via DnsProvider
//! - Updating the record only when the two differ
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────┐   ┌─────────────┐   ┌─────────────┐
//! │ SecretProvider │   │ IpResolver  │   │ DnsProvider │
//! └────────────────┘   └─────────────┘   └─────────────┘
//!         ▲                   ▲             ▲       ▲
//!         │ 1. load           │ 2. resolve  │ 3.    │ 5. update
//!         │                   │             │ list  │ (only if needed)
//!         └───────────┬───────┴─────────────┘       │
//!                     │                             │
//!              ┌──────────────┐   4. compare        │
//!              │  Reconciler  │─────────────────────┘
//!              └──────────────┘
//! ```
//!
//! ## Run Flow
//!
//! `Init → ConfigLoaded → IpResolved → RecordFetched → {NoOpDone | UpdateDone} → Terminated`
//!
//! Every step can end the run with an error. No step is repeated and
//! nothing before the update mutates provider state.

use crate::config::{Configuration, SecretNames};
use crate::error::Result;
use crate::traits::{DnsProviderFactory, IpResolver, RecordLookup, SecretProvider, UpdateRequest};
use std::fmt;
use tracing::{debug, info, warn};

/// Phases of a single run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing has happened yet
    Init,
    /// Configuration loaded from the secret provider
    ConfigLoaded,
    /// Current address resolved
    IpResolved,
    /// Published record fetched and matched
    RecordFetched,
    /// Record already matched; nothing written
    NoOpDone,
    /// Record updated (or, in dry-run mode, the update was logged)
    UpdateDone,
    /// Run finished, successfully or not
    Terminated,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Init => "init",
            Phase::ConfigLoaded => "config-loaded",
            Phase::IpResolved => "ip-resolved",
            Phase::RecordFetched => "record-fetched",
            Phase::NoOpDone => "no-op-done",
            Phase::UpdateDone => "update-done",
            Phase::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// Successful result of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The record already published the current address
    Unchanged {
        /// Target hostname
        hostname: String,
        /// Address published and resolved
        address: String,
    },

    /// The record was updated
    Updated {
        /// Target hostname
        hostname: String,
        /// Address the record held before
        previous: String,
        /// Address the record holds now
        current: String,
    },

    /// The record differs but dry-run mode skipped the write
    DryRun {
        /// Target hostname
        hostname: String,
        /// Address the record holds
        previous: String,
        /// Address that would have been written
        current: String,
    },
}

impl Outcome {
    /// Whether the provider's write endpoint was called
    pub fn wrote_record(&self) -> bool {
        matches!(self, Outcome::Updated { .. })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Unchanged { hostname, address } => write!(
                f,
                "{} already points to {}; nothing to do",
                hostname, address
            ),
            Outcome::Updated {
                hostname,
                previous,
                current,
            } => write!(f, "{} updated to {} (was {})", hostname, current, previous),
            Outcome::DryRun {
                hostname,
                previous,
                current,
            } => write!(
                f,
                "[DRY-RUN] {} would be updated to {} (is {})",
                hostname, current, previous
            ),
        }
    }
}

/// One-shot DNS address reconciler
///
/// ## Lifecycle
///
/// 1. Create with [`Reconciler::new()`]
/// 2. Call [`Reconciler::run()`] once per process
///
/// The reconciler holds no state between runs; calling `run()` again
/// repeats the whole pass from the configuration load.
pub struct Reconciler {
    /// Source of the configuration secrets
    secrets: Box<dyn SecretProvider>,

    /// Names of the configuration secrets
    secret_names: SecretNames,

    /// Public address lookup
    ip_resolver: Box<dyn IpResolver>,

    /// Builds the DNS client once the API token is known
    provider_factory: Box<dyn DnsProviderFactory>,

    /// Log the intended update instead of sending it
    dry_run: bool,
}

impl Reconciler {
    /// Create a new reconciler
    ///
    /// # Parameters
    ///
    /// - `secrets`: Secret provider holding the configuration
    /// - `secret_names`: Names of the four configuration secrets
    /// - `ip_resolver`: Public address resolver
    /// - `provider_factory`: Factory for the DNS provider client
    pub fn new(
        secrets: Box<dyn SecretProvider>,
        secret_names: SecretNames,
        ip_resolver: Box<dyn IpResolver>,
        provider_factory: Box<dyn DnsProviderFactory>,
    ) -> Self {
        Self {
            secrets,
            secret_names,
            ip_resolver,
            provider_factory,
            dry_run: false,
        }
    }

    /// Enable or disable dry-run mode
    ///
    /// In dry-run mode every read happens as usual, but the update request is
    /// logged instead of sent.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Run one reconciliation pass
    ///
    /// # Returns
    ///
    /// - `Ok(Outcome)`: The record is (or, in dry-run mode, would be) consistent
    /// - `Err(Error)`: The step that failed; nothing after it ran
    pub async fn run(&self) -> Result<Outcome> {
        let result = self.run_steps().await;

        match &result {
            Ok(outcome) => debug!("Run {} ({})", Phase::Terminated, outcome),
            Err(e) => warn!("Run {} with error: {}", Phase::Terminated, e),
        }

        result
    }

    async fn run_steps(&self) -> Result<Outcome> {
        debug!("Run phase: {}", Phase::Init);

        let config = Configuration::load(self.secrets.as_ref(), &self.secret_names).await?;
        debug!(
            "Run phase: {} (zone={}, record={}, hostname={})",
            Phase::ConfigLoaded,
            config.zone_id,
            config.record_id,
            config.target_hostname
        );

        let current = self.resolve_current_address().await?;
        debug!("Run phase: {} (address={})", Phase::IpResolved, current);

        let provider = self.provider_factory.create(&config)?;
        let records = provider
            .list_records(&config.zone_id, &config.target_hostname)
            .await?;
        debug!(
            "{} returned {} record(s) for {}",
            provider.provider_name(),
            records.len(),
            config.target_hostname
        );

        let record = RecordLookup::from_listing(records, &config.target_hostname)
            .into_record(&config.target_hostname)?;
        debug!(
            "Run phase: {} (published={})",
            Phase::RecordFetched,
            record.content
        );

        // The write goes to the configured id, so it must be the record just read
        if let Some(id) = record.id
            && id != config.record_id
        {
            return Err(crate::Error::RecordIdMismatch {
                hostname: config.target_hostname,
                listed: id,
                configured: config.record_id,
            });
        }

        // Exact string comparison; addresses are opaque text
        if record.content == current {
            let outcome = Outcome::Unchanged {
                hostname: config.target_hostname,
                address: current,
            };
            debug!("Run phase: {}", Phase::NoOpDone);
            info!("{}", outcome);
            return Ok(outcome);
        }

        let request = UpdateRequest::a_record(config.target_hostname.clone(), current.clone());

        if self.dry_run {
            info!(
                "[DRY-RUN] Would send update for record {} in zone {} with payload: {}",
                config.record_id,
                config.zone_id,
                serde_json::to_string(&request)?
            );
            let outcome = Outcome::DryRun {
                hostname: config.target_hostname,
                previous: record.content,
                current,
            };
            debug!("Run phase: {}", Phase::UpdateDone);
            info!("{}", outcome);
            return Ok(outcome);
        }

        info!(
            "Updating {} -> {} (was: {})",
            config.target_hostname, current, record.content
        );
        provider
            .update_record(&config.zone_id, &config.record_id, &request)
            .await?;

        let outcome = Outcome::Updated {
            hostname: config.target_hostname,
            previous: record.content,
            current,
        };
        debug!("Run phase: {}", Phase::UpdateDone);
        info!("{}", outcome);
        Ok(outcome)
    }

    async fn resolve_current_address(&self) -> Result<String> {
        let address = self.ip_resolver.resolve_current_ip().await?;

        if address.is_empty() {
            return Err(crate::Error::resolve(format!(
                "{} returned an empty address",
                self.ip_resolver.resolver_name()
            )));
        }

        Ok(address)
    }
}
