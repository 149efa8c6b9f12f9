//! Test doubles and common utilities for reconciler contract tests
//!
//! Every double counts its calls so tests can assert which collaborators a
//! run reached. Doubles built with `sharing_counters_with` observe the same
//! counters, which lets a test keep a handle after boxing one into the
//! reconciler.

#![allow(dead_code)]

use ipsync_core::config::Configuration;
use ipsync_core::error::{Error, Result};
use ipsync_core::traits::{
    DnsProvider, DnsProviderFactory, DnsRecord, IpResolver, SecretProvider, UpdateRequest,
};
use ipsync_core::{Reconciler, SecretNames};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const ZONE_ID: &str = "zone-123";
pub const RECORD_ID: &str = "record-456";
pub const API_TOKEN: &str = "test-token";
pub const HOSTNAME: &str = "vm.example.com";

/// A secret provider that counts lookups and can fail selected names
pub struct CountingSecretProvider {
    values: HashMap<String, String>,
    failing: HashSet<String>,
    call_count: Arc<AtomicUsize>,
}

impl CountingSecretProvider {
    /// A provider holding all four default secrets
    pub fn complete() -> Self {
        let names = SecretNames::new();
        let values = HashMap::from([
            (names.zone_id, ZONE_ID.to_string()),
            (names.record_id, RECORD_ID.to_string()),
            (names.api_token, API_TOKEN.to_string()),
            (names.hostname, HOSTNAME.to_string()),
        ]);

        Self {
            values,
            failing: HashSet::new(),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Make lookups of `name` fail with a secret error
    pub fn failing_on(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }

    /// Replace the value of `name`
    pub fn with_value(mut self, name: &str, value: &str) -> Self {
        self.values.insert(name.to_string(), value.to_string());
        self
    }

    /// Get the number of lookups made
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SecretProvider for CountingSecretProvider {
    async fn get_secret(&self, name: &str) -> Result<String> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        if self.failing.contains(name) {
            return Err(Error::secret(format!("access denied for {}", name)));
        }

        self.values
            .get(name)
            .cloned()
            .ok_or_else(|| Error::secret(format!("{} not found", name)))
    }

    fn backend_name(&self) -> &'static str {
        "counting"
    }
}

/// An IP resolver returning a fixed address or a fixed HTTP failure
pub struct StaticIpResolver {
    response: std::result::Result<String, u16>,
    call_count: Arc<AtomicUsize>,
}

impl StaticIpResolver {
    /// Resolver answering `address`
    pub fn answering(address: &str) -> Self {
        Self {
            response: Ok(address.to_string()),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Resolver failing with HTTP `status`
    pub fn failing_with(status: u16) -> Self {
        Self {
            response: Err(status),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get the number of lookups made
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Create a resolver that shares counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            response: other.response.clone(),
            call_count: Arc::clone(&other.call_count),
        }
    }
}

#[async_trait::async_trait]
impl IpResolver for StaticIpResolver {
    async fn resolve_current_ip(&self) -> Result<String> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        match &self.response {
            Ok(address) => Ok(address.clone()),
            Err(status) => Err(Error::resolve_status(*status, "resolver unavailable")),
        }
    }

    fn resolver_name(&self) -> &'static str {
        "static"
    }
}

/// Shared state behind the mock DNS provider
///
/// Successful updates rewrite the content of the matching record, so a
/// second run against the same state observes the first run's write.
#[derive(Clone)]
pub struct MockDnsState {
    records: Arc<Mutex<Vec<DnsRecord>>>,
    list_failure: Arc<Mutex<Option<u16>>>,
    update_failure: Arc<Mutex<Option<u16>>>,
    list_call_count: Arc<AtomicUsize>,
    update_call_count: Arc<AtomicUsize>,
    create_call_count: Arc<AtomicUsize>,
    updates: Arc<Mutex<Vec<(String, String, UpdateRequest)>>>,
}

impl MockDnsState {
    /// State publishing `records`
    pub fn with_records(records: Vec<DnsRecord>) -> Self {
        Self {
            records: Arc::new(Mutex::new(records)),
            list_failure: Arc::new(Mutex::new(None)),
            update_failure: Arc::new(Mutex::new(None)),
            list_call_count: Arc::new(AtomicUsize::new(0)),
            update_call_count: Arc::new(AtomicUsize::new(0)),
            create_call_count: Arc::new(AtomicUsize::new(0)),
            updates: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// State publishing a single A record for `HOSTNAME` with `content`
    pub fn publishing(content: &str) -> Self {
        Self::with_records(vec![
            DnsRecord::new(HOSTNAME, content)
                .with_id(RECORD_ID)
                .with_type("A"),
        ])
    }

    /// Make the listing call fail with HTTP `status`
    pub fn fail_list_with(&self, status: u16) {
        *self.list_failure.lock().unwrap() = Some(status);
    }

    /// Make the update call fail with HTTP `status`
    pub fn fail_update_with(&self, status: u16) {
        *self.update_failure.lock().unwrap() = Some(status);
    }

    pub fn list_call_count(&self) -> usize {
        self.list_call_count.load(Ordering::SeqCst)
    }

    pub fn update_call_count(&self) -> usize {
        self.update_call_count.load(Ordering::SeqCst)
    }

    /// Get the number of provider clients built
    pub fn create_call_count(&self) -> usize {
        self.create_call_count.load(Ordering::SeqCst)
    }

    /// Total calls that reached the provider, listing and updates
    pub fn total_calls(&self) -> usize {
        self.list_call_count() + self.update_call_count()
    }

    /// Updates received as (zone_id, record_id, request)
    pub fn updates(&self) -> Vec<(String, String, UpdateRequest)> {
        self.updates.lock().unwrap().clone()
    }

    /// Content currently published for `HOSTNAME`
    pub fn published_content(&self) -> Option<String> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.name == HOSTNAME)
            .map(|r| r.content.clone())
    }
}

/// A mock DnsProvider backed by `MockDnsState`
pub struct MockDnsProvider {
    state: MockDnsState,
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn list_records(&self, _zone_id: &str, _hostname: &str) -> Result<Vec<DnsRecord>> {
        self.state.list_call_count.fetch_add(1, Ordering::SeqCst);

        if let Some(status) = *self.state.list_failure.lock().unwrap() {
            return Err(Error::list_status(status, "listing rejected"));
        }

        Ok(self.state.records.lock().unwrap().clone())
    }

    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        request: &UpdateRequest,
    ) -> Result<()> {
        self.state.update_call_count.fetch_add(1, Ordering::SeqCst);
        self.state.updates.lock().unwrap().push((
            zone_id.to_string(),
            record_id.to_string(),
            request.clone(),
        ));

        if let Some(status) = *self.state.update_failure.lock().unwrap() {
            return Err(Error::update_status(status, "update rejected"));
        }

        for record in self.state.records.lock().unwrap().iter_mut() {
            if record.name == request.name {
                record.content = request.content.clone();
            }
        }

        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Factory handing out `MockDnsProvider`s over one shared state
pub struct MockProviderFactory {
    state: MockDnsState,
    seen_tokens: Arc<Mutex<Vec<String>>>,
}

impl MockProviderFactory {
    pub fn new(state: &MockDnsState) -> Self {
        Self {
            state: state.clone(),
            seen_tokens: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// API tokens the factory was asked to build clients for
    pub fn seen_tokens(&self) -> Vec<String> {
        self.seen_tokens.lock().unwrap().clone()
    }

    /// Create a factory that shares state and counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            state: other.state.clone(),
            seen_tokens: Arc::clone(&other.seen_tokens),
        }
    }
}

impl DnsProviderFactory for MockProviderFactory {
    fn create(&self, config: &Configuration) -> Result<Box<dyn DnsProvider>> {
        self.state.create_call_count.fetch_add(1, Ordering::SeqCst);
        self.seen_tokens
            .lock()
            .unwrap()
            .push(config.api_token.clone());

        Ok(Box::new(MockDnsProvider {
            state: self.state.clone(),
        }))
    }
}

/// Helper to build a reconciler from the standard doubles
pub fn reconciler(
    secrets: CountingSecretProvider,
    resolver: StaticIpResolver,
    state: &MockDnsState,
) -> Reconciler {
    Reconciler::new(
        Box::new(secrets),
        SecretNames::new(),
        Box::new(resolver),
        Box::new(MockProviderFactory::new(state)),
    )
}
