// # DNS Provider Trait
//
// Defines the interface for reading and writing the managed address record
// via a provider API.
//
// ## Implementations
//
// - Cloudflare: `ipsync-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use ipsync_core::{DnsProvider, RecordLookup, UpdateRequest};
//
// let records = provider.list_records(&zone_id, "host.example.com").await?;
// match RecordLookup::from_listing(records, "host.example.com") {
//     RecordLookup::Found(record) => { /* compare */ }
//     RecordLookup::NotFound | RecordLookup::Ambiguous(_) => { /* abort */ }
// }
//
// provider
//     .update_record(&zone_id, &record_id, &UpdateRequest::a_record("host.example.com", "203.0.113.9"))
//     .await?;
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// TTL value the provider interprets as "automatic"
pub const AUTOMATIC_TTL: u32 = 1;

/// A DNS record as published by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Provider-specific record identifier
    #[serde(default)]
    pub id: Option<String>,
    /// Fully qualified record name
    pub name: String,
    /// Record content (the address for A records)
    pub content: String,
    /// Record type ("A", "AAAA", ...), when the provider reports it
    #[serde(default, rename = "type")]
    pub record_type: Option<String>,
}

impl DnsRecord {
    /// Create a record with only name and content set
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            content: content.into(),
            record_type: None,
        }
    }

    /// Set the record identifier
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the record type
    pub fn with_type(mut self, record_type: impl Into<String>) -> Self {
        self.record_type = Some(record_type.into());
        self
    }

    /// Whether this record can be the managed address record for `hostname`
    ///
    /// Records without a reported type are accepted, since the listing
    /// contract only guarantees `name` and `content`.
    pub fn matches(&self, hostname: &str) -> bool {
        self.name == hostname
            && self
                .record_type
                .as_deref()
                .is_none_or(|t| t.eq_ignore_ascii_case(RecordType::A.as_str()))
    }
}

/// Result of matching a listing against the target hostname
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordLookup {
    /// Exactly one record matched
    Found(DnsRecord),
    /// No record matched
    NotFound,
    /// More than one record matched
    Ambiguous(Vec<DnsRecord>),
}

impl RecordLookup {
    /// Match a provider listing against `hostname`
    pub fn from_listing(records: Vec<DnsRecord>, hostname: &str) -> Self {
        let mut matching: Vec<DnsRecord> = records
            .into_iter()
            .filter(|record| record.matches(hostname))
            .collect();

        if matching.len() > 1 {
            return RecordLookup::Ambiguous(matching);
        }

        match matching.pop() {
            Some(record) => RecordLookup::Found(record),
            None => RecordLookup::NotFound,
        }
    }

    /// Convert into the single matching record, or the matching error kind
    pub fn into_record(self, hostname: &str) -> Result<DnsRecord, crate::Error> {
        match self {
            RecordLookup::Found(record) => Ok(record),
            RecordLookup::NotFound => Err(crate::Error::NoMatchingRecord {
                hostname: hostname.to_string(),
            }),
            RecordLookup::Ambiguous(records) => Err(crate::Error::AmbiguousRecord {
                hostname: hostname.to_string(),
                count: records.len(),
            }),
        }
    }
}

/// DNS record type written by the reconciler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordType {
    /// A record (IPv4)
    A,
}

impl RecordType {
    /// Wire name of the record type
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
        }
    }
}

/// Body of a record update
///
/// Serializes to `{"type": "A", "name": ..., "content": ..., "ttl": 1, "proxied": false}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateRequest {
    /// Record type
    #[serde(rename = "type")]
    pub record_type: RecordType,
    /// Record name (the target hostname)
    pub name: String,
    /// New record content (the current address)
    pub content: String,
    /// Time-to-live; `AUTOMATIC_TTL` lets the provider choose
    pub ttl: u32,
    /// Whether the provider should proxy traffic for this record
    pub proxied: bool,
}

impl UpdateRequest {
    /// Build the A record update the reconciler sends
    pub fn a_record(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            record_type: RecordType::A,
            name: name.into(),
            content: content.into(),
            ttl: AUTOMATIC_TTL,
            proxied: false,
        }
    }
}

/// Trait for DNS provider implementations
///
/// Providers are stateless and single-shot: one HTTP request per call, no
/// retry, no caching. Deciding whether an update is needed belongs to the
/// `Reconciler`.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// List the records of `zone_id` named `hostname`
    ///
    /// The provider may pre-filter server-side; callers still match the
    /// result client-side with [`RecordLookup::from_listing`].
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<DnsRecord>)`: The records in the listing response
    /// - `Err(Error::List)`: If the request failed or returned non-200
    async fn list_records(
        &self,
        zone_id: &str,
        hostname: &str,
    ) -> Result<Vec<DnsRecord>, crate::Error>;

    /// Replace record `record_id` in `zone_id` with `request`
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The provider accepted the update
    /// - `Err(Error::Update)`: If the request failed or returned non-200
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        request: &UpdateRequest,
    ) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing DNS providers from the loaded configuration
///
/// The provider's credentials are themselves secrets, so the client can
/// only be built once the `Configuration` has been loaded.
pub trait DnsProviderFactory: Send + Sync {
    /// Create a DnsProvider instance from configuration
    fn create(
        &self,
        config: &crate::config::Configuration,
    ) -> Result<Box<dyn DnsProvider>, crate::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_single_match() {
        let records = vec![
            DnsRecord::new("other.example.com", "198.51.100.1"),
            DnsRecord::new("host.example.com", "203.0.113.5"),
        ];

        let lookup = RecordLookup::from_listing(records, "host.example.com");
        assert_eq!(
            lookup,
            RecordLookup::Found(DnsRecord::new("host.example.com", "203.0.113.5"))
        );
    }

    #[test]
    fn test_lookup_empty_listing() {
        let lookup = RecordLookup::from_listing(Vec::new(), "host.example.com");
        assert_eq!(lookup, RecordLookup::NotFound);

        let err = lookup.into_record("host.example.com").unwrap_err();
        assert!(matches!(err, crate::Error::NoMatchingRecord { ref hostname } if hostname == "host.example.com"));
    }

    #[test]
    fn test_lookup_ambiguous() {
        let records = vec![
            DnsRecord::new("host.example.com", "203.0.113.5").with_id("a"),
            DnsRecord::new("host.example.com", "203.0.113.6").with_id("b"),
        ];

        let lookup = RecordLookup::from_listing(records, "host.example.com");
        assert!(matches!(lookup, RecordLookup::Ambiguous(ref r) if r.len() == 2));

        let err = lookup.into_record("host.example.com").unwrap_err();
        assert!(matches!(err, crate::Error::AmbiguousRecord { count: 2, .. }));
    }

    #[test]
    fn test_lookup_ignores_other_record_types() {
        let records = vec![
            DnsRecord::new("host.example.com", "2001:db8::1").with_type("AAAA"),
            DnsRecord::new("host.example.com", "203.0.113.5").with_type("A"),
        ];

        let record = RecordLookup::from_listing(records, "host.example.com")
            .into_record("host.example.com")
            .unwrap();
        assert_eq!(record.content, "203.0.113.5");
    }

    #[test]
    fn test_name_match_is_exact() {
        let record = DnsRecord::new("Host.example.com", "203.0.113.5");
        assert!(!record.matches("host.example.com"));
    }

    #[test]
    fn test_update_request_body() {
        let request = UpdateRequest::a_record("host.example.com", "203.0.113.9");
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(
            body,
            serde_json::json!({
                "type": "A",
                "name": "host.example.com",
                "content": "203.0.113.9",
                "ttl": 1,
                "proxied": false,
            })
        );
    }
}
