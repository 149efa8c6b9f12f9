//! Core traits for the reconciler
//!
//! This module defines the abstract interfaces of the three collaborators.
//!
//! - [`SecretProvider`]: Configuration values by name
//! - [`IpResolver`]: The host's current public address
//! - [`DnsProvider`]: List and update records via a provider API

pub mod dns_provider;
pub mod ip_resolver;
pub mod secret_provider;

pub use dns_provider::{
    AUTOMATIC_TTL, DnsProvider, DnsProviderFactory, DnsRecord, RecordLookup, RecordType,
    UpdateRequest,
};
pub use ip_resolver::IpResolver;
pub use secret_provider::SecretProvider;
