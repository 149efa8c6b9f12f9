// # ipsync-core
//
// Core library for the one-shot DNS address reconciler.
//
// ## Architecture Overview
//
// This library provides the core functionality for keeping one A record in
// line with the host's public address:
// - **SecretProvider**: Trait for fetching configuration values by name
// - **IpResolver**: Trait for discovering the current public address
// - **DnsProvider**: Trait for listing and updating records via provider APIs
// - **Configuration**: The four values a run needs, loaded once
// - **Reconciler**: Orchestrates load → resolve → list → compare → update
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from implementations
// 2. **One Pass**: A run is a linear pipeline; each failure ends it
// 3. **Library-First**: All core functionality can be used as a library
// 4. **Idempotency**: The write happens only when the record differs

pub mod traits;
pub mod engine;
pub mod config;
pub mod error;
pub mod secrets;

// Re-export core types for convenience
pub use traits::{
    DnsProvider, DnsProviderFactory, DnsRecord, IpResolver, RecordLookup, SecretProvider,
    UpdateRequest,
};
pub use engine::{Outcome, Phase, Reconciler};
pub use config::{Configuration, SecretNames};
pub use error::{Error, Result};
pub use secrets::{EnvSecretProvider, MemorySecretProvider};
