// # Secret Provider Implementations
//
// This module provides the built-in implementations of the SecretProvider
// trait. Cloud-backed providers live in their own crates.

pub mod env;
pub mod memory;

pub use env::{DEFAULT_ENV_PREFIX, EnvSecretProvider};
pub use memory::MemorySecretProvider;
