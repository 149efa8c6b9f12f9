//! Error types for the reconciler
//!
//! Every variant is fatal to a run. The variants map one-to-one onto the
//! step that failed, so the message alone is enough to tell where a run
//! stopped and, for HTTP failures, which status code the remote returned.

use thiserror::Error;

/// Result type alias for reconciler operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    /// A required configuration secret could not be retrieved or was empty
    #[error("Configuration error: {0}")]
    Config(String),

    /// A secret provider failed to return a value
    #[error("Secret provider error: {0}")]
    Secret(String),

    /// The public IP lookup failed
    #[error("IP resolution failed{}: {message}", status_label(.status))]
    Resolve {
        /// HTTP status returned by the resolver, if a response was received
        status: Option<u16>,
        /// Error message
        message: String,
    },

    /// The DNS record listing failed
    #[error("DNS record listing failed{}: {message}", status_label(.status))]
    List {
        /// HTTP status returned by the provider, if a response was received
        status: Option<u16>,
        /// Error message
        message: String,
    },

    /// The listing succeeded but no record carries the target hostname
    #[error("No A record named '{hostname}' found in zone")]
    NoMatchingRecord {
        /// Hostname that was looked up
        hostname: String,
    },

    /// The listing returned more than one A record for the target hostname
    #[error("Found {count} A records named '{hostname}'; refusing to pick one")]
    AmbiguousRecord {
        /// Hostname that was looked up
        hostname: String,
        /// Number of matching records
        count: usize,
    },

    /// The record listed for the hostname is not the configured record
    #[error(
        "A record '{hostname}' has id '{listed}' but the configured record id is '{configured}'; refusing to update"
    )]
    RecordIdMismatch {
        /// Hostname that was looked up
        hostname: String,
        /// Id reported by the listing
        listed: String,
        /// Id from the configuration
        configured: String,
    },

    /// The DNS record update failed
    #[error("DNS record update failed{}: {message}", status_label(.status))]
    Update {
        /// HTTP status returned by the provider, if a response was received
        status: Option<u16>,
        /// Error message
        message: String,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

fn status_label(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (HTTP {})", code),
        None => String::new(),
    }
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a secret provider error
    pub fn secret(msg: impl Into<String>) -> Self {
        Self::Secret(msg.into())
    }

    /// Create a resolver error for a non-200 response
    pub fn resolve_status(status: u16, msg: impl Into<String>) -> Self {
        Self::Resolve {
            status: Some(status),
            message: msg.into(),
        }
    }

    /// Create a resolver error that happened before a response arrived
    pub fn resolve(msg: impl Into<String>) -> Self {
        Self::Resolve {
            status: None,
            message: msg.into(),
        }
    }

    /// Create a listing error for a non-200 response
    pub fn list_status(status: u16, msg: impl Into<String>) -> Self {
        Self::List {
            status: Some(status),
            message: msg.into(),
        }
    }

    /// Create a listing error that happened before a usable response arrived
    pub fn list(msg: impl Into<String>) -> Self {
        Self::List {
            status: None,
            message: msg.into(),
        }
    }

    /// Create an update error for a non-200 response
    pub fn update_status(status: u16, msg: impl Into<String>) -> Self {
        Self::Update {
            status: Some(status),
            message: msg.into(),
        }
    }

    /// Create an update error that happened before a response arrived
    pub fn update(msg: impl Into<String>) -> Self {
        Self::Update {
            status: None,
            message: msg.into(),
        }
    }

    /// HTTP status attached to this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Resolve { status, .. } | Self::List { status, .. } | Self::Update { status, .. } => {
                *status
            }
            _ => None,
        }
    }

    /// Whether the error happened while assembling configuration
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Secret(_))
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
