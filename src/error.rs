//! Error types for the MAAS inventory toolkit
//!
//! Provides structured error types for the MAAS API client, the inventory
//! resolvers and the serial lifecycle orchestrator.

use thiserror::Error;

/// Unified error type for the toolkit
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // =========================================================================
    // MAAS API Errors
    // =========================================================================
    #[error("MAAS transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("MAAS authentication failed: {0}")]
    Auth(String),

    #[error("MAAS server error: {status} - {message}")]
    Server { status: u16, message: String },

    #[error("Malformed MAAS record: {0}")]
    MalformedRecord(String),

    // =========================================================================
    // Inventory Errors
    // =========================================================================
    #[error("Role {role} has no cluster fabric {fabric} on its interfaces")]
    ClusterFabricMissing { role: String, fabric: String },

    // =========================================================================
    // Lifecycle Errors
    // =========================================================================
    #[error("Node {system_id} did not reach {wanted} within {waited_secs}s (last seen: {last})")]
    LifecycleTimeout {
        system_id: String,
        wanted: String,
        last: String,
        waited_secs: u64,
    },

    #[error("Waiting for node {system_id} was cancelled")]
    Cancelled { system_id: String },

    // =========================================================================
    // SSH Errors
    // =========================================================================
    #[error("ssh-keyscan failed for {host}: {reason}")]
    SshKeyscan { host: String, reason: String },

    // =========================================================================
    // Parse Errors
    // =========================================================================
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    // =========================================================================
    // IO Errors
    // =========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Check if a later re-run of the same operation may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Transport(_) | Error::LifecycleTimeout { .. } => true,
            Error::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Check if this error means the credentials must be fixed
    pub fn is_auth(&self) -> bool {
        matches!(self, Error::Auth(_))
    }
}

/// Result type alias for the toolkit
pub type Result<T> = std::result::Result<T, Error>;
