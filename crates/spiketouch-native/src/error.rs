//! Native Error Types
//!
//! Configuration, wire protocol and bridge errors using `thiserror`.
//! Numeric code in the core never fails; only these boundaries do.

use std::path::PathBuf;

use spiketouch_core::MaterialError;
use thiserror::Error;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read or written
    #[error("Failed to access config file {path}: {source}")]
    FileRead {
        /// Path that failed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid JSON for [`HapticConfig`](crate::config::HapticConfig)
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A field holds a value the engine cannot run with
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue {
        /// Dotted field path
        field: String,
        /// Why the value was rejected
        reason: String,
    },

    /// Name missing from the material table
    #[error("Unknown material: {name}")]
    UnknownMaterial {
        /// Requested name
        name: String,
    },
}

impl ConfigError {
    /// Shorthand for [`ConfigError::InvalidValue`]
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Wrap a material validation failure for the named table entry
    pub fn material(name: &str, err: &MaterialError) -> Self {
        Self::invalid_value(format!("materials.{name}"), err.to_string())
    }
}

/// Config result type
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Wire protocol error types
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Encoded command does not fit in one UDP datagram
    #[error("Payload too large: {size} bytes exceeds {max}")]
    PayloadTooLarge {
        /// Encoded size
        size: usize,
        /// Datagram limit
        max: usize,
    },

    /// Command could not be serialized
    #[error("Failed to encode command: {0}")]
    Encode(#[source] serde_json::Error),

    /// Datagram is neither a JSON command nor the legacy reset
    #[error("Failed to decode datagram: {reason}")]
    Decode {
        /// Decoder message
        reason: String,
    },

    /// Well-formed JSON with an unrecognized `command` value
    #[error("Unknown command: {0}")]
    UnknownCommand(String),
}

/// Protocol result type
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Bridge error types (network I/O, protocol, scheduler thread)
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Socket I/O error
    #[error("Network error: {0}")]
    Network(#[from] std::io::Error),

    /// Protocol error
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Scheduler thread failed
    #[error("Scheduler error: {0}")]
    Scheduler(String),
}

/// Bridge result type
pub type BridgeResult<T> = Result<T, BridgeError>;
