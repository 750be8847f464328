//! Client error types

use crate::config::ConfigError;
use thiserror::Error;

/// Client operation errors
#[derive(Error, Debug)]
pub enum ClientError {
    /// No response after the configured number of attempts
    #[error("client send failed, max retries reached: {0}")]
    RetryExhausted(u32),

    /// RADIUS packet encoding/decoding error, including rejected responses
    #[error("Packet error: {0}")]
    Packet(#[from] radius_proto::PacketError),

    /// IO error during network operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Another exchange with the same server is using this identifier
    #[error("Identifier {0} already in flight for this server")]
    IdentifierInUse(u8),

    /// The exchange was aborted by the caller
    #[error("Exchange cancelled")]
    Cancelled,

    /// Every completion handle was dropped without settling
    #[error("Exchange closed without a result")]
    Closed,
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
