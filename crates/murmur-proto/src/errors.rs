//! Protocol error types.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while encoding or decoding wire payloads.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// CBOR serialization failed.
    #[error("CBOR encode failed: {0}")]
    CborEncode(String),

    /// CBOR deserialization failed.
    #[error("CBOR decode failed: {0}")]
    CborDecode(String),

    /// JSON serialization failed.
    #[error("JSON encode failed: {0}")]
    JsonEncode(String),

    /// JSON deserialization failed.
    #[error("JSON decode failed: {0}")]
    JsonDecode(String),

    /// Payload exceeds the maximum accepted size.
    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge {
        /// Received payload size.
        size: usize,
        /// Maximum accepted size.
        max: usize,
    },
}
