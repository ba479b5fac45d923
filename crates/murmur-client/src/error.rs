//! Runtime and transport errors.

use murmur_proto::ProtocolError;
use thiserror::Error;

/// Transport failures. Never fatal: the runtime turns them into a connection
/// drop and the session recovers with a fresh `connect`.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection could not be established.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Write to an open connection failed.
    #[error("send failed: {0}")]
    Send(String),

    /// Operation needs an open connection.
    #[error("connection is not open")]
    NotOpen,

    /// Payload could not be encoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

/// Failures of the runtime itself.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The runtime task has stopped; the handle can no longer reach it.
    #[error("session runtime has stopped")]
    Stopped,
}
