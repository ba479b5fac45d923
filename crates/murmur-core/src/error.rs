//! Error types for the session core.
//!
//! Neither error here is fatal. [`ValidationError`] rejects an intent at the
//! call site before anything is transmitted; [`FetchError`] degrades the
//! session to a live-only transcript.

use murmur_proto::{ProtocolError, UserId};
use thiserror::Error;

use crate::state::ConnectionStatus;

/// Reasons a session operation was rejected without side effects.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Display name is empty after trimming.
    #[error("display name is empty")]
    EmptyDisplayName,

    /// Message body is empty after trimming.
    #[error("message body is empty")]
    EmptyBody,

    /// Operation requires an acknowledged connection.
    #[error("cannot {operation} while {status}")]
    NotConnected {
        /// Status when the operation was attempted.
        status: ConnectionStatus,
        /// Operation that was attempted.
        operation: &'static str,
    },

    /// `connect` called while a connection is already open or opening.
    #[error("connect ignored: already {status}")]
    AlreadyActive {
        /// Status when `connect` was attempted.
        status: ConnectionStatus,
    },

    /// Private message recipient is not in the roster.
    #[error("recipient {recipient_id} is not present")]
    UnknownRecipient {
        /// Requested recipient.
        recipient_id: UserId,
    },
}

/// History fetch failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Endpoint answered with a non-success status.
    #[error("history endpoint returned status {0}")]
    Status(u16),

    /// Request could not be completed.
    #[error("history transport error: {0}")]
    Transport(String),

    /// Request did not complete in time.
    #[error("history request timed out")]
    Timeout,

    /// Response body was not a message array.
    #[error("history decode error: {0}")]
    Decode(String),
}

impl From<ProtocolError> for FetchError {
    fn from(err: ProtocolError) -> Self {
        Self::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_connected_message_names_operation() {
        let err = ValidationError::NotConnected {
            status: ConnectionStatus::Connecting,
            operation: "send message",
        };
        assert_eq!(err.to_string(), "cannot send message while connecting");
    }

    #[test]
    fn protocol_error_maps_to_decode() {
        let err: FetchError = ProtocolError::JsonDecode("eof".into()).into();
        assert!(matches!(err, FetchError::Decode(_)));
    }
}
