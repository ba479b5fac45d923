//! Session side-effects and notices.
//!
//! [`SessionAction`] is what the [`crate::Session`] asks the runtime to do.
//! The session never performs these itself.

use murmur_proto::{ClientCommand, ServerEvent};

use crate::{connection::ConnectionAction, event::Sequenced};

/// Non-fatal conditions surfaced to presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionNotice {
    /// Transport dropped or the handshake timed out. Reconnect with a fresh
    /// `connect`.
    ConnectionLost {
        /// Transport-level description.
        reason: String,
    },
    /// History fetch failed; the transcript holds live messages only.
    HistoryUnavailable {
        /// Failure description.
        reason: String,
    },
}

/// Actions produced by the Session state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Open the persistent connection.
    OpenConnection,

    /// Transmit a command. Fire-and-forget from the session's view.
    Send(ClientCommand),

    /// Close the persistent connection.
    CloseConnection,

    /// Start the one-shot history fetch for this generation.
    FetchHistory {
        /// Generation to tag the result with.
        generation: u64,
    },

    /// Abandon any in-flight history fetch.
    CancelHistory,

    /// Observable state changed; publish a fresh snapshot.
    Publish,

    /// Surface a non-fatal condition.
    Notify(SessionNotice),

    /// Republish an accepted inbound event, in arrival order, to event
    /// subscribers.
    Inbound(Sequenced<ServerEvent>),
}

impl From<ConnectionAction> for SessionAction {
    fn from(action: ConnectionAction) -> Self {
        match action {
            ConnectionAction::Open => Self::OpenConnection,
            ConnectionAction::Send(command) => Self::Send(command),
            ConnectionAction::Close => Self::CloseConnection,
        }
    }
}
