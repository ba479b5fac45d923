//! Live transport events.
//!
//! [`ServerEvent`] flows from server to client, [`ClientCommand`] from client
//! to server. Both use an adjacently tagged representation:
//!
//! ```text
//! {"type": "user_joined", "data": {"id": 7, "displayName": "alice"}}
//! {"type": "typing_started", "data": {"userId": 7}}
//! ```
//!
//! Event type tags are snake_case; every field name on the wire, in events
//! and in the history body alike, is camelCase.

use serde::{Deserialize, Serialize};

use crate::message::{Message, User, UserId};

/// Events the server pushes over the persistent connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "data",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    /// Handshake acknowledgment for `Authenticate`.
    Welcome {
        /// Identifier the server assigned to this connection.
        user_id: UserId,
    },

    /// Broadcast or private message, including echoes of our own sends.
    Message(Message),

    /// A user connected.
    UserJoined(User),

    /// A user disconnected.
    UserLeft {
        /// User that left.
        user_id: UserId,
    },

    /// A user started typing.
    TypingStarted {
        /// User that is typing.
        user_id: UserId,
    },

    /// A user stopped typing.
    TypingStopped {
        /// User that stopped typing.
        user_id: UserId,
    },

    /// Server-generated notice, delivered as a [`crate::MessageKind::System`]
    /// message.
    SystemNotice(Message),

    /// Full roster snapshot. Sent after `Welcome` and whenever the server
    /// chooses to resynchronize presence.
    Roster(Vec<User>),
}

impl ServerEvent {
    /// Short event name for logging.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Welcome { .. } => "welcome",
            Self::Message(_) => "message",
            Self::UserJoined(_) => "user_joined",
            Self::UserLeft { .. } => "user_left",
            Self::TypingStarted { .. } => "typing_started",
            Self::TypingStopped { .. } => "typing_stopped",
            Self::SystemNotice(_) => "system_notice",
            Self::Roster(_) => "roster",
        }
    }
}

/// Commands the client sends over the persistent connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "data",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum ClientCommand {
    /// Authenticate with a display name. Must be the first command.
    Authenticate {
        /// Trimmed, non-empty display name.
        display_name: String,
    },

    /// Send a message to every present user.
    SendBroadcast {
        /// Trimmed, non-empty body.
        body: String,
    },

    /// Send a message to a single user.
    SendPrivate {
        /// Recipient, present in the roster at send time.
        recipient_id: UserId,
        /// Trimmed, non-empty body.
        body: String,
    },

    /// Own typing indicator.
    Typing {
        /// Whether we are composing a message.
        is_typing: bool,
    },

    /// Graceful leave before closing the connection.
    Leave,
}

impl ClientCommand {
    /// Short command name for logging.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Authenticate { .. } => "authenticate",
            Self::SendBroadcast { .. } => "send_broadcast",
            Self::SendPrivate { .. } => "send_private",
            Self::Typing { .. } => "typing",
            Self::Leave => "leave",
        }
    }
}
