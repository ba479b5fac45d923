//! Observable session state.
//!
//! [`SessionState`] is the read model presentation code consumes. It is
//! rebuilt from the connection manager, reconciler and presence tracker by
//! [`crate::Session::snapshot`] and never edited in place.

use std::fmt;

use murmur_proto::{Message, MessageId, User, UserId};

/// Connection status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ConnectionStatus {
    /// No connection. Initial state, and the state after any teardown.
    #[default]
    Disconnected,
    /// Transport opening or handshake awaiting acknowledgment.
    Connecting,
    /// Handshake acknowledged.
    Connected,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        };
        f.write_str(s)
    }
}

/// Snapshot of everything presentation may render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Connection status.
    pub status: ConnectionStatus,
    /// Our server-assigned id. `None` until the handshake is acknowledged.
    pub user_id: Option<UserId>,
    /// Merged transcript, in display order.
    pub messages: Vec<Message>,
    /// Present users, in join order.
    pub roster: Vec<User>,
    /// Users currently typing, in the order they started.
    pub typing: Vec<UserId>,
}

impl SessionState {
    /// Whether sending is currently possible.
    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected
    }

    /// Look up a present user.
    pub fn user(&self, user_id: UserId) -> Option<&User> {
        self.roster.iter().find(|u| u.id == user_id)
    }

    /// Display names of typing users.
    pub fn typing_names(&self) -> Vec<&str> {
        self.typing
            .iter()
            .filter_map(|id| self.user(*id))
            .map(|u| u.display_name.as_str())
            .collect()
    }

    /// Transcript ids in display order.
    pub fn message_ids(&self) -> Vec<MessageId> {
        self.messages.iter().map(|m| m.id).collect()
    }

    /// Whether nothing session-scoped remains.
    pub fn is_reset(&self) -> bool {
        self.status == ConnectionStatus::Disconnected
            && self.user_id.is_none()
            && self.messages.is_empty()
            && self.roster.is_empty()
            && self.typing.is_empty()
    }
}
