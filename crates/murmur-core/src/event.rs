//! Session input events.
//!
//! [`SessionEvent`] is the typed input of the [`crate::Session`] reducer.
//! Events originate from three places:
//! - live server events, converted from [`ServerEvent`]
//! - the history fetch, tagged with the generation that requested it
//! - the runtime (transport drops and periodic ticks)

use std::time::Instant;

use murmur_proto::{HistoryBatch, Message, ServerEvent, User, UserId};

use crate::error::FetchError;

/// Inbound event tagged with a local sequence number.
///
/// The sequence number orders events locally (logging, diagnostics). It is
/// never used as message identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequenced<T> {
    /// Monotonically increasing, never reused within a process.
    pub seq: u64,
    /// The event as received.
    pub event: T,
}

/// Connection status transitions reported from outside the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusChange {
    /// Server acknowledged our `Authenticate`.
    Acknowledged {
        /// Id assigned to this connection.
        user_id: UserId,
    },
    /// Transport dropped without us asking.
    Lost {
        /// Transport-level description.
        reason: String,
    },
}

/// Events processed by the Session reducer.
#[derive(Debug, Clone)]
pub enum SessionEvent<I = Instant> {
    /// History fetch completed.
    HistoryLoaded {
        /// Session generation that started the fetch.
        generation: u64,
        /// Batch on success.
        result: Result<HistoryBatch, FetchError>,
    },

    /// Live message (broadcast or private).
    MessageReceived(Message),

    /// User joined.
    UserJoined(User),

    /// User left.
    UserLeft {
        /// User that left.
        user_id: UserId,
    },

    /// Typing indicator changed.
    TypingChanged {
        /// User whose indicator changed.
        user_id: UserId,
        /// New indicator value.
        typing: bool,
    },

    /// Server notice.
    SystemNotice(Message),

    /// Full roster snapshot.
    RosterReplaced(Vec<User>),

    /// Connection status changed.
    ConnectionStatusChanged(StatusChange),

    /// Periodic tick for timeout processing.
    Tick {
        /// Current time.
        now: I,
    },
}

impl<I> SessionEvent<I> {
    /// Variant name, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::HistoryLoaded { .. } => "history_loaded",
            Self::MessageReceived(_) => "message_received",
            Self::UserJoined(_) => "user_joined",
            Self::UserLeft { .. } => "user_left",
            Self::TypingChanged { .. } => "typing_changed",
            Self::SystemNotice(_) => "system_notice",
            Self::RosterReplaced(_) => "roster_replaced",
            Self::ConnectionStatusChanged(_) => "connection_status_changed",
            Self::Tick { .. } => "tick",
        }
    }
}

impl<I> From<ServerEvent> for SessionEvent<I> {
    fn from(event: ServerEvent) -> Self {
        match event {
            ServerEvent::Welcome { user_id } => {
                Self::ConnectionStatusChanged(StatusChange::Acknowledged { user_id })
            },
            ServerEvent::Message(message) => Self::MessageReceived(message),
            ServerEvent::UserJoined(user) => Self::UserJoined(user),
            ServerEvent::UserLeft { user_id } => Self::UserLeft { user_id },
            ServerEvent::TypingStarted { user_id } => Self::TypingChanged { user_id, typing: true },
            ServerEvent::TypingStopped { user_id } => {
                Self::TypingChanged { user_id, typing: false }
            },
            ServerEvent::SystemNotice(message) => Self::SystemNotice(message),
            ServerEvent::Roster(users) => Self::RosterReplaced(users),
        }
    }
}
