//! Operations for model-based testing.
//!
//! Operations cover every input a session sees: user intents, server events,
//! history outcomes, transport drops and the passage of time. They are
//! generated by proptest (or `arbitrary` from seeded bytes) and applied to
//! both the model and the real session.

use std::time::Duration;

use arbitrary::Arbitrary;
use murmur_core::{
    ClientCommand, FetchError, HistoryBatch, Message, MessageId, ServerEvent, Session,
    SessionAction, SessionEvent, StatusChange, User, UserId,
};

use crate::SimInstant;

/// Compact user id; mapped into [`USER_SPACE`].
pub type ModelUserId = u8;

/// Compact message id; mapped into [`MESSAGE_SPACE`].
pub type ModelMessageId = u8;

/// Distinct users an operation can name.
pub const USER_SPACE: u8 = 6;

/// Distinct messages an operation can name.
pub const MESSAGE_SPACE: u8 = 24;

/// Id the simulated server assigns to us.
pub const OWN_USER_ID: UserId = 1000;

/// Display name used by every `Connect`.
pub const DISPLAY_NAME: &str = "alice";

/// Body used by non-blank sends.
pub const BODY: &str = "hello";

/// Real user id for a compact id.
pub fn user_id(raw: ModelUserId) -> UserId {
    u64::from(raw % USER_SPACE)
}

/// Real message id for a compact id.
pub fn message_id(raw: ModelMessageId) -> MessageId {
    u64::from(raw % MESSAGE_SPACE) + 1
}

/// User for a compact id.
pub fn user(raw: ModelUserId) -> User {
    let id = user_id(raw);
    User::new(id, format!("user{id}"))
}

/// Message for a compact id. The same id always yields the same message.
pub fn message(raw: ModelMessageId) -> Message {
    let id = message_id(raw);
    Message::broadcast(id, 500, "peer", format!("m{id}"), id * 1000)
}

/// Operations that can be applied to a session.
#[derive(Debug, Clone, PartialEq, Eq, Arbitrary)]
pub enum Operation {
    /// User connects as [`DISPLAY_NAME`].
    Connect,
    /// User disconnects.
    Disconnect,
    /// User sends a broadcast.
    SendMessage {
        /// Send a whitespace-only body instead of [`BODY`].
        blank: bool,
    },
    /// User sets their typing indicator.
    SetTyping {
        /// Indicator value.
        on: bool,
    },
    /// Server acknowledges the handshake.
    Welcome,
    /// Server delivers a live message.
    Live {
        /// Message delivered.
        id: ModelMessageId,
    },
    /// Server reports a join.
    Join {
        /// Joining user.
        user: ModelUserId,
    },
    /// Server reports a leave.
    Leave {
        /// Leaving user.
        user: ModelUserId,
    },
    /// Server reports typing started.
    TypingStarted {
        /// Typing user.
        user: ModelUserId,
    },
    /// Server reports typing stopped.
    TypingStopped {
        /// User who stopped.
        user: ModelUserId,
    },
    /// Server pushes a full roster.
    Roster {
        /// Users in the snapshot.
        users: Vec<ModelUserId>,
    },
    /// History fetch succeeds.
    HistoryLoaded {
        /// Messages in the batch, in order.
        ids: Vec<ModelMessageId>,
        /// Tag the result with the previous generation.
        stale: bool,
    },
    /// History fetch fails.
    HistoryFailed {
        /// Tag the result with the previous generation.
        stale: bool,
    },
    /// Transport drops without a disconnect.
    TransportDrop,
    /// Simulated time passes and a tick fires.
    AdvanceTime {
        /// Seconds to advance.
        secs: u8,
    },
}

impl Operation {
    /// Apply to a real session, returning the commands it transmits.
    pub fn apply(
        &self,
        session: &mut Session<SimInstant>,
        clock: &mut SimInstant,
    ) -> Vec<ClientCommand> {
        let actions = match self {
            Self::Connect => session.connect(DISPLAY_NAME, *clock),
            Self::Disconnect => session.disconnect(),
            Self::SendMessage { blank } => {
                session.send_message(if *blank { "   " } else { BODY })
            },
            Self::SetTyping { on } => session.set_typing(*on),
            Self::Welcome => session.receive(ServerEvent::Welcome { user_id: OWN_USER_ID }),
            Self::Live { id } => session.receive(ServerEvent::Message(message(*id))),
            Self::Join { user: raw } => session.receive(ServerEvent::UserJoined(user(*raw))),
            Self::Leave { user } => {
                session.receive(ServerEvent::UserLeft { user_id: user_id(*user) })
            },
            Self::TypingStarted { user } => {
                session.receive(ServerEvent::TypingStarted { user_id: user_id(*user) })
            },
            Self::TypingStopped { user } => {
                session.receive(ServerEvent::TypingStopped { user_id: user_id(*user) })
            },
            Self::Roster { users } => {
                session.receive(ServerEvent::Roster(users.iter().copied().map(user).collect()))
            },
            Self::HistoryLoaded { ids, stale } => session.handle(SessionEvent::HistoryLoaded {
                generation: tagged_generation(session.generation(), *stale),
                result: Ok(HistoryBatch::new(ids.iter().copied().map(message).collect())),
            }),
            Self::HistoryFailed { stale } => session.handle(SessionEvent::HistoryLoaded {
                generation: tagged_generation(session.generation(), *stale),
                result: Err(FetchError::Status(503)),
            }),
            Self::TransportDrop => {
                session.handle(SessionEvent::ConnectionStatusChanged(StatusChange::Lost {
                    reason: "simulated drop".into(),
                }))
            },
            Self::AdvanceTime { secs } => {
                *clock = *clock + Duration::from_secs(u64::from(*secs));
                session.handle(SessionEvent::Tick { now: *clock })
            },
        };
        sent_commands(&actions)
    }
}

/// Generation a history result is tagged with.
pub(crate) fn tagged_generation(current: u64, stale: bool) -> u64 {
    if stale { current.saturating_sub(1) } else { current }
}

/// Commands among `actions`, in order.
pub fn sent_commands(actions: &[SessionAction]) -> Vec<ClientCommand> {
    actions
        .iter()
        .filter_map(|action| match action {
            SessionAction::Send(command) => Some(command.clone()),
            _ => None,
        })
        .collect()
}
