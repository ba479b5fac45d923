//! Session synchronization core.
//!
//! Pure state machines that turn connection lifecycle, live server events and
//! the one-shot history fetch into a single consistent read model. Nothing in
//! this crate performs I/O or awaits; every operation returns
//! [`SessionAction`]s for a runtime to execute, which keeps the logic
//! deterministic and directly testable.
//!
//! # Components
//!
//! - [`ConnectionManager`]: connection status, handshake, sequencing, timeout
//! - [`Reconciler`]: merges history and live messages, deduplicated by id
//! - [`Presence`]: roster and typing sets, plus our own typing indicator
//! - [`Session`]: facade composing the three and exposing [`SessionState`]

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod action;
mod connection;
mod error;
mod event;
mod presence;
mod reconciler;
mod session;
mod state;

pub use action::{SessionAction, SessionNotice};
pub use connection::{
    ConnectionAction, ConnectionManager, DEFAULT_HANDSHAKE_TIMEOUT, SessionConfig,
};
pub use error::{FetchError, ValidationError};
pub use event::{Sequenced, SessionEvent, StatusChange};
pub use murmur_proto::{
    ClientCommand, HistoryBatch, Message, MessageId, MessageKind, ServerEvent, User, UserId,
};
pub use presence::Presence;
pub use reconciler::{MergeOutcome, Reconciler};
pub use session::Session;
pub use state::{ConnectionStatus, SessionState};
