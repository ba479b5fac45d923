//! Murmur wire protocol.
//!
//! Types exchanged with the chat server and the history endpoint, plus the
//! codecs used to move them across the wire.
//!
//! # Components
//!
//! - [`Message`], [`User`], [`MessageKind`]: data model shared by every layer
//! - [`ServerEvent`]: inbound events on the persistent connection
//! - [`ClientCommand`]: outbound commands on the persistent connection
//! - [`HistoryBatch`]: decoded result of the one-shot history fetch
//!
//! Live events travel as CBOR in binary frames or JSON in text frames. Both
//! encodings share the same adjacently tagged serde representation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod codec;
pub mod errors;
mod event;
mod message;

pub use codec::{MAX_HISTORY_SIZE, MAX_PAYLOAD_SIZE};
pub use errors::{ProtocolError, Result};
pub use event::{ClientCommand, ServerEvent};
pub use message::{HistoryBatch, Message, MessageId, MessageKind, User, UserId};
