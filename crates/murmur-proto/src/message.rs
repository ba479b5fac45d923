//! Chat data model.
//!
//! A [`Message`] is identified solely by its server-assigned [`MessageId`].
//! The same message may reach the client twice (once through the history
//! fetch and once through the live stream); both copies carry the same id and
//! describe the same logical message.

use serde::{Deserialize, Serialize};

use crate::errors::{ProtocolError, Result};

/// Server-assigned message identifier. Stable across delivery paths.
pub type MessageId = u64;

/// Server-assigned user identifier. Unique per connection.
pub type UserId = u64;

/// Who can see a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Visible to every present user.
    Broadcast,
    /// Visible to the sender and the designated recipient only.
    Private,
    /// Server-generated notice (joins, leaves, announcements).
    System,
}

/// A chat message.
///
/// Field names follow the history endpoint's camelCase JSON. Fields the
/// server omits for system notices (sender id and name) default to zero and
/// the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique message identifier.
    pub id: MessageId,
    /// Sender's user identifier.
    #[serde(default)]
    pub sender_id: UserId,
    /// Sender's display name at send time.
    #[serde(default)]
    pub sender_name: String,
    /// Message text.
    pub body: String,
    /// Logical send time in Unix milliseconds. Informational only; never used
    /// for ordering.
    pub timestamp: u64,
    /// Visibility class.
    pub kind: MessageKind,
    /// Recipient for [`MessageKind::Private`]. `None` otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_id: Option<UserId>,
}

impl Message {
    /// Create a broadcast message.
    pub fn broadcast(
        id: MessageId,
        sender_id: UserId,
        sender_name: impl Into<String>,
        body: impl Into<String>,
        timestamp: u64,
    ) -> Self {
        Self {
            id,
            sender_id,
            sender_name: sender_name.into(),
            body: body.into(),
            timestamp,
            kind: MessageKind::Broadcast,
            recipient_id: None,
        }
    }

    /// Create a private message addressed to `recipient_id`.
    pub fn private(
        id: MessageId,
        sender_id: UserId,
        sender_name: impl Into<String>,
        recipient_id: UserId,
        body: impl Into<String>,
        timestamp: u64,
    ) -> Self {
        Self {
            id,
            sender_id,
            sender_name: sender_name.into(),
            body: body.into(),
            timestamp,
            kind: MessageKind::Private,
            recipient_id: Some(recipient_id),
        }
    }

    /// Create a system notice.
    pub fn system(id: MessageId, body: impl Into<String>, timestamp: u64) -> Self {
        Self {
            id,
            sender_id: 0,
            sender_name: String::new(),
            body: body.into(),
            timestamp,
            kind: MessageKind::System,
            recipient_id: None,
        }
    }

    /// Whether this is a server-generated notice.
    pub fn is_system(&self) -> bool {
        self.kind == MessageKind::System
    }
}

/// A connected user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier for this connection.
    pub id: UserId,
    /// Name chosen at authentication.
    pub display_name: String,
}

impl User {
    /// Create a user.
    pub fn new(id: UserId, display_name: impl Into<String>) -> Self {
        Self { id, display_name: display_name.into() }
    }
}

/// Result of the one-shot history fetch.
///
/// Entries are kept in the order the endpoint returned them, which is assumed
/// to be chronological.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryBatch {
    messages: Vec<Message>,
}

impl HistoryBatch {
    /// Wrap already-decoded messages.
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    /// Decode the JSON array served by the history endpoint.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::PayloadTooLarge` if `bytes` exceeds
    ///   [`crate::MAX_HISTORY_SIZE`]
    /// - `ProtocolError::JsonDecode` if the body is not an array of messages
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        crate::codec::check_limit(bytes, crate::codec::MAX_HISTORY_SIZE)?;
        serde_json::from_slice(bytes).map_err(|e| ProtocolError::JsonDecode(e.to_string()))
    }

    /// Messages in delivery order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages in the batch.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the batch holds no messages.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Consume the batch, yielding messages in delivery order.
    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_decodes_camel_case_fields() {
        let json = br#"[
            {"id": 1, "senderId": 7, "senderName": "alice", "body": "hi",
             "timestamp": 1700000000000, "kind": "broadcast"},
            {"id": 2, "senderId": 8, "senderName": "bob", "body": "psst",
             "timestamp": 1700000000500, "kind": "private", "recipientId": 7}
        ]"#;

        let batch = HistoryBatch::from_json(json).unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.messages()[0], Message::broadcast(1, 7, "alice", "hi", 1_700_000_000_000));
        assert_eq!(batch.messages()[1].recipient_id, Some(7));
        assert_eq!(batch.messages()[1].kind, MessageKind::Private);
    }

    #[test]
    fn history_system_notice_without_sender() {
        let json = br#"[{"id": 3, "body": "bob joined", "timestamp": 5, "kind": "system"}]"#;

        let batch = HistoryBatch::from_json(json).unwrap();

        assert_eq!(batch.into_messages(), vec![Message::system(3, "bob joined", 5)]);
    }

    #[test]
    fn history_ignores_unknown_fields() {
        let json = br#"[{"id": 4, "body": "x", "timestamp": 1, "kind": "broadcast", "extra": true}]"#;
        assert_eq!(HistoryBatch::from_json(json).map(|b| b.len()), Ok(1));
    }

    #[test]
    fn history_larger_than_event_limit_decodes() {
        let messages: Vec<Message> = (1..=20_000)
            .map(|id| Message::broadcast(id, 7, "alice", "a reasonably chatty line", id))
            .collect();
        let body = serde_json::to_vec(&HistoryBatch::new(messages)).unwrap();
        assert!(body.len() > crate::MAX_PAYLOAD_SIZE);

        let batch = HistoryBatch::from_json(&body).unwrap();

        assert_eq!(batch.len(), 20_000);
        assert_eq!(batch.messages().last().map(|m| m.id), Some(20_000));
    }

    #[test]
    fn history_over_its_own_limit_is_rejected() {
        let body = vec![b' '; crate::MAX_HISTORY_SIZE + 1];
        assert!(matches!(
            HistoryBatch::from_json(&body),
            Err(ProtocolError::PayloadTooLarge { max, .. }) if max == crate::MAX_HISTORY_SIZE
        ));
    }

    #[test]
    fn history_rejects_non_array() {
        let result = HistoryBatch::from_json(br#"{"error": "nope"}"#);
        assert!(matches!(result, Err(ProtocolError::JsonDecode(_))));
    }

    #[test]
    fn history_rejects_unknown_kind() {
        let json = br#"[{"id": 1, "body": "x", "timestamp": 1, "kind": "shout"}]"#;
        assert!(matches!(HistoryBatch::from_json(json), Err(ProtocolError::JsonDecode(_))));
    }
}
