//! Naive reference transcript.

use murmur_core::{Message, MessageId};

/// Transcript kept as a plain vector; duplicates found by linear scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelTranscript {
    messages: Vec<Message>,
}

impl ModelTranscript {
    /// Empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `message` unless its id is already present.
    pub fn deliver(&mut self, message: Message) -> bool {
        if self.messages.iter().any(|m| m.id == message.id) {
            return false;
        }
        self.messages.push(message);
        true
    }

    /// Deliver each message in order.
    pub fn deliver_all(&mut self, messages: impl IntoIterator<Item = Message>) {
        for message in messages {
            self.deliver(message);
        }
    }

    /// Ids in display order.
    pub fn ids(&self) -> Vec<MessageId> {
        self.messages.iter().map(|m| m.id).collect()
    }

    /// Messages in display order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
