//! Transcript reconciliation.
//!
//! The [`Reconciler`] merges two independently arriving sources, the one-shot
//! [`HistoryBatch`] and the live message stream, into one ordered,
//! duplicate-free transcript.
//!
//! # Invariants
//!
//! - Identity: at most one entry per [`MessageId`]. The first delivered copy
//!   wins; later copies are dropped whichever source they come from.
//! - Placement: entries appear in insertion order. History keeps its fetched
//!   order, live messages keep arrival order. Timestamps are never used to
//!   reorder.
//! - Index consistency: `order` and `by_id` always hold the same id set.

use std::collections::HashMap;

use murmur_proto::{HistoryBatch, Message, MessageId};

/// Counts from merging a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Entries appended to the transcript.
    pub inserted: usize,
    /// Entries dropped because their id was already present.
    pub duplicates: usize,
}

impl MergeOutcome {
    /// Whether the merge changed the transcript.
    pub fn changed(&self) -> bool {
        self.inserted > 0
    }
}

/// Id-keyed transcript with a separate display order.
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    by_id: HashMap<MessageId, Message>,
    order: Vec<MessageId>,
    history_loaded: bool,
}

impl Reconciler {
    /// Create an empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append every history entry whose id is not already present.
    ///
    /// Marks history as loaded even when the batch is empty.
    pub fn merge_history(&mut self, batch: HistoryBatch) -> MergeOutcome {
        self.history_loaded = true;

        let mut outcome = MergeOutcome::default();
        for message in batch.into_messages() {
            if self.insert(message) {
                outcome.inserted += 1;
            } else {
                outcome.duplicates += 1;
            }
        }
        outcome
    }

    /// Append a live message unless its id is already present.
    ///
    /// Returns `true` if the transcript changed.
    pub fn merge_live(&mut self, message: Message) -> bool {
        self.insert(message)
    }

    /// Mark the history source as settled without any messages (fetch
    /// failure). The session ignores any later history result for the same
    /// connection until [`Reconciler::clear`] resets it.
    pub fn mark_history_failed(&mut self) {
        self.history_loaded = true;
    }

    /// Whether the history source has settled for this session.
    pub fn history_loaded(&self) -> bool {
        self.history_loaded
    }

    /// Whether a message with this id is in the transcript.
    pub fn contains(&self, id: MessageId) -> bool {
        self.by_id.contains_key(&id)
    }

    /// Look up a message by id.
    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.by_id.get(&id)
    }

    /// Messages in display order.
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.order.iter().filter_map(|id| self.by_id.get(id))
    }

    /// Ids in display order.
    pub fn ids(&self) -> &[MessageId] {
        &self.order
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the transcript is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Drop everything, including the history-loaded flag.
    pub fn clear(&mut self) {
        self.by_id.clear();
        self.order.clear();
        self.history_loaded = false;
    }

    fn insert(&mut self, message: Message) -> bool {
        if self.by_id.contains_key(&message.id) {
            tracing::trace!(id = message.id, "dropping duplicate message");
            return false;
        }
        self.order.push(message.id);
        self.by_id.insert(message.id, message);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(id: MessageId) -> Message {
        Message::broadcast(id, 1, "alice", format!("m{id}"), id * 10)
    }

    #[test]
    fn history_then_live_duplicate_collapses() {
        let mut log = Reconciler::new();

        log.merge_history(HistoryBatch::new(vec![msg(1)]));
        assert!(!log.merge_live(msg(1)));
        assert!(log.merge_live(msg(2)));

        assert_eq!(log.ids(), &[1, 2]);
    }

    #[test]
    fn live_then_history_duplicate_collapses() {
        let mut log = Reconciler::new();

        log.merge_live(msg(2));
        let outcome = log.merge_history(HistoryBatch::new(vec![msg(1), msg(2)]));

        assert_eq!(outcome, MergeOutcome { inserted: 1, duplicates: 1 });
        assert_eq!(log.ids(), &[2, 1]);
    }

    #[test]
    fn first_copy_wins() {
        let mut log = Reconciler::new();
        log.merge_live(msg(1));

        let mut edited = msg(1);
        edited.body = "rewritten".into();
        log.merge_live(edited);

        assert_eq!(log.get(1).map(|m| m.body.as_str()), Some("m1"));
    }

    #[test]
    fn timestamps_do_not_reorder() {
        let mut log = Reconciler::new();
        log.merge_live(Message::broadcast(1, 1, "a", "late", 900));
        log.merge_live(Message::broadcast(2, 1, "a", "early", 100));

        assert_eq!(log.ids(), &[1, 2]);
    }

    #[test]
    fn duplicates_inside_history_collapse() {
        let mut log = Reconciler::new();
        let outcome = log.merge_history(HistoryBatch::new(vec![msg(1), msg(1), msg(3)]));

        assert_eq!(outcome, MergeOutcome { inserted: 2, duplicates: 1 });
        assert_eq!(log.ids(), &[1, 3]);
    }

    #[test]
    fn clear_resets_history_flag() {
        let mut log = Reconciler::new();
        log.merge_history(HistoryBatch::default());
        assert!(log.history_loaded());

        log.clear();
        assert!(!log.history_loaded());
        assert!(log.is_empty());
    }
}
