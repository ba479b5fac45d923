//! Seeded generation of history/live interleavings.
//!
//! A generated [`Interleaving`] is a delivery schedule for one session: a
//! history batch (a contiguous run of the server log) and a sequence of live
//! deliveries that overlap it, repeat ids, and arrive before, around or after
//! the history result. The same seed always produces the same schedule.

use murmur_core::{HistoryBatch, Message, MessageId};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::ModelTranscript;

/// One delivery to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// A live message.
    Live(MessageId),
    /// The history result.
    History,
}

/// Delivery schedule for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interleaving {
    /// History batch ids, in log order.
    pub history: Vec<MessageId>,
    /// Deliveries in arrival order. `History` appears exactly once.
    pub deliveries: Vec<Delivery>,
}

impl Interleaving {
    /// History as a batch.
    pub fn batch(&self) -> HistoryBatch {
        HistoryBatch::new(self.history.iter().copied().map(log_message).collect())
    }

    /// Transcript the reference model produces for this schedule.
    pub fn expected(&self) -> Vec<MessageId> {
        let mut model = ModelTranscript::new();
        for delivery in &self.deliveries {
            match delivery {
                Delivery::Live(id) => {
                    model.deliver(log_message(*id));
                },
                Delivery::History => model.deliver_all(self.batch().into_messages()),
            }
        }
        model.ids()
    }
}

/// Message at position `id` of the simulated server log.
pub fn log_message(id: MessageId) -> Message {
    Message::broadcast(id, 7, "carol", format!("log {id}"), id * 1000)
}

/// Seeded generator.
pub struct InterleavingGenerator {
    rng: ChaCha8Rng,
    log_len: u64,
}

impl InterleavingGenerator {
    /// Generator over a server log of `log_len` messages.
    pub fn new(seed: u64, log_len: u64) -> Self {
        Self { rng: ChaCha8Rng::seed_from_u64(seed), log_len: log_len.max(1) }
    }

    /// Next schedule.
    pub fn generate(&mut self) -> Interleaving {
        // History covers the log up to a cutoff; live traffic starts somewhat
        // before the cutoff so the two overlap.
        let cutoff = self.rng.gen_range(0..=self.log_len);
        let history: Vec<MessageId> = (1..=cutoff).collect();

        let live_start = self.rng.gen_range(1..=cutoff.max(1));
        let mut deliveries: Vec<Delivery> = Vec::new();
        for id in live_start..=self.log_len {
            deliveries.push(Delivery::Live(id));
            if self.rng.gen_bool(0.2) {
                deliveries.push(Delivery::Live(id));
            }
        }

        let mut redeliveries = self.rng.gen_range(0..3);
        while redeliveries > 0 && !deliveries.is_empty() {
            let at = self.rng.gen_range(0..deliveries.len());
            let repeat = deliveries[at].clone();
            let to = self.rng.gen_range(at..=deliveries.len());
            deliveries.insert(to, repeat);
            redeliveries -= 1;
        }

        let history_at = self.rng.gen_range(0..=deliveries.len());
        deliveries.insert(history_at, Delivery::History);

        Interleaving { history, deliveries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_schedule() {
        let a = InterleavingGenerator::new(42, 10).generate();
        let b = InterleavingGenerator::new(42, 10).generate();
        assert_eq!(a, b);
    }

    #[test]
    fn history_delivered_once() {
        let mut generator = InterleavingGenerator::new(7, 12);
        for _ in 0..50 {
            let schedule = generator.generate();
            let count = schedule.deliveries.iter().filter(|d| **d == Delivery::History).count();
            assert_eq!(count, 1);
        }
    }

    #[test]
    fn expected_covers_whole_log() {
        let mut generator = InterleavingGenerator::new(3, 8);
        for _ in 0..20 {
            let mut ids = generator.generate().expected();
            ids.sort_unstable();
            assert_eq!(ids, (1..=8).collect::<Vec<_>>());
        }
    }
}
