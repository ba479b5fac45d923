//! Seeded history/live interleavings.
//!
//! For many seeds, a schedule of live deliveries and one history result is
//! fed to a connected session. The transcript must equal the reference
//! model's, whatever position the history result lands in.

use murmur_core::{
    FetchError, ServerEvent, Session, SessionAction, SessionConfig, SessionEvent, SessionNotice,
};
use murmur_harness::{
    Delivery, InterleavingGenerator, InvariantRegistry, SessionSnapshot, SimInstant, log_message,
};

const OWN_ID: u64 = 1;

fn connected_session() -> Session<SimInstant> {
    let mut session = Session::new(SessionConfig::default());
    let _ = session.connect("alice", SimInstant::ZERO);
    let _ = session.receive(ServerEvent::Welcome { user_id: OWN_ID });
    session
}

#[test]
fn interleavings_match_model() {
    let registry = InvariantRegistry::standard();

    for seed in 0..300 {
        let mut generator = InterleavingGenerator::new(seed, 16);
        let schedule = generator.generate();
        let mut session = connected_session();

        for delivery in &schedule.deliveries {
            let _ = match delivery {
                Delivery::Live(id) => session.receive(ServerEvent::Message(log_message(*id))),
                Delivery::History => session.handle(SessionEvent::HistoryLoaded {
                    generation: session.generation(),
                    result: Ok(schedule.batch()),
                }),
            };
            registry.assert_all(&SessionSnapshot::from_session(&session), &format!("seed {seed}"));
        }

        assert_eq!(
            session.snapshot().message_ids(),
            schedule.expected(),
            "seed {seed}: {schedule:?}"
        );
    }
}

#[test]
fn failed_history_leaves_exactly_live_stream() {
    for seed in 0..100 {
        let schedule = InterleavingGenerator::new(seed, 12).generate();
        let mut session = connected_session();
        let mut notified = false;
        let mut live_order = Vec::new();

        for delivery in &schedule.deliveries {
            match delivery {
                Delivery::Live(id) => {
                    if !live_order.contains(id) {
                        live_order.push(*id);
                    }
                    let _ = session.receive(ServerEvent::Message(log_message(*id)));
                },
                Delivery::History => {
                    let actions = session.handle(SessionEvent::HistoryLoaded {
                        generation: session.generation(),
                        result: Err(FetchError::Decode("not an array".into())),
                    });
                    notified = actions.iter().any(|a| {
                        matches!(a, SessionAction::Notify(SessionNotice::HistoryUnavailable { .. }))
                    });
                },
            }
        }

        assert!(notified, "seed {seed}");
        assert_eq!(session.snapshot().message_ids(), live_order, "seed {seed}");
    }
}
