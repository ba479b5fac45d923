//! Property-based tests for the Session reducer.
//!
//! Arbitrary interleavings of user intents, server events, history results
//! and transport drops must never break the transcript or presence
//! invariants.

use std::{
    collections::HashSet,
    time::{Duration, Instant},
};

use murmur_core::{
    ConnectionStatus, FetchError, HistoryBatch, Message, ServerEvent, Session, SessionEvent,
    StatusChange, User,
};
use proptest::prelude::*;

/// One step of a generated run.
#[derive(Debug, Clone)]
enum Step {
    Connect,
    Disconnect,
    Send(String),
    Typing(bool),
    Server(ServerEvent),
    History { generation_offset: u64, ids: Vec<u64>, fail: bool },
    Lost,
    Tick(u64),
}

fn message(id: u64) -> Message {
    Message::broadcast(id, 2, "bob", format!("m{id}"), id)
}

fn user_strategy() -> impl Strategy<Value = User> {
    (1u64..6).prop_map(|id| User::new(id, format!("user{id}")))
}

fn server_event_strategy() -> impl Strategy<Value = ServerEvent> {
    prop_oneof![
        1 => (1u64..4).prop_map(|user_id| ServerEvent::Welcome { user_id }),
        4 => (1u64..20).prop_map(|id| ServerEvent::Message(message(id))),
        2 => user_strategy().prop_map(ServerEvent::UserJoined),
        1 => (1u64..6).prop_map(|user_id| ServerEvent::UserLeft { user_id }),
        2 => (1u64..6).prop_map(|user_id| ServerEvent::TypingStarted { user_id }),
        1 => (1u64..6).prop_map(|user_id| ServerEvent::TypingStopped { user_id }),
        1 => prop::collection::vec(user_strategy(), 0..4).prop_map(ServerEvent::Roster),
    ]
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        2 => Just(Step::Connect),
        1 => Just(Step::Disconnect),
        1 => "[ a-z]{0,6}".prop_map(Step::Send),
        1 => any::<bool>().prop_map(Step::Typing),
        8 => server_event_strategy().prop_map(Step::Server),
        2 => (0u64..2, prop::collection::vec(1u64..20, 0..8), any::<bool>())
            .prop_map(|(generation_offset, ids, fail)| Step::History { generation_offset, ids, fail }),
        1 => Just(Step::Lost),
        1 => (0u64..60).prop_map(Step::Tick),
    ]
}

fn apply(session: &mut Session, step: Step, start: Instant) {
    match step {
        Step::Connect => {
            let _ = session.connect("alice", start);
        },
        Step::Disconnect => {
            let _ = session.disconnect();
        },
        Step::Send(body) => {
            let _ = session.send_message(&body);
        },
        Step::Typing(on) => {
            let _ = session.set_typing(on);
        },
        Step::Server(event) => {
            let _ = session.receive(event);
        },
        Step::History { generation_offset, ids, fail } => {
            let generation = session.generation().saturating_sub(generation_offset);
            let result = if fail {
                Err(FetchError::Timeout)
            } else {
                Ok(HistoryBatch::new(ids.into_iter().map(message).collect()))
            };
            let _ = session.handle(SessionEvent::HistoryLoaded { generation, result });
        },
        Step::Lost => {
            let _ = session.handle(SessionEvent::ConnectionStatusChanged(StatusChange::Lost {
                reason: "generated".into(),
            }));
        },
        Step::Tick(secs) => {
            let _ = session.handle(SessionEvent::Tick { now: start + Duration::from_secs(secs) });
        },
    }
}

proptest! {
    /// Message ids stay unique and typing users stay present under any
    /// interleaving.
    #[test]
    fn prop_transcript_and_presence_invariants(steps in prop::collection::vec(step_strategy(), 0..80)) {
        let start = Instant::now();
        let mut session: Session = Session::default();

        for step in steps {
            apply(&mut session, step.clone(), start);
            let state = session.snapshot();

            let ids = state.message_ids();
            let unique: HashSet<_> = ids.iter().collect();
            prop_assert_eq!(unique.len(), ids.len(), "duplicate id after {:?}", step);

            for user_id in &state.typing {
                prop_assert!(
                    state.user(*user_id).is_some(),
                    "typing user {} not in roster after {:?}", user_id, step
                );
            }

            if state.status == ConnectionStatus::Disconnected {
                prop_assert!(state.roster.is_empty(), "roster kept while disconnected after {:?}", step);
                prop_assert!(state.typing.is_empty());
                prop_assert!(state.user_id.is_none());
            }
        }
    }

    /// Disconnect always leaves a fully reset session, whatever came before.
    #[test]
    fn prop_disconnect_resets(steps in prop::collection::vec(step_strategy(), 0..60)) {
        let start = Instant::now();
        let mut session: Session = Session::default();

        for step in steps {
            apply(&mut session, step, start);
        }
        let _ = session.disconnect();

        prop_assert!(session.snapshot().is_reset());
    }

    /// Delivering the same live messages twice changes nothing.
    #[test]
    fn prop_live_redelivery_is_idempotent(ids in prop::collection::vec(1u64..30, 0..40)) {
        let mut session: Session = Session::default();
        let _ = session.connect("alice", Instant::now());
        let _ = session.receive(ServerEvent::Welcome { user_id: 1 });

        for id in &ids {
            let _ = session.receive(ServerEvent::Message(message(*id)));
        }
        let once = session.snapshot();

        for id in &ids {
            let _ = session.receive(ServerEvent::Message(message(*id)));
        }

        prop_assert_eq!(once, session.snapshot());
    }

    /// History and live overlap produce the union, with first arrival placing
    /// each id.
    #[test]
    fn prop_history_live_union(
        live_before in prop::collection::vec(1u64..30, 0..10),
        history in prop::collection::vec(1u64..30, 0..15),
        live_after in prop::collection::vec(1u64..30, 0..10),
    ) {
        let mut session: Session = Session::default();
        let _ = session.connect("alice", Instant::now());
        let _ = session.receive(ServerEvent::Welcome { user_id: 1 });

        for id in &live_before {
            let _ = session.receive(ServerEvent::Message(message(*id)));
        }
        let _ = session.handle(SessionEvent::HistoryLoaded {
            generation: session.generation(),
            result: Ok(HistoryBatch::new(history.iter().copied().map(message).collect())),
        });
        for id in &live_after {
            let _ = session.receive(ServerEvent::Message(message(*id)));
        }

        let mut expected = Vec::new();
        for id in live_before.iter().chain(&history).chain(&live_after) {
            if !expected.contains(id) {
                expected.push(*id);
            }
        }
        prop_assert_eq!(session.snapshot().message_ids(), expected);
    }

    /// A failed history fetch never blocks live delivery.
    #[test]
    fn prop_history_failure_keeps_live(ids in prop::collection::vec(1u64..30, 1..20)) {
        let mut session: Session = Session::default();
        let _ = session.connect("alice", Instant::now());
        let _ = session.receive(ServerEvent::Welcome { user_id: 1 });
        let _ = session.handle(SessionEvent::HistoryLoaded {
            generation: session.generation(),
            result: Err(FetchError::Status(503)),
        });

        for id in &ids {
            let _ = session.receive(ServerEvent::Message(message(*id)));
        }

        let unique: HashSet<_> = ids.iter().collect();
        prop_assert!(session.is_connected());
        prop_assert_eq!(session.snapshot().messages.len(), unique.len());
    }
}
