//! Fuzz target for the session state machine.
//!
//! Arbitrary operation sequences (user intents, server events, history
//! results for current and stale generations, transport drops, time) are
//! applied to a real `Session` and to the reference model.
//!
//! # Invariants
//!
//! - Session and model agree on transmitted commands and observable state
//! - Every registered session invariant holds after every step

#![no_main]

use libfuzzer_sys::fuzz_target;
use murmur_core::{Session, SessionConfig};
use murmur_harness::{
    InvariantRegistry, ModelSession, ObservableState, Operation, SessionSnapshot, SimInstant,
};

fuzz_target!(|ops: Vec<Operation>| {
    let registry = InvariantRegistry::standard();
    let mut session: Session<SimInstant> = Session::new(SessionConfig::default());
    let mut clock = SimInstant::ZERO;
    let mut model = ModelSession::new();

    for (step, op) in ops.iter().enumerate() {
        let sent = op.apply(&mut session, &mut clock);
        assert_eq!(sent, model.apply(op), "commands differ at step {step} ({op:?})");

        let snapshot = SessionSnapshot::from_session(&session);
        assert_eq!(ObservableState::from_state(&snapshot.state), model.observable());
        registry.assert_all(&snapshot, &format!("step {step} ({op:?})"));
    }
});
