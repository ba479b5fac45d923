//! Observable state snapshots for invariant checking.

use std::{ops::Sub, time::Duration};

use murmur_core::{Session, SessionState};

/// Snapshot of one session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Published read model.
    pub state: SessionState,
    /// Session generation at snapshot time.
    pub generation: u64,
    /// Whether history has settled (loaded or failed) for this generation.
    pub history_settled: bool,
}

impl SessionSnapshot {
    /// Capture a session.
    pub fn from_session<I>(session: &Session<I>) -> Self
    where
        I: Copy + Ord + Sub<Output = Duration>,
    {
        Self {
            state: session.snapshot(),
            generation: session.generation(),
            history_settled: session.reconciler().history_loaded(),
        }
    }

    /// Wrap a published read model, as seen through a `SessionHandle`.
    pub fn from_state(state: SessionState) -> Self {
        Self { state, ..Self::default() }
    }
}
