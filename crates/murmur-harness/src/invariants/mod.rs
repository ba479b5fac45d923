//! Session invariants.
//!
//! Properties that hold after every step of a session, whatever order
//! history and live events arrive in. Checks run against a
//! [`SessionSnapshot`] so each one sees a single consistent state; the same
//! registry serves unit tests, property tests, runtime scenarios and fuzzing.

use std::fmt;

mod checks;
mod snapshot;

pub use checks::{
    DisconnectedHasNoPresence, OwnIdMatchesStatus, TypingImpliesPresent, UniqueMessageIds,
    UniqueRosterIds,
};
pub use snapshot::SessionSnapshot;

/// Outcome of one check.
pub type InvariantResult = Result<(), Violation>;

/// A broken session property, with enough detail to debug the step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Which property broke.
    pub invariant: &'static str,
    /// The offending ids or fields.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.invariant, self.message)
    }
}

impl std::error::Error for Violation {}

/// A property every reachable session state satisfies.
pub trait Invariant: Send + Sync {
    /// Short name used in failure output.
    fn name(&self) -> &'static str;

    /// Check `snapshot`.
    fn check(&self, snapshot: &SessionSnapshot) -> InvariantResult;

    /// Wrap `message` as a violation of this invariant.
    fn violation(&self, message: String) -> Violation {
        Violation { invariant: self.name(), message }
    }
}

/// Set of invariants applied together after each simulated step.
#[derive(Default)]
pub struct InvariantRegistry {
    checks: Vec<Box<dyn Invariant>>,
}

impl InvariantRegistry {
    /// Registry with no checks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every session invariant this crate defines.
    pub fn standard() -> Self {
        Self::new()
            .with(UniqueMessageIds)
            .with(UniqueRosterIds)
            .with(TypingImpliesPresent)
            .with(DisconnectedHasNoPresence)
            .with(OwnIdMatchesStatus)
    }

    /// Builder form of [`add`](Self::add).
    #[must_use]
    pub fn with(mut self, invariant: impl Invariant + 'static) -> Self {
        self.add(invariant);
        self
    }

    /// Register one more check.
    pub fn add(&mut self, invariant: impl Invariant + 'static) {
        self.checks.push(Box::new(invariant));
    }

    /// Names of the registered checks, in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.checks.iter().map(|c| c.name()).collect()
    }

    /// Run every check, collecting all violations rather than stopping at
    /// the first.
    pub fn check_all(&self, snapshot: &SessionSnapshot) -> Result<(), Vec<Violation>> {
        let violations: Vec<Violation> =
            self.checks.iter().filter_map(|c| c.check(snapshot).err()).collect();
        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// [`check_all`](Self::check_all), panicking on any violation.
    /// `context` identifies the step (seed, operation) in the message.
    #[allow(clippy::panic, reason = "test assertion helper")]
    pub fn assert_all(&self, snapshot: &SessionSnapshot, context: &str) {
        let Err(violations) = self.check_all(snapshot) else {
            return;
        };
        let mut report = format!("session invariants broken {context}");
        for violation in &violations {
            report.push_str("\n  ");
            report.push_str(&violation.to_string());
        }
        panic!("{report}\nstate: {:?}", snapshot.state);
    }

    /// Number of registered checks.
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    /// Whether no checks are registered.
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}
