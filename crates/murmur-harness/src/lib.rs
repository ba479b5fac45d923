//! Deterministic simulation harness for the Murmur session.
//!
//! In-memory implementations of the client's I/O traits, so the real
//! [`murmur_client::Runtime`] runs against a scripted server with virtual
//! time, plus the tools for checking it.
//!
//! # Model-Based Testing
//!
//! The `model` module provides a naive reference implementation of the
//! session rules. [`Operation`]s are applied to both the model and a real
//! session, and their observable states and transmitted commands are
//! compared.
//!
//! # Invariant Testing
//!
//! The `invariants` module checks properties that must hold after every
//! step regardless of arrival order. Use [`InvariantRegistry::standard()`]
//! for the full set.
//!
//! # Interleavings
//!
//! [`InterleavingGenerator`] produces seeded history/live delivery schedules
//! with overlap and redelivery, each with its expected transcript.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod clock;
pub mod interleave;
pub mod invariants;
pub mod model;
pub mod sim_driver;
pub mod sim_history;

pub use clock::SimInstant;
pub use interleave::{Delivery, Interleaving, InterleavingGenerator, log_message};
pub use invariants::{
    DisconnectedHasNoPresence, Invariant, InvariantRegistry, InvariantResult, OwnIdMatchesStatus,
    SessionSnapshot, TypingImpliesPresent, UniqueMessageIds, UniqueRosterIds, Violation,
};
pub use model::{ModelSession, ModelTranscript, ObservableState, Operation};
pub use sim_driver::{SimDriver, SimServer};
pub use sim_history::{HistoryGate, SimHistory};
