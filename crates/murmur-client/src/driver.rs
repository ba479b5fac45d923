//! Driver trait for abstracting transport I/O.
//!
//! The [`Driver`] trait decouples the [`crate::Runtime`] from a concrete
//! transport. Production uses the WebSocket driver behind the `transport`
//! feature; simulations script the server side in memory.

use std::{future::Future, ops::Sub, time::Duration};

use murmur_proto::{ClientCommand, ServerEvent};

/// Persistent-connection I/O for the runtime.
///
/// # Associated Types
///
/// - [`Error`](Driver::Error): transport error type
/// - [`Instant`](Driver::Instant): time representation (real or virtual)
pub trait Driver: Send {
    /// Transport error type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Time instant type. Enables virtual time in simulation.
    type Instant: Copy + Ord + Send + Sync + Sub<Output = Duration>;

    /// Open the connection to `url`. Replaces any previous connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    fn open(&mut self, url: &str) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Send a command to the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection is closed or the write fails.
    fn send(&mut self, command: ClientCommand)
    -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Receive the next server event.
    ///
    /// Returns `None` once the connection has closed, after which
    /// [`is_open`](Driver::is_open) reports `false`. Must be cancel-safe.
    fn recv(&mut self) -> impl Future<Output = Option<ServerEvent>> + Send;

    /// Whether a connection is open.
    fn is_open(&self) -> bool;

    /// Close the connection if open.
    fn close(&mut self) -> impl Future<Output = ()> + Send;

    /// Current time instant.
    fn now(&self) -> Self::Instant;
}
