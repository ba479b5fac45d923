//! Async runtime for the Murmur session core.
//!
//! Executes the actions produced by [`murmur_core::Session`] against real (or
//! simulated) I/O and exposes the session to presentation through a
//! [`SessionHandle`].
//!
//! # Components
//!
//! - [`Driver`]: persistent connection I/O
//! - [`HistorySource`]: one-shot history fetch
//! - [`Runtime`]: single-task event loop tying the two to the session
//! - [`SessionHandle`]: intents in, [`murmur_core::SessionState`] snapshots out
//!
//! The `transport` feature adds a WebSocket [`Driver`] and an HTTP
//! [`HistorySource`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod driver;
mod error;
mod handle;
mod history;
mod runtime;

#[cfg(feature = "transport")]
pub mod transport;

pub use config::{
    ClientConfig, DEFAULT_HISTORY_URL, DEFAULT_REQUEST_TIMEOUT, DEFAULT_SERVER_URL,
    DEFAULT_TICK_INTERVAL,
};
pub use driver::Driver;
pub use error::{RuntimeError, TransportError};
pub use handle::{Intent, SessionHandle};
pub use history::HistorySource;
pub use runtime::Runtime;
