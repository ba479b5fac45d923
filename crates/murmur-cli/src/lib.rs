//! Terminal front end for Murmur.
//!
//! A thin shell over [`murmur_client::SessionHandle`]: [`command`] parses
//! input lines and [`view`] renders snapshots as append-only text. All
//! session logic lives in `murmur-core`.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod command;
pub mod view;

pub use command::{Command, CommandError, HELP, parse};
pub use view::Transcript;
