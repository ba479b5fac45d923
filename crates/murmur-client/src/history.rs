//! One-shot history loading.

use std::future::Future;

use murmur_core::{FetchError, HistoryBatch};

/// Source of the message history fetched once per session.
///
/// The returned future owns everything it needs so the runtime can hold it
/// across loop iterations and drop it to cancel.
pub trait HistorySource: Send + Sync + 'static {
    /// Fetch the history.
    fn fetch(&self) -> impl Future<Output = Result<HistoryBatch, FetchError>> + Send + 'static;
}
