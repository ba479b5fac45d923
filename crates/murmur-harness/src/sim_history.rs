//! Simulated history source.
//!
//! [`SimHistory`] answers immediately with a fixed batch or failure, or holds
//! each fetch open until the test releases it through a [`HistoryGate`]. A
//! gated fetch that the runtime has already cancelled cannot be released,
//! which lets tests observe cancellation directly.

use std::{
    collections::VecDeque,
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use murmur_client::HistorySource;
use murmur_core::{FetchError, HistoryBatch};
use tokio::sync::oneshot;

type FetchResult = Result<HistoryBatch, FetchError>;

#[derive(Debug)]
enum Mode {
    Ready(FetchResult),
    Gated(VecDeque<oneshot::Sender<FetchResult>>),
}

#[derive(Debug)]
struct Shared {
    mode: Mode,
    fetches: usize,
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// History source for simulations.
#[derive(Debug, Clone)]
pub struct SimHistory {
    shared: Arc<Mutex<Shared>>,
}

/// Releases gated fetches.
#[derive(Debug, Clone)]
pub struct HistoryGate {
    shared: Arc<Mutex<Shared>>,
}

impl SimHistory {
    fn with_mode(mode: Mode) -> Self {
        Self { shared: Arc::new(Mutex::new(Shared { mode, fetches: 0 })) }
    }

    /// Every fetch returns `batch`.
    pub fn ready(batch: HistoryBatch) -> Self {
        Self::with_mode(Mode::Ready(Ok(batch)))
    }

    /// Every fetch fails with `error`.
    pub fn failing(error: FetchError) -> Self {
        Self::with_mode(Mode::Ready(Err(error)))
    }

    /// Every fetch waits for the gate.
    pub fn gated() -> (Self, HistoryGate) {
        let history = Self::with_mode(Mode::Gated(VecDeque::new()));
        let gate = HistoryGate { shared: Arc::clone(&history.shared) };
        (history, gate)
    }

    /// Number of fetches started.
    pub fn fetches(&self) -> usize {
        lock(&self.shared).fetches
    }
}

impl HistoryGate {
    /// Resolve the oldest waiting fetch.
    ///
    /// Returns `false` if no fetch is waiting or the waiting fetch was
    /// cancelled.
    pub fn release(&self, result: FetchResult) -> bool {
        let mut shared = lock(&self.shared);
        let Mode::Gated(waiting) = &mut shared.mode else {
            return false;
        };
        waiting.pop_front().is_some_and(|tx| tx.send(result).is_ok())
    }

    /// Number of fetches waiting, including cancelled ones not yet released.
    pub fn waiting(&self) -> usize {
        match &lock(&self.shared).mode {
            Mode::Gated(waiting) => waiting.len(),
            Mode::Ready(_) => 0,
        }
    }

    /// Number of fetches started.
    pub fn fetches(&self) -> usize {
        lock(&self.shared).fetches
    }
}

enum Pending {
    Now(FetchResult),
    Later(oneshot::Receiver<FetchResult>),
}

impl HistorySource for SimHistory {
    fn fetch(&self) -> impl Future<Output = FetchResult> + Send + 'static {
        let mut shared = lock(&self.shared);
        shared.fetches += 1;

        let pending = match &mut shared.mode {
            Mode::Ready(result) => Pending::Now(result.clone()),
            Mode::Gated(waiting) => {
                let (tx, rx) = oneshot::channel();
                waiting.push_back(tx);
                Pending::Later(rx)
            },
        };
        drop(shared);

        async move {
            match pending {
                Pending::Now(result) => result,
                Pending::Later(rx) => rx
                    .await
                    .unwrap_or_else(|_| Err(FetchError::Transport("history gate dropped".into()))),
            }
        }
    }
}
