//! Generic runtime for session orchestration.
//!
//! The Runtime drives the session event loop, coordinating between:
//! - [`Session`]: sans-IO session state machine
//! - [`Driver`]: persistent connection I/O
//! - [`HistorySource`]: the one-shot history fetch
//! - [`SessionHandle`]: presentation intents in, state snapshots out
//!
//! One `tokio::select!` loop multiplexes the four input sources. Every wakeup
//! is reduced by the session to completion, then the resulting actions are
//! executed before the next wakeup is polled.

use std::{collections::VecDeque, future::Future, pin::Pin};

use murmur_core::{
    FetchError, HistoryBatch, Sequenced, Session, SessionAction, SessionEvent, SessionNotice,
    SessionState, StatusChange,
};
use murmur_proto::ServerEvent;
use tokio::{
    sync::{broadcast, mpsc, watch},
    time::MissedTickBehavior,
};

use crate::{ClientConfig, Driver, HistorySource, Intent, SessionHandle};

/// Buffered intents before `SessionHandle` calls wait.
const INTENT_CAPACITY: usize = 64;

/// Buffered notices per subscriber.
const NOTICE_CAPACITY: usize = 16;

/// Buffered inbound events per subscriber. Slow subscribers lag, they never
/// stall the loop.
const EVENT_CAPACITY: usize = 256;

type HistoryResult = (u64, Result<HistoryBatch, FetchError>);
type HistoryFuture = Pin<Box<dyn Future<Output = HistoryResult> + Send>>;

/// What woke the loop.
enum Wake {
    Intent(Option<Intent>),
    Inbound(Option<ServerEvent>),
    History(HistoryResult),
    Tick,
}

/// Generic runtime that orchestrates Session, Driver and `HistorySource`.
///
/// # Type Parameters
///
/// - `D`: persistent connection driver
/// - `H`: history source
pub struct Runtime<D, H>
where
    D: Driver,
    H: HistorySource,
{
    driver: D,
    history: H,
    session: Session<D::Instant>,
    config: ClientConfig,
    intents: mpsc::Receiver<Intent>,
    state: watch::Sender<SessionState>,
    notices: broadcast::Sender<SessionNotice>,
    events: broadcast::Sender<Sequenced<ServerEvent>>,
    pending_history: Option<HistoryFuture>,
}

impl<D, H> Runtime<D, H>
where
    D: Driver,
    H: HistorySource,
{
    /// Create a runtime and the handle presentation uses to drive it.
    pub fn new(driver: D, history: H, config: ClientConfig) -> (Self, SessionHandle) {
        let (intent_tx, intent_rx) = mpsc::channel(INTENT_CAPACITY);
        let (state_tx, state_rx) = watch::channel(SessionState::default());
        let (notice_tx, _) = broadcast::channel(NOTICE_CAPACITY);
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);

        let handle =
            SessionHandle::new(intent_tx, state_rx, notice_tx.clone(), event_tx.clone());
        let runtime = Self {
            driver,
            history,
            session: Session::new(config.session.clone()),
            config,
            intents: intent_rx,
            state: state_tx,
            notices: notice_tx,
            events: event_tx,
            pending_history: None,
        };
        (runtime, handle)
    }

    /// Run the event loop until shutdown.
    ///
    /// Returns after a [`Intent::Shutdown`] or once every handle is dropped.
    /// The session is disconnected on the way out.
    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.config.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let wake = tokio::select! {
                intent = self.intents.recv() => Wake::Intent(intent),
                event = self.driver.recv(), if self.driver.is_open() => Wake::Inbound(event),
                result = next_history(&mut self.pending_history) => Wake::History(result),
                _ = ticker.tick() => Wake::Tick,
            };

            let actions = match wake {
                Wake::Intent(None | Some(Intent::Shutdown)) => break,
                Wake::Intent(Some(intent)) => self.apply(intent),
                Wake::Inbound(Some(event)) => self.session.receive(event),
                Wake::Inbound(None) => self.session.handle(lost("connection closed by server")),
                Wake::History((generation, result)) => {
                    self.pending_history = None;
                    self.session.handle(SessionEvent::HistoryLoaded { generation, result })
                },
                Wake::Tick => {
                    let now = self.driver.now();
                    self.session.handle(SessionEvent::Tick { now })
                },
            };

            self.execute(actions).await;
        }

        tracing::info!("session runtime stopping");
        let actions = self.session.disconnect();
        self.execute(actions).await;
    }

    /// Session state machine (read-only).
    pub fn session(&self) -> &Session<D::Instant> {
        &self.session
    }

    fn apply(&mut self, intent: Intent) -> Vec<SessionAction> {
        match intent {
            Intent::Connect { display_name } => {
                let now = self.driver.now();
                self.session.connect(&display_name, now)
            },
            Intent::Disconnect => self.session.disconnect(),
            Intent::SendMessage { body } => self.session.send_message(&body),
            Intent::SendPrivate { recipient_id, body } => {
                self.session.send_private_message(recipient_id, &body)
            },
            Intent::SetTyping(is_typing) => self.session.set_typing(is_typing),
            Intent::Shutdown => vec![],
        }
    }

    /// Execute actions, including any follow-up actions produced by I/O
    /// failures along the way.
    async fn execute(&mut self, actions: Vec<SessionAction>) {
        let mut queue = VecDeque::from(actions);

        while let Some(action) = queue.pop_front() {
            match action {
                SessionAction::OpenConnection => {
                    if let Err(e) = self.driver.open(&self.config.server_url).await {
                        tracing::warn!(
                            url = %self.config.server_url,
                            error = %e,
                            "failed to open connection"
                        );
                        queue.extend(self.session.handle(lost(e.to_string())));
                    }
                },
                SessionAction::Send(command) => {
                    let name = command.name();
                    if !self.driver.is_open() {
                        tracing::debug!(command = name, "connection not open, dropping command");
                        continue;
                    }
                    if let Err(e) = self.driver.send(command).await {
                        tracing::warn!(command = name, error = %e, "send failed");
                        self.driver.close().await;
                        queue.extend(self.session.handle(lost(e.to_string())));
                    }
                },
                SessionAction::CloseConnection => self.driver.close().await,
                SessionAction::FetchHistory { generation } => self.start_history(generation),
                SessionAction::CancelHistory => {
                    if self.pending_history.take().is_some() {
                        tracing::debug!("history fetch cancelled");
                    }
                },
                SessionAction::Publish => {
                    self.state.send_replace(self.session.snapshot());
                },
                SessionAction::Notify(notice) => {
                    if self.notices.send(notice).is_err() {
                        tracing::trace!("no notice subscribers");
                    }
                },
                SessionAction::Inbound(event) => {
                    if self.events.send(event).is_err() {
                        tracing::trace!("no event subscribers");
                    }
                },
            }
        }
    }

    fn start_history(&mut self, generation: u64) {
        tracing::debug!(generation, url = %self.config.history_url, "fetching history");

        let fetch = self.history.fetch();
        let timeout = self.config.request_timeout;
        self.pending_history = Some(Box::pin(async move {
            let result = tokio::time::timeout(timeout, fetch)
                .await
                .unwrap_or(Err(FetchError::Timeout));
            (generation, result)
        }));
    }
}

fn lost<I>(reason: impl Into<String>) -> SessionEvent<I> {
    SessionEvent::ConnectionStatusChanged(StatusChange::Lost { reason: reason.into() })
}

/// Resolve the in-flight fetch, or never when there is none.
async fn next_history(slot: &mut Option<HistoryFuture>) -> HistoryResult {
    match slot {
        Some(fetch) => fetch.await,
        None => std::future::pending().await,
    }
}
