//! Session facade.
//!
//! [`Session`] composes the [`ConnectionManager`], [`Reconciler`] and
//! [`Presence`] into the single interface presentation code talks to. It is a
//! pure state machine: intents (`connect`, `send_message`, ...) and inbound
//! events ([`SessionEvent`]) go in, [`SessionAction`]s come out.
//!
//! # Responsibilities
//!
//! - Gates every outbound intent on validation; rejected intents produce no
//!   actions and are logged at debug level.
//! - Routes each inbound event to the component that owns the affected state.
//! - Discards history results from an older generation or arriving after
//!   teardown.
//! - Rebuilds [`SessionState`] on demand; nothing outside mutates it.

use std::{
    ops::Sub,
    time::{Duration, Instant},
};

use murmur_proto::{ClientCommand, HistoryBatch, Message, ServerEvent, User, UserId};

use crate::{
    action::{SessionAction, SessionNotice},
    connection::{ConnectionManager, SessionConfig},
    error::{FetchError, ValidationError},
    event::{SessionEvent, StatusChange},
    presence::Presence,
    reconciler::Reconciler,
    state::{ConnectionStatus, SessionState},
};

/// Session synchronization state machine.
#[derive(Debug, Clone)]
pub struct Session<I = Instant>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    connection: ConnectionManager<I>,
    reconciler: Reconciler,
    presence: Presence,
}

impl<I> Session<I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    /// Create a disconnected session.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            connection: ConnectionManager::new(config),
            reconciler: Reconciler::new(),
            presence: Presence::new(),
        }
    }

    /// Start a session as `display_name`.
    ///
    /// Clears any state left from a dropped session, then opens the
    /// transport, authenticates and requests history for the new generation.
    /// No-op if the trimmed name is empty or a session is already active.
    pub fn connect(&mut self, display_name: &str, now: I) -> Vec<SessionAction> {
        let connection_actions = match self.connection.connect(display_name, now) {
            Ok(actions) => actions,
            Err(e) => return Self::reject(&e),
        };

        self.reconciler.clear();
        self.presence.clear();

        let generation = self.connection.generation();
        tracing::info!(generation, name = display_name.trim(), "connecting");

        let mut actions: Vec<SessionAction> =
            connection_actions.into_iter().map(SessionAction::from).collect();
        actions.push(SessionAction::FetchHistory { generation });
        actions.push(SessionAction::Publish);
        actions
    }

    /// End the session. A hard reset: transcript, roster and typing are
    /// cleared whatever the prior state, and any in-flight history fetch is
    /// abandoned.
    pub fn disconnect(&mut self) -> Vec<SessionAction> {
        let was = self.connection.status();
        let mut actions: Vec<SessionAction> =
            self.connection.disconnect().into_iter().map(SessionAction::from).collect();

        self.reconciler.clear();
        self.presence.clear();

        tracing::info!(from = %was, "disconnected");

        actions.push(SessionAction::CancelHistory);
        actions.push(SessionAction::Publish);
        actions
    }

    /// Send a broadcast message, followed by typing `false`.
    ///
    /// No-op unless connected and the trimmed body is non-empty.
    pub fn send_message(&mut self, body: &str) -> Vec<SessionAction> {
        let body = match self.validate_send(body, "send message") {
            Ok(body) => body,
            Err(e) => return Self::reject(&e),
        };

        vec![
            SessionAction::Send(ClientCommand::SendBroadcast { body }),
            SessionAction::Send(self.presence.stop_own_typing()),
        ]
    }

    /// Send a private message, followed by typing `false`.
    ///
    /// No-op unless connected, the trimmed body is non-empty and
    /// `recipient_id` is present.
    pub fn send_private_message(&mut self, recipient_id: UserId, body: &str) -> Vec<SessionAction> {
        let body = match self.validate_send(body, "send private message") {
            Ok(body) => body,
            Err(e) => return Self::reject(&e),
        };
        if !self.presence.is_present(recipient_id) {
            return Self::reject(&ValidationError::UnknownRecipient { recipient_id });
        }

        vec![
            SessionAction::Send(ClientCommand::SendPrivate { recipient_id, body }),
            SessionAction::Send(self.presence.stop_own_typing()),
        ]
    }

    /// Transmit our typing indicator if it changed since the last
    /// transmission. No-op unless connected.
    pub fn set_typing(&mut self, is_typing: bool) -> Vec<SessionAction> {
        if !self.connection.is_connected() {
            return Self::reject(&ValidationError::NotConnected {
                status: self.connection.status(),
                operation: "set typing",
            });
        }

        self.presence.own_typing_command(is_typing).map(SessionAction::Send).into_iter().collect()
    }

    /// Accept a raw server event: sequence it, republish it, then reduce it.
    ///
    /// The first action is always [`SessionAction::Inbound`] carrying the
    /// sequenced event. Nothing is sequenced while disconnected.
    pub fn receive(&mut self, event: ServerEvent) -> Vec<SessionAction> {
        if self.connection.status() == ConnectionStatus::Disconnected {
            tracing::debug!(event = event.name(), "ignoring server event while disconnected");
            return vec![];
        }

        let sequenced = self.connection.sequence(event);
        tracing::trace!(seq = sequenced.seq, event = sequenced.event.name(), "inbound");

        let reduced = self.handle(SessionEvent::from(sequenced.event.clone()));
        let mut actions = Vec::with_capacity(reduced.len() + 1);
        actions.push(SessionAction::Inbound(sequenced));
        actions.extend(reduced);
        actions
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: SessionEvent<I>) -> Vec<SessionAction> {
        match event {
            SessionEvent::HistoryLoaded { generation, result } => {
                self.handle_history(generation, result)
            },
            SessionEvent::ConnectionStatusChanged(StatusChange::Lost { reason }) => {
                self.handle_lost(reason, vec![])
            },
            SessionEvent::Tick { now } => match self.connection.tick(now) {
                Some(elapsed) => {
                    let reason = format!("handshake timeout after {elapsed:?}");
                    self.handle_lost(reason, vec![SessionAction::CloseConnection])
                },
                None => vec![],
            },
            stream_event => {
                if self.connection.status() == ConnectionStatus::Disconnected {
                    tracing::debug!(
                        event = stream_event.name(),
                        "ignoring event while disconnected"
                    );
                    return vec![];
                }
                let changed = self.apply_stream_event(stream_event);
                if changed { vec![SessionAction::Publish] } else { vec![] }
            },
        }
    }

    /// Current connection status.
    pub fn status(&self) -> ConnectionStatus {
        self.connection.status()
    }

    /// Whether sending is currently possible.
    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    /// Generation of the current (or most recent) session.
    pub fn generation(&self) -> u64 {
        self.connection.generation()
    }

    /// Connection manager (read-only).
    pub fn connection(&self) -> &ConnectionManager<I> {
        &self.connection
    }

    /// Transcript (read-only).
    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// Presence (read-only).
    pub fn presence(&self) -> &Presence {
        &self.presence
    }

    /// Merged transcript in display order.
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.reconciler.messages()
    }

    /// Present users in join order.
    pub fn roster(&self) -> impl Iterator<Item = &User> {
        self.presence.roster()
    }

    /// Look up a present user.
    pub fn user(&self, user_id: UserId) -> Option<&User> {
        self.presence.user(user_id)
    }

    /// Display names of typing users.
    pub fn typing_names(&self) -> Vec<&str> {
        self.presence.typing_names()
    }

    /// Rebuild the read model from the components.
    pub fn snapshot(&self) -> SessionState {
        SessionState {
            status: self.connection.status(),
            user_id: self.connection.user_id(),
            messages: self.reconciler.messages().cloned().collect(),
            roster: self.presence.roster().cloned().collect(),
            typing: self.presence.typing().collect(),
        }
    }

    fn apply_stream_event(&mut self, event: SessionEvent<I>) -> bool {
        match event {
            SessionEvent::ConnectionStatusChanged(StatusChange::Acknowledged { user_id }) => {
                let changed = self.connection.acknowledge(user_id);
                if changed {
                    tracing::info!(user_id, generation = self.generation(), "connected");
                }
                changed
            },
            SessionEvent::MessageReceived(message) | SessionEvent::SystemNotice(message) => {
                self.reconciler.merge_live(message)
            },
            SessionEvent::UserJoined(user) => self.presence.join(user),
            SessionEvent::UserLeft { user_id } => self.presence.leave(user_id),
            SessionEvent::TypingChanged { user_id, typing } => {
                self.presence.set_typing(user_id, typing)
            },
            SessionEvent::RosterReplaced(users) => self.presence.replace_roster(users),
            SessionEvent::HistoryLoaded { .. }
            | SessionEvent::ConnectionStatusChanged(StatusChange::Lost { .. })
            | SessionEvent::Tick { .. } => false,
        }
    }

    fn handle_history(
        &mut self,
        generation: u64,
        result: Result<HistoryBatch, FetchError>,
    ) -> Vec<SessionAction> {
        if generation != self.connection.generation()
            || self.connection.status() == ConnectionStatus::Disconnected
        {
            tracing::debug!(
                generation,
                current = self.connection.generation(),
                status = %self.connection.status(),
                "discarding stale history result"
            );
            return vec![];
        }
        if self.reconciler.history_loaded() {
            tracing::debug!(generation, "history already settled for this session");
            return vec![];
        }

        match result {
            Ok(batch) => {
                let outcome = self.reconciler.merge_history(batch);
                tracing::debug!(
                    generation,
                    inserted = outcome.inserted,
                    duplicates = outcome.duplicates,
                    "history merged"
                );
                if outcome.changed() { vec![SessionAction::Publish] } else { vec![] }
            },
            Err(e) => {
                tracing::warn!(generation, error = %e, "history unavailable, continuing live-only");
                self.reconciler.mark_history_failed();
                vec![SessionAction::Notify(SessionNotice::HistoryUnavailable {
                    reason: e.to_string(),
                })]
            },
        }
    }

    /// Transport drop or handshake timeout. Presence is cleared; the
    /// transcript stays readable until the next `connect` replaces it.
    fn handle_lost(
        &mut self,
        reason: String,
        mut actions: Vec<SessionAction>,
    ) -> Vec<SessionAction> {
        if !self.connection.transport_lost() && actions.is_empty() {
            return vec![];
        }

        tracing::warn!(%reason, generation = self.generation(), "connection lost");
        self.presence.clear();

        actions.push(SessionAction::CancelHistory);
        actions.push(SessionAction::Notify(SessionNotice::ConnectionLost { reason }));
        actions.push(SessionAction::Publish);
        actions
    }

    fn validate_send(
        &self,
        body: &str,
        operation: &'static str,
    ) -> Result<String, ValidationError> {
        if !self.connection.is_connected() {
            return Err(ValidationError::NotConnected {
                status: self.connection.status(),
                operation,
            });
        }
        let body = body.trim();
        if body.is_empty() {
            return Err(ValidationError::EmptyBody);
        }
        Ok(body.to_string())
    }

    fn reject(err: &ValidationError) -> Vec<SessionAction> {
        tracing::debug!(error = %err, "intent rejected");
        vec![]
    }
}

impl<I> Default for Session<I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}
