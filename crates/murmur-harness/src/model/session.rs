//! Reference session model.

use std::time::Duration;

use murmur_core::{
    ClientCommand, ConnectionStatus, DEFAULT_HANDSHAKE_TIMEOUT, MessageId, SessionState, User,
    UserId,
};

use super::{
    BODY, DISPLAY_NAME, ModelTranscript, OWN_USER_ID, Operation, message,
    operation::tagged_generation, user, user_id,
};
use crate::SimInstant;

/// Observable state for oracle comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservableState {
    /// Connection status.
    pub status: ConnectionStatus,
    /// Own id.
    pub user_id: Option<UserId>,
    /// Transcript ids in display order.
    pub message_ids: Vec<MessageId>,
    /// Roster in join order.
    pub roster: Vec<User>,
    /// Typing ids in start order.
    pub typing: Vec<UserId>,
}

impl ObservableState {
    /// Project a real read model.
    pub fn from_state(state: &SessionState) -> Self {
        Self {
            status: state.status,
            user_id: state.user_id,
            message_ids: state.message_ids(),
            roster: state.roster.clone(),
            typing: state.typing.clone(),
        }
    }
}

/// Reference model of one client session.
#[derive(Debug, Clone)]
pub struct ModelSession {
    status: ConnectionStatus,
    user_id: Option<UserId>,
    generation: u64,
    history_settled: bool,
    handshake_started: Option<SimInstant>,
    handshake_timeout: Duration,
    now: SimInstant,
    transcript: ModelTranscript,
    roster: Vec<User>,
    typing: Vec<UserId>,
    own_typing: bool,
}

impl Default for ModelSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelSession {
    /// Disconnected model with the default handshake timeout.
    pub fn new() -> Self {
        Self {
            status: ConnectionStatus::Disconnected,
            user_id: None,
            generation: 0,
            history_settled: false,
            handshake_started: None,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            now: SimInstant::ZERO,
            transcript: ModelTranscript::new(),
            roster: Vec::new(),
            typing: Vec::new(),
            own_typing: false,
        }
    }

    /// Apply an operation, returning the commands the session must transmit.
    pub fn apply(&mut self, op: &Operation) -> Vec<ClientCommand> {
        match op {
            Operation::Connect => {
                if self.status != ConnectionStatus::Disconnected {
                    return vec![];
                }
                self.transcript.clear();
                self.history_settled = false;
                self.clear_presence();
                self.status = ConnectionStatus::Connecting;
                self.generation += 1;
                self.handshake_started = Some(self.now);
                vec![ClientCommand::Authenticate { display_name: DISPLAY_NAME.into() }]
            },
            Operation::Disconnect => {
                let sent = if self.status == ConnectionStatus::Disconnected {
                    vec![]
                } else {
                    vec![ClientCommand::Leave]
                };
                self.drop_connection();
                self.transcript.clear();
                self.history_settled = false;
                sent
            },
            Operation::SendMessage { blank } => {
                if *blank || self.status != ConnectionStatus::Connected {
                    return vec![];
                }
                self.own_typing = false;
                vec![
                    ClientCommand::SendBroadcast { body: BODY.into() },
                    ClientCommand::Typing { is_typing: false },
                ]
            },
            Operation::SetTyping { on } => {
                if self.status != ConnectionStatus::Connected || self.own_typing == *on {
                    return vec![];
                }
                self.own_typing = *on;
                vec![ClientCommand::Typing { is_typing: *on }]
            },
            Operation::HistoryLoaded { ids, stale } => {
                if self.accepts_history(*stale) {
                    self.history_settled = true;
                    self.transcript.deliver_all(ids.iter().copied().map(message));
                }
                vec![]
            },
            Operation::HistoryFailed { stale } => {
                if self.accepts_history(*stale) {
                    self.history_settled = true;
                }
                vec![]
            },
            Operation::TransportDrop => {
                self.drop_connection();
                vec![]
            },
            Operation::AdvanceTime { secs } => {
                self.now = self.now + Duration::from_secs(u64::from(*secs));
                if let Some(started) = self.handshake_started
                    && self.now - started > self.handshake_timeout
                {
                    self.drop_connection();
                }
                vec![]
            },
            stream => {
                if self.status != ConnectionStatus::Disconnected {
                    self.apply_stream(stream);
                }
                vec![]
            },
        }
    }

    fn apply_stream(&mut self, op: &Operation) {
        match op {
            Operation::Welcome => {
                if self.status == ConnectionStatus::Connecting {
                    self.status = ConnectionStatus::Connected;
                    self.user_id = Some(OWN_USER_ID);
                    self.handshake_started = None;
                }
            },
            Operation::Live { id } => {
                self.transcript.deliver(message(*id));
            },
            Operation::Join { user: raw } => {
                let joined = user(*raw);
                match self.roster.iter_mut().find(|u| u.id == joined.id) {
                    Some(existing) => *existing = joined,
                    None => self.roster.push(joined),
                }
            },
            Operation::Leave { user } => {
                let id = user_id(*user);
                self.roster.retain(|u| u.id != id);
                self.typing.retain(|t| *t != id);
            },
            Operation::TypingStarted { user } => {
                let id = user_id(*user);
                if self.roster.iter().any(|u| u.id == id) && !self.typing.contains(&id) {
                    self.typing.push(id);
                }
            },
            Operation::TypingStopped { user } => {
                let id = user_id(*user);
                self.typing.retain(|t| *t != id);
            },
            Operation::Roster { users } => {
                let mut roster: Vec<User> = Vec::new();
                for joined in users.iter().copied().map(user) {
                    if !roster.iter().any(|u| u.id == joined.id) {
                        roster.push(joined);
                    }
                }
                self.roster = roster;
                let roster = &self.roster;
                self.typing.retain(|t| roster.iter().any(|u| u.id == *t));
            },
            _ => {},
        }
    }

    /// Observable projection.
    pub fn observable(&self) -> ObservableState {
        ObservableState {
            status: self.status,
            user_id: self.user_id,
            message_ids: self.transcript.ids(),
            roster: self.roster.clone(),
            typing: self.typing.clone(),
        }
    }

    /// Current generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Transcript.
    pub fn transcript(&self) -> &ModelTranscript {
        &self.transcript
    }

    fn accepts_history(&self, stale: bool) -> bool {
        tagged_generation(self.generation, stale) == self.generation
            && self.status != ConnectionStatus::Disconnected
            && !self.history_settled
    }

    fn drop_connection(&mut self) {
        self.status = ConnectionStatus::Disconnected;
        self.user_id = None;
        self.handshake_started = None;
        self.clear_presence();
    }

    fn clear_presence(&mut self) {
        self.roster.clear();
        self.typing.clear();
        self.own_typing = false;
    }
}
