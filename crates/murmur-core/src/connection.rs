//! Connection lifecycle state machine.
//!
//! Owns connection status, the display-name handshake, the handshake timeout
//! and local sequencing of inbound events. Uses the action pattern: methods
//! take time as input and return [`ConnectionAction`]s for the runtime to
//! execute.
//!
//! # State Machine
//!
//! ```text
//!                connect(name)              Welcome
//! ┌──────────────┐  ──────>  ┌────────────┐ ──────> ┌───────────┐
//! │ Disconnected │           │ Connecting │         │ Connected │
//! └──────────────┘  <──────  └────────────┘         └───────────┘
//!        ↑      disconnect / drop / timeout               │
//!        └────────────────────────────────────────────────┘
//!                        disconnect / drop
//! ```

use std::{
    ops::Sub,
    time::{Duration, Instant},
};

use murmur_proto::{ClientCommand, UserId};

use crate::{error::ValidationError, event::Sequenced, state::ConnectionStatus};

/// Time allowed between `connect` and the server's `Welcome`.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(30);

/// Actions returned by the connection state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionAction {
    /// Open the transport.
    Open,
    /// Send this command to the server.
    Send(ClientCommand),
    /// Close the transport.
    Close,
}

/// Session configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Timeout for the handshake acknowledgment.
    pub handshake_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT }
    }
}

/// Connection state machine.
///
/// Pure: no I/O and no clock. Time is passed to the methods that need it.
/// Generic over `I` so simulations can drive it with virtual time.
#[derive(Debug, Clone)]
pub struct ConnectionManager<I = Instant>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    status: ConnectionStatus,
    config: SessionConfig,
    /// Trimmed name sent with `Authenticate`. `None` while disconnected.
    display_name: Option<String>,
    /// Assigned by the server in `Welcome`.
    user_id: Option<UserId>,
    /// When the current handshake started. `None` unless connecting.
    handshake_started: Option<I>,
    /// Incremented by every accepted `connect`.
    generation: u64,
    /// Next inbound sequence number.
    next_seq: u64,
}

impl<I> ConnectionManager<I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    /// Create a manager in [`ConnectionStatus::Disconnected`].
    pub fn new(config: SessionConfig) -> Self {
        Self {
            status: ConnectionStatus::Disconnected,
            config,
            display_name: None,
            user_id: None,
            handshake_started: None,
            generation: 0,
            next_seq: 0,
        }
    }

    /// Current connection status.
    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// Whether the handshake has been acknowledged.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected
    }

    /// Display name of the current session. `None` while disconnected.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Our server-assigned id. `None` until acknowledged.
    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    /// Generation of the current (or most recent) session.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Configured handshake timeout.
    #[must_use]
    pub fn handshake_timeout(&self) -> Duration {
        self.config.handshake_timeout
    }

    /// Start a session.
    ///
    /// Transitions to `Connecting`, bumps the generation and returns
    /// `[Open, Send(Authenticate)]`.
    ///
    /// # Errors
    ///
    /// - `ValidationError::EmptyDisplayName` if the trimmed name is empty
    /// - `ValidationError::AlreadyActive` if not `Disconnected`
    pub fn connect(
        &mut self,
        display_name: &str,
        now: I,
    ) -> Result<Vec<ConnectionAction>, ValidationError> {
        if self.status != ConnectionStatus::Disconnected {
            return Err(ValidationError::AlreadyActive { status: self.status });
        }

        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(ValidationError::EmptyDisplayName);
        }

        self.status = ConnectionStatus::Connecting;
        self.generation += 1;
        self.display_name = Some(display_name.to_string());
        self.user_id = None;
        self.handshake_started = Some(now);

        Ok(vec![
            ConnectionAction::Open,
            ConnectionAction::Send(ClientCommand::Authenticate {
                display_name: display_name.to_string(),
            }),
        ])
    }

    /// Complete the handshake.
    ///
    /// Returns `true` if this moved us to `Connected`. A `Welcome` outside
    /// `Connecting` is ignored.
    pub fn acknowledge(&mut self, user_id: UserId) -> bool {
        if self.status != ConnectionStatus::Connecting {
            tracing::debug!(status = %self.status, user_id, "ignoring unexpected welcome");
            return false;
        }

        self.status = ConnectionStatus::Connected;
        self.user_id = Some(user_id);
        self.handshake_started = None;
        true
    }

    /// User-initiated teardown.
    ///
    /// Sends `Leave` and closes if a transport is open. Always ends in
    /// `Disconnected`.
    pub fn disconnect(&mut self) -> Vec<ConnectionAction> {
        let actions = if self.status == ConnectionStatus::Disconnected {
            vec![]
        } else {
            vec![ConnectionAction::Send(ClientCommand::Leave), ConnectionAction::Close]
        };

        self.reset();
        actions
    }

    /// Transport dropped underneath us.
    ///
    /// Returns `true` if this changed the status, `false` if we were already
    /// disconnected (for example, the close we asked for completing).
    pub fn transport_lost(&mut self) -> bool {
        if self.status == ConnectionStatus::Disconnected {
            return false;
        }
        self.reset();
        true
    }

    /// Elapsed handshake time, if the timeout has been exceeded.
    #[must_use]
    pub fn check_timeout(&self, now: I) -> Option<Duration> {
        let started = self.handshake_started?;
        if now < started {
            return None;
        }
        let elapsed = now - started;
        (elapsed > self.config.handshake_timeout).then_some(elapsed)
    }

    /// Periodic maintenance.
    ///
    /// Returns the elapsed time if the handshake timed out. The caller closes
    /// the transport and treats it as a drop.
    pub fn tick(&mut self, now: I) -> Option<Duration> {
        let elapsed = self.check_timeout(now)?;
        self.reset();
        Some(elapsed)
    }

    /// Tag an inbound event with the next local sequence number.
    pub fn sequence<T>(&mut self, event: T) -> Sequenced<T> {
        let seq = self.next_seq;
        self.next_seq += 1;
        Sequenced { seq, event }
    }

    fn reset(&mut self) {
        self.status = ConnectionStatus::Disconnected;
        self.display_name = None;
        self.user_id = None;
        self.handshake_started = None;
    }
}
