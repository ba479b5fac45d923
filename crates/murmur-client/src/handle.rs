//! Presentation-side handle to a running session.

use murmur_core::{Sequenced, ServerEvent, SessionNotice, SessionState, UserId};
use tokio::sync::{broadcast, mpsc, watch};

use crate::error::RuntimeError;

/// Requests from presentation to the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Start a session as this display name.
    Connect {
        /// Name to authenticate with. Trimmed by the session.
        display_name: String,
    },
    /// End the session and reset all session state.
    Disconnect,
    /// Send a broadcast message.
    SendMessage {
        /// Message text.
        body: String,
    },
    /// Send a private message.
    SendPrivate {
        /// Present user to deliver to.
        recipient_id: UserId,
        /// Message text.
        body: String,
    },
    /// Update our typing indicator.
    SetTyping(bool),
    /// Disconnect and stop the runtime.
    Shutdown,
}

/// Cloneable handle given to presentation code.
///
/// Writes go to the runtime as [`Intent`]s; reads come from the latest
/// published [`SessionState`] snapshot. Presentation never holds a mutable
/// reference to session state.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    intents: mpsc::Sender<Intent>,
    state: watch::Receiver<SessionState>,
    notices: broadcast::Sender<SessionNotice>,
    events: broadcast::Sender<Sequenced<ServerEvent>>,
}

impl SessionHandle {
    pub(crate) fn new(
        intents: mpsc::Sender<Intent>,
        state: watch::Receiver<SessionState>,
        notices: broadcast::Sender<SessionNotice>,
        events: broadcast::Sender<Sequenced<ServerEvent>>,
    ) -> Self {
        Self { intents, state, notices, events }
    }

    /// Start a session.
    pub async fn connect(&self, display_name: impl Into<String>) -> Result<(), RuntimeError> {
        self.submit(Intent::Connect { display_name: display_name.into() }).await
    }

    /// End the session.
    pub async fn disconnect(&self) -> Result<(), RuntimeError> {
        self.submit(Intent::Disconnect).await
    }

    /// Send a broadcast message.
    pub async fn send_message(&self, body: impl Into<String>) -> Result<(), RuntimeError> {
        self.submit(Intent::SendMessage { body: body.into() }).await
    }

    /// Send a private message.
    pub async fn send_private_message(
        &self,
        recipient_id: UserId,
        body: impl Into<String>,
    ) -> Result<(), RuntimeError> {
        self.submit(Intent::SendPrivate { recipient_id, body: body.into() }).await
    }

    /// Update our typing indicator.
    pub async fn set_typing(&self, is_typing: bool) -> Result<(), RuntimeError> {
        self.submit(Intent::SetTyping(is_typing)).await
    }

    /// Disconnect and stop the runtime.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.submit(Intent::Shutdown).await
    }

    /// Submit a raw intent.
    pub async fn submit(&self, intent: Intent) -> Result<(), RuntimeError> {
        self.intents.send(intent).await.map_err(|_| RuntimeError::Stopped)
    }

    /// Latest published snapshot.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Whether the latest snapshot is connected.
    pub fn is_connected(&self) -> bool {
        self.state.borrow().is_connected()
    }

    /// Wait for the next published snapshot.
    pub async fn changed(&mut self) -> Result<SessionState, RuntimeError> {
        self.state.changed().await.map_err(|_| RuntimeError::Stopped)?;
        Ok(self.state.borrow_and_update().clone())
    }

    /// Wait until a published snapshot satisfies `predicate`.
    pub async fn wait_for(
        &mut self,
        predicate: impl FnMut(&SessionState) -> bool,
    ) -> Result<SessionState, RuntimeError> {
        let state = self.state.wait_for(predicate).await.map_err(|_| RuntimeError::Stopped)?;
        Ok(state.clone())
    }

    /// Subscribe to notices published from now on.
    pub fn notices(&self) -> broadcast::Receiver<SessionNotice> {
        self.notices.subscribe()
    }

    /// Subscribe to inbound server events accepted from now on.
    ///
    /// Each arrives tagged with its local sequence number, strictly
    /// increasing in arrival order. Events received while disconnected are
    /// not delivered.
    pub fn events(&self) -> broadcast::Receiver<Sequenced<ServerEvent>> {
        self.events.subscribe()
    }
}
