//! Simulation driver implementing the Driver trait.
//!
//! `SimDriver` gives the real [`murmur_client::Runtime`] an in-memory
//! connection. The paired [`SimServer`] is the test's side of that
//! connection: it pushes server events, drops the connection, refuses opens
//! and records every command the runtime sent. It can also answer
//! `Authenticate` with a `Welcome` and echo broadcasts back, like the real
//! service does.
//!
//! Time is `tokio::time::Instant`, so tests on a paused clock control the
//! handshake timeout deterministically.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use murmur_client::{Driver, TransportError};
use murmur_core::{ClientCommand, Message, ServerEvent, UserId};
use tokio::{sync::mpsc, time::Instant};

/// Server-side state shared between driver and server handle.
#[derive(Debug, Default)]
struct Shared {
    connection: Option<mpsc::UnboundedSender<ServerEvent>>,
    sent: Vec<ClientCommand>,
    opened_urls: Vec<String>,
    refuse_opens: usize,
    fail_sends: bool,
    auto_welcome: Option<UserId>,
    echo_from: Option<u64>,
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Simulated connection for the runtime.
#[derive(Debug)]
pub struct SimDriver {
    shared: Arc<Mutex<Shared>>,
    events: Option<mpsc::UnboundedReceiver<ServerEvent>>,
}

/// Test-side handle to a [`SimDriver`]'s connection.
#[derive(Debug, Clone)]
pub struct SimServer {
    shared: Arc<Mutex<Shared>>,
}

impl SimDriver {
    /// Create a driver and the server handle controlling it.
    pub fn new() -> (Self, SimServer) {
        let shared = Arc::new(Mutex::new(Shared::default()));
        let driver = Self { shared: Arc::clone(&shared), events: None };
        (driver, SimServer { shared })
    }
}

impl SimServer {
    /// Answer every `Authenticate` with `Welcome { user_id }`.
    #[must_use]
    pub fn with_auto_welcome(self, user_id: UserId) -> Self {
        lock(&self.shared).auto_welcome = Some(user_id);
        self
    }

    /// Echo every broadcast back as a message, assigning ids from `first_id`.
    #[must_use]
    pub fn with_echo(self, first_id: u64) -> Self {
        lock(&self.shared).echo_from = Some(first_id);
        self
    }

    /// Refuse the next `count` open attempts.
    pub fn refuse_opens(&self, count: usize) {
        lock(&self.shared).refuse_opens = count;
    }

    /// Make every send fail until turned off.
    pub fn fail_sends(&self, fail: bool) {
        lock(&self.shared).fail_sends = fail;
    }

    /// Push an event on the current connection.
    ///
    /// Returns `false` if no connection is open.
    pub fn push(&self, event: ServerEvent) -> bool {
        lock(&self.shared).connection.as_ref().is_some_and(|tx| tx.send(event).is_ok())
    }

    /// Drop the current connection from the server side.
    pub fn drop_connection(&self) {
        lock(&self.shared).connection = None;
    }

    /// Whether a connection is open.
    pub fn is_connected(&self) -> bool {
        lock(&self.shared).connection.as_ref().is_some_and(|tx| !tx.is_closed())
    }

    /// Every command received so far, in order.
    pub fn sent(&self) -> Vec<ClientCommand> {
        lock(&self.shared).sent.clone()
    }

    /// Take the commands received so far.
    pub fn take_sent(&self) -> Vec<ClientCommand> {
        std::mem::take(&mut lock(&self.shared).sent)
    }

    /// URLs of every accepted open.
    pub fn opened_urls(&self) -> Vec<String> {
        lock(&self.shared).opened_urls.clone()
    }
}

impl Shared {
    fn respond(&mut self, command: &ClientCommand) {
        let reply = match command {
            ClientCommand::Authenticate { .. } => {
                self.auto_welcome.map(|user_id| ServerEvent::Welcome { user_id })
            },
            ClientCommand::SendBroadcast { body } => self.echo_from.as_mut().map(|next| {
                let id = *next;
                *next += 1;
                let sender = self.auto_welcome.unwrap_or_default();
                ServerEvent::Message(Message::broadcast(id, sender, "me", body.clone(), id))
            }),
            ClientCommand::SendPrivate { recipient_id, body } => {
                self.echo_from.as_mut().map(|next| {
                    let id = *next;
                    *next += 1;
                    let sender = self.auto_welcome.unwrap_or_default();
                    ServerEvent::Message(Message::private(
                        id,
                        sender,
                        "me",
                        *recipient_id,
                        body.clone(),
                        id,
                    ))
                })
            },
            _ => None,
        };

        if let (Some(reply), Some(tx)) = (reply, &self.connection)
            && tx.send(reply).is_err()
        {
            tracing::debug!("simulated reply dropped, connection closed");
        }
    }
}

impl Driver for SimDriver {
    type Error = TransportError;
    type Instant = Instant;

    async fn open(&mut self, url: &str) -> Result<(), Self::Error> {
        let mut shared = lock(&self.shared);
        if shared.refuse_opens > 0 {
            shared.refuse_opens -= 1;
            return Err(TransportError::Connection(format!("{url}: refused")));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        shared.connection = Some(tx);
        shared.opened_urls.push(url.to_string());
        drop(shared);

        self.events = Some(rx);
        Ok(())
    }

    async fn send(&mut self, command: ClientCommand) -> Result<(), Self::Error> {
        if self.events.is_none() {
            return Err(TransportError::NotOpen);
        }

        let mut shared = lock(&self.shared);
        if shared.fail_sends {
            return Err(TransportError::Send("simulated write failure".into()));
        }
        shared.respond(&command);
        shared.sent.push(command);
        Ok(())
    }

    async fn recv(&mut self) -> Option<ServerEvent> {
        let events = self.events.as_mut()?;
        let event = events.recv().await;
        if event.is_none() {
            self.events = None;
        }
        event
    }

    fn is_open(&self) -> bool {
        self.events.is_some()
    }

    async fn close(&mut self) {
        self.events = None;
        lock(&self.shared).connection = None;
    }

    fn now(&self) -> Self::Instant {
        Instant::now()
    }
}
