//! End-to-end scenarios for the real runtime.
//!
//! Each test runs `Runtime` over `SimDriver`/`SimHistory` on a paused tokio
//! clock and drives it only through `SessionHandle`, the way presentation
//! code does.

use std::time::Duration;

use murmur_client::{ClientConfig, Runtime, SessionHandle};
use murmur_core::{
    ClientCommand, ConnectionStatus, FetchError, HistoryBatch, ServerEvent, SessionNotice,
    SessionState, User,
};
use murmur_harness::{
    InvariantRegistry, SessionSnapshot, SimDriver, SimHistory, SimServer, log_message,
};
use tokio::{sync::broadcast, task::JoinHandle};

/// Upper bound on any wait, in virtual time.
const WAIT: Duration = Duration::from_secs(120);

const OWN_ID: u64 = 1;

struct Harness {
    handle: SessionHandle,
    server: SimServer,
    task: JoinHandle<()>,
}

fn config() -> ClientConfig {
    ClientConfig {
        server_url: "sim://chat".into(),
        history_url: "sim://history".into(),
        ..ClientConfig::default()
    }
}

fn start(history: SimHistory, configure: impl FnOnce(SimServer) -> SimServer) -> Harness {
    let (driver, server) = SimDriver::new();
    let server = configure(server);
    let (runtime, handle) = Runtime::new(driver, history, config());
    let task = tokio::spawn(runtime.run());
    Harness { handle, server, task }
}

fn start_welcoming(history: SimHistory) -> Harness {
    start(history, |server| server.with_auto_welcome(OWN_ID))
}

async fn until(
    handle: &mut SessionHandle,
    predicate: impl FnMut(&SessionState) -> bool,
) -> SessionState {
    let state = tokio::time::timeout(WAIT, handle.wait_for(predicate))
        .await
        .expect("condition not reached")
        .expect("runtime stopped");
    InvariantRegistry::standard().assert_all(&SessionSnapshot::from_state(state.clone()), "");
    state
}

async fn next_notice(notices: &mut broadcast::Receiver<SessionNotice>) -> SessionNotice {
    tokio::time::timeout(WAIT, notices.recv())
        .await
        .expect("no notice")
        .expect("notice channel closed")
}

async fn stop(harness: Harness) {
    harness.handle.shutdown().await.unwrap();
    tokio::time::timeout(WAIT, harness.task).await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn connect_merges_history_and_live() {
    let history = SimHistory::ready(HistoryBatch::new(vec![log_message(1), log_message(2)]));
    let mut h = start_welcoming(history);

    h.handle.connect("  alice ").await.unwrap();
    until(&mut h.handle, |s| s.is_connected() && s.messages.len() == 2).await;

    h.server.push(ServerEvent::Message(log_message(2)));
    h.server.push(ServerEvent::Message(log_message(3)));
    let state = until(&mut h.handle, |s| s.messages.len() == 3).await;

    assert_eq!(state.message_ids(), vec![1, 2, 3]);
    assert_eq!(state.user_id, Some(OWN_ID));
    assert_eq!(h.server.sent()[0], ClientCommand::Authenticate { display_name: "alice".into() });
    assert_eq!(h.server.opened_urls(), vec!["sim://chat".to_string()]);
    stop(h).await;
}

#[tokio::test(start_paused = true)]
async fn disconnect_before_history_resolves_stays_reset() {
    let (history, gate) = SimHistory::gated();
    let mut h = start_welcoming(history);

    h.handle.connect("alice").await.unwrap();
    until(&mut h.handle, SessionState::is_connected).await;
    assert_eq!(gate.fetches(), 1);

    h.handle.disconnect().await.unwrap();
    until(&mut h.handle, |s| s.status == ConnectionStatus::Disconnected).await;

    let released = gate.release(Ok(HistoryBatch::new(vec![log_message(1)])));
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert!(!released, "fetch should have been cancelled");
    assert!(h.handle.state().is_reset());
    assert_eq!(h.server.sent().last(), Some(&ClientCommand::Leave));
    stop(h).await;
}

#[tokio::test(start_paused = true)]
async fn history_failure_keeps_live_only() {
    let mut h = start_welcoming(SimHistory::failing(FetchError::Status(500)));
    let mut notices = h.handle.notices();

    h.handle.connect("alice").await.unwrap();
    let notice = next_notice(&mut notices).await;
    assert!(matches!(notice, SessionNotice::HistoryUnavailable { .. }));

    until(&mut h.handle, SessionState::is_connected).await;
    h.server.push(ServerEvent::Message(log_message(5)));
    h.server.push(ServerEvent::Message(log_message(4)));
    let state = until(&mut h.handle, |s| s.messages.len() == 2).await;

    assert_eq!(state.message_ids(), vec![5, 4]);
    assert!(state.is_connected());
    stop(h).await;
}

#[tokio::test(start_paused = true)]
async fn transport_drop_then_reconnect() {
    let mut h = start_welcoming(SimHistory::ready(HistoryBatch::default()));
    let mut notices = h.handle.notices();

    h.handle.connect("alice").await.unwrap();
    until(&mut h.handle, SessionState::is_connected).await;
    h.server.push(ServerEvent::UserJoined(User::new(2, "bob")));
    h.server.push(ServerEvent::TypingStarted { user_id: 2 });
    h.server.push(ServerEvent::Message(log_message(1)));
    until(&mut h.handle, |s| s.messages.len() == 1 && s.typing == vec![2]).await;

    h.server.drop_connection();
    let notice = next_notice(&mut notices).await;
    assert!(matches!(notice, SessionNotice::ConnectionLost { .. }));

    let state = until(&mut h.handle, |s| s.status == ConnectionStatus::Disconnected).await;
    assert!(state.roster.is_empty());
    assert!(state.typing.is_empty());
    assert_eq!(state.message_ids(), vec![1]);

    h.handle.connect("alice").await.unwrap();
    let state = until(&mut h.handle, SessionState::is_connected).await;
    assert!(state.messages.is_empty());
    assert_eq!(h.server.opened_urls().len(), 2);
    stop(h).await;
}

#[tokio::test(start_paused = true)]
async fn handshake_timeout_drops_connection() {
    let mut h = start(SimHistory::ready(HistoryBatch::default()), |server| server);
    let mut notices = h.handle.notices();

    h.handle.connect("alice").await.unwrap();
    until(&mut h.handle, |s| s.status == ConnectionStatus::Connecting).await;

    let notice = next_notice(&mut notices).await;
    match notice {
        SessionNotice::ConnectionLost { reason } => assert!(reason.contains("handshake")),
        other => panic!("unexpected notice {other:?}"),
    }
    until(&mut h.handle, |s| s.status == ConnectionStatus::Disconnected).await;
    assert!(!h.server.is_connected());
    stop(h).await;
}

#[tokio::test(start_paused = true)]
async fn send_echoes_and_stops_typing() {
    let mut h = start(SimHistory::ready(HistoryBatch::default()), |server| {
        server.with_auto_welcome(OWN_ID).with_echo(100)
    });

    h.handle.connect("alice").await.unwrap();
    until(&mut h.handle, SessionState::is_connected).await;
    h.handle.set_typing(true).await.unwrap();
    h.handle.set_typing(true).await.unwrap();
    h.handle.send_message("  hi  ").await.unwrap();
    h.handle.send_message("   ").await.unwrap();

    let state = until(&mut h.handle, |s| s.messages.len() == 1).await;
    assert_eq!(state.messages[0].id, 100);
    assert_eq!(state.messages[0].body, "hi");
    assert_eq!(h.server.take_sent(), vec![
        ClientCommand::Authenticate { display_name: "alice".into() },
        ClientCommand::Typing { is_typing: true },
        ClientCommand::SendBroadcast { body: "hi".into() },
        ClientCommand::Typing { is_typing: false },
    ]);
    stop(h).await;
}

#[tokio::test(start_paused = true)]
async fn private_message_to_present_user() {
    let mut h = start_welcoming(SimHistory::ready(HistoryBatch::default()));

    h.handle.connect("alice").await.unwrap();
    until(&mut h.handle, SessionState::is_connected).await;
    h.handle.send_private_message(2, "before join").await.unwrap();
    h.server.push(ServerEvent::Roster(vec![User::new(2, "bob")]));
    until(&mut h.handle, |s| s.roster.len() == 1).await;
    h.handle.send_private_message(2, "psst").await.unwrap();
    h.handle.disconnect().await.unwrap();
    until(&mut h.handle, |s| s.status == ConnectionStatus::Disconnected).await;

    let sent = h.server.sent();
    assert!(sent.contains(&ClientCommand::SendPrivate { recipient_id: 2, body: "psst".into() }));
    let early = ClientCommand::SendPrivate { recipient_id: 2, body: "before join".into() };
    assert!(!sent.contains(&early));
    stop(h).await;
}

#[tokio::test(start_paused = true)]
async fn refused_open_reports_loss_and_recovers() {
    let mut h = start_welcoming(SimHistory::ready(HistoryBatch::default()));
    let mut notices = h.handle.notices();
    h.server.refuse_opens(1);

    h.handle.connect("alice").await.unwrap();
    let notice = next_notice(&mut notices).await;
    assert!(matches!(notice, SessionNotice::ConnectionLost { .. }));
    assert!(h.server.sent().is_empty());

    h.handle.connect("alice").await.unwrap();
    until(&mut h.handle, SessionState::is_connected).await;
    stop(h).await;
}

#[tokio::test(start_paused = true)]
async fn send_failure_drops_connection() {
    let mut h = start_welcoming(SimHistory::ready(HistoryBatch::default()));
    let mut notices = h.handle.notices();

    h.handle.connect("alice").await.unwrap();
    until(&mut h.handle, SessionState::is_connected).await;
    h.server.fail_sends(true);
    h.handle.send_message("lost").await.unwrap();

    let notice = next_notice(&mut notices).await;
    assert!(matches!(notice, SessionNotice::ConnectionLost { .. }));
    until(&mut h.handle, |s| s.status == ConnectionStatus::Disconnected).await;
    assert!(!h.server.is_connected());
    stop(h).await;
}

#[tokio::test(start_paused = true)]
async fn inbound_events_reach_subscribers_in_sequence() {
    let mut h = start_welcoming(SimHistory::ready(HistoryBatch::default()));
    let mut events = h.handle.events();

    h.handle.connect("alice").await.unwrap();
    until(&mut h.handle, SessionState::is_connected).await;
    h.server.push(ServerEvent::UserJoined(User::new(2, "bob")));
    h.server.push(ServerEvent::TypingStarted { user_id: 2 });
    h.server.push(ServerEvent::Message(log_message(1)));

    let mut received = Vec::new();
    for _ in 0..4 {
        let event = tokio::time::timeout(WAIT, events.recv()).await.unwrap().unwrap();
        received.push(event);
    }

    let kinds: Vec<_> = received.iter().map(|e| e.event.name()).collect();
    assert_eq!(kinds, vec!["welcome", "user_joined", "typing_started", "message"]);
    assert!(received.windows(2).all(|pair| pair[0].seq < pair[1].seq));
    stop(h).await;
}

#[tokio::test(start_paused = true)]
async fn dropping_every_handle_stops_runtime() {
    let h = start_welcoming(SimHistory::ready(HistoryBatch::default()));
    let Harness { handle, task, .. } = h;

    drop(handle);

    tokio::time::timeout(WAIT, task).await.unwrap().unwrap();
}
