//! Turns session snapshots into terminal lines.
//!
//! The terminal is append-only, so [`Transcript`] remembers what it already
//! printed and emits only the difference for each new snapshot. History that
//! lands after live messages is printed when it arrives rather than
//! reordered in place.

use std::collections::HashSet;

use chrono::{DateTime, FixedOffset, Local, Offset};
use murmur_core::{ConnectionStatus, Message, MessageId, MessageKind, SessionNotice, SessionState};

/// Printed-so-far tracker for one terminal.
#[derive(Debug)]
pub struct Transcript {
    printed: HashSet<MessageId>,
    status: ConnectionStatus,
    typing: Vec<String>,
    offset: FixedOffset,
}

impl Transcript {
    /// Create an empty transcript showing times in the local offset.
    pub fn new() -> Self {
        Self::with_offset(Local::now().offset().fix())
    }

    /// Create an empty transcript showing times at a fixed UTC offset.
    pub fn with_offset(offset: FixedOffset) -> Self {
        Self {
            printed: HashSet::new(),
            status: ConnectionStatus::default(),
            typing: Vec::new(),
            offset,
        }
    }

    /// Lines to print for a new snapshot.
    pub fn update(&mut self, state: &SessionState) -> Vec<String> {
        let mut lines = Vec::new();

        if state.status != self.status {
            if self.status == ConnectionStatus::Disconnected {
                self.printed.clear();
            }
            self.status = state.status;
            lines.push(status_line(state));
        }

        for message in &state.messages {
            if self.printed.insert(message.id) {
                lines.push(format_message(message, state, &self.offset));
            }
        }

        let typing: Vec<String> = state.typing_names().into_iter().map(str::to_string).collect();
        if typing != self.typing {
            if let Some(line) = typing_line(&typing) {
                lines.push(line);
            }
            self.typing = typing;
        }

        lines
    }
}

fn status_line(state: &SessionState) -> String {
    match (state.status, state.user_id) {
        (ConnectionStatus::Connected, Some(id)) => format!("-- connected as #{id}"),
        (status, _) => format!("-- {status}"),
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

fn typing_line(names: &[String]) -> Option<String> {
    let verb = match names.len() {
        0 => return None,
        1 => "is",
        _ => "are",
    };
    Some(format!("... {} {verb} typing", names.join(", ")))
}

/// Wall-clock time of a millisecond timestamp, `HH:MM:SS` at `offset`.
fn clock(timestamp: u64, offset: &FixedOffset) -> String {
    i64::try_from(timestamp)
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .map_or_else(
            || "--:--:--".to_string(),
            |t| t.with_timezone(offset).format("%H:%M:%S").to_string(),
        )
}

/// One transcript line, prefixed with the message's clock time.
pub fn format_message(message: &Message, state: &SessionState, offset: &FixedOffset) -> String {
    let time = clock(message.timestamp, offset);
    match message.kind {
        MessageKind::System => format!("[{time}] * {}", message.body),
        MessageKind::Broadcast => format!("[{time}] <{}> {}", message.sender_name, message.body),
        MessageKind::Private => {
            let to = message
                .recipient_id
                .and_then(|id| state.user(id))
                .map_or("?", |u| u.display_name.as_str());
            format!("[{time}] <{} -> {}> {}", message.sender_name, to, message.body)
        },
    }
}

/// One line for a notice.
pub fn format_notice(notice: &SessionNotice) -> String {
    match notice {
        SessionNotice::ConnectionLost { reason } => {
            format!("!! connection lost ({reason}), /connect to rejoin")
        },
        SessionNotice::HistoryUnavailable { reason } => {
            format!("!! history unavailable ({reason}), showing live messages only")
        },
    }
}

/// Roster listing for `/who`.
pub fn format_roster(state: &SessionState) -> Vec<String> {
    if state.roster.is_empty() {
        return vec!["-- nobody here".to_string()];
    }
    state
        .roster
        .iter()
        .map(|u| {
            let me = if state.user_id == Some(u.id) { " (you)" } else { "" };
            format!("  #{} {}{me}", u.id, u.display_name)
        })
        .collect()
}
