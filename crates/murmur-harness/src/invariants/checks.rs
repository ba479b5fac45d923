//! Session invariants.

use std::collections::HashSet;

use murmur_core::ConnectionStatus;

use super::{Invariant, InvariantResult, SessionSnapshot};

/// The transcript holds at most one entry per message id.
pub struct UniqueMessageIds;

impl Invariant for UniqueMessageIds {
    fn name(&self) -> &'static str {
        "unique_message_ids"
    }

    fn check(&self, snapshot: &SessionSnapshot) -> InvariantResult {
        let mut seen = HashSet::new();
        for message in &snapshot.state.messages {
            if !seen.insert(message.id) {
                return Err(self.violation(format!("message {} appears twice", message.id)));
            }
        }
        Ok(())
    }
}

/// The roster holds at most one entry per user id.
pub struct UniqueRosterIds;

impl Invariant for UniqueRosterIds {
    fn name(&self) -> &'static str {
        "unique_roster_ids"
    }

    fn check(&self, snapshot: &SessionSnapshot) -> InvariantResult {
        let mut seen = HashSet::new();
        for user in &snapshot.state.roster {
            if !seen.insert(user.id) {
                return Err(self.violation(format!("user {} listed twice", user.id)));
            }
        }
        Ok(())
    }
}

/// No user who is not present is typing.
pub struct TypingImpliesPresent;

impl Invariant for TypingImpliesPresent {
    fn name(&self) -> &'static str {
        "typing_implies_present"
    }

    fn check(&self, snapshot: &SessionSnapshot) -> InvariantResult {
        let state = &snapshot.state;
        match state.typing.iter().find(|id| state.user(**id).is_none()) {
            Some(id) => Err(self.violation(format!(
                "user {id} typing but roster is {:?}",
                state.roster.iter().map(|u| u.id).collect::<Vec<_>>()
            ))),
            None => Ok(()),
        }
    }
}

/// Presence never outlives the connection.
pub struct DisconnectedHasNoPresence;

impl Invariant for DisconnectedHasNoPresence {
    fn name(&self) -> &'static str {
        "disconnected_has_no_presence"
    }

    fn check(&self, snapshot: &SessionSnapshot) -> InvariantResult {
        let state = &snapshot.state;
        if state.status != ConnectionStatus::Disconnected {
            return Ok(());
        }
        if !state.roster.is_empty() || !state.typing.is_empty() {
            return Err(self.violation(format!(
                "disconnected with {} present and {} typing",
                state.roster.len(),
                state.typing.len()
            )));
        }
        Ok(())
    }
}

/// Our own id is known exactly while connected.
pub struct OwnIdMatchesStatus;

impl Invariant for OwnIdMatchesStatus {
    fn name(&self) -> &'static str {
        "own_id_matches_status"
    }

    fn check(&self, snapshot: &SessionSnapshot) -> InvariantResult {
        let state = &snapshot.state;
        if state.user_id.is_some() == state.is_connected() {
            Ok(())
        } else {
            Err(self.violation(format!("status {} with user id {:?}", state.status, state.user_id)))
        }
    }
}

#[cfg(test)]
mod tests {
    use murmur_core::{Message, SessionState, User};

    use super::*;

    fn snapshot(state: SessionState) -> SessionSnapshot {
        SessionSnapshot::from_state(state)
    }

    #[test]
    fn duplicate_message_is_flagged() {
        let message = Message::broadcast(1, 2, "bob", "hi", 0);
        let state = SessionState { messages: vec![message.clone(), message], ..Default::default() };

        assert!(UniqueMessageIds.check(&snapshot(state)).is_err());
    }

    #[test]
    fn typing_absent_user_is_flagged() {
        let state = SessionState {
            status: ConnectionStatus::Connected,
            user_id: Some(1),
            roster: vec![User::new(2, "bob")],
            typing: vec![3],
            ..Default::default()
        };

        let violation = TypingImpliesPresent.check(&snapshot(state)).unwrap_err();
        assert_eq!(violation.invariant, "typing_implies_present");
    }

    #[test]
    fn roster_while_disconnected_is_flagged() {
        let state = SessionState { roster: vec![User::new(2, "bob")], ..Default::default() };
        assert!(DisconnectedHasNoPresence.check(&snapshot(state)).is_err());
    }

    #[test]
    fn connecting_has_no_own_id() {
        let state = SessionState { status: ConnectionStatus::Connecting, ..Default::default() };
        assert!(OwnIdMatchesStatus.check(&snapshot(state)).is_ok());

        let state = SessionState { status: ConnectionStatus::Connected, ..Default::default() };
        assert!(OwnIdMatchesStatus.check(&snapshot(state)).is_err());
    }
}
