//! Roster and typing state.
//!
//! # Per-user state machine
//!
//! ```text
//!            join / roster               leave / roster exclusion / clear
//! absent  ────────────────> present  ─────────────────────────────────> absent
//!                              │  typing-started        typing-stopped,
//!                              └─> typing ──────────────> leave, clear
//! ```
//!
//! A typing signal for an absent user is ignored, so a late typing-started
//! arriving after a leave can never resurrect that user as typing.

use indexmap::{IndexMap, IndexSet};
use murmur_proto::{ClientCommand, User, UserId};

/// Presence tracker.
///
/// Sole owner of the roster. Also remembers the last typing indicator we
/// transmitted so repeated identical calls are not resent.
#[derive(Debug, Clone, Default)]
pub struct Presence {
    roster: IndexMap<UserId, User>,
    typing: IndexSet<UserId>,
    own_typing: bool,
}

impl Presence {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a user present. A rejoin with a new display name updates it.
    ///
    /// Returns `true` if anything changed.
    pub fn join(&mut self, user: User) -> bool {
        match self.roster.get_mut(&user.id) {
            Some(existing) if *existing == user => false,
            Some(existing) => {
                *existing = user;
                true
            },
            None => {
                self.roster.insert(user.id, user);
                true
            },
        }
    }

    /// Mark a user absent, clearing their typing indicator.
    ///
    /// Returns `true` if the user was present.
    pub fn leave(&mut self, user_id: UserId) -> bool {
        self.typing.shift_remove(&user_id);
        self.roster.shift_remove(&user_id).is_some()
    }

    /// Replace the roster wholesale. Typing entries for users missing from
    /// the snapshot are dropped.
    pub fn replace_roster(&mut self, users: Vec<User>) -> bool {
        let roster: IndexMap<UserId, User> = users.into_iter().map(|u| (u.id, u)).collect();
        if roster.iter().eq(self.roster.iter()) {
            return false;
        }
        self.roster = roster;
        self.typing.retain(|id| self.roster.contains_key(id));
        true
    }

    /// Apply a typing indicator from the stream.
    ///
    /// Returns `true` if the typing set changed.
    pub fn set_typing(&mut self, user_id: UserId, typing: bool) -> bool {
        if !typing {
            return self.typing.shift_remove(&user_id);
        }
        if !self.roster.contains_key(&user_id) {
            tracing::debug!(user_id, "ignoring typing signal for absent user");
            return false;
        }
        self.typing.insert(user_id)
    }

    /// Command to transmit our own typing state, if it differs from what we
    /// last sent.
    pub fn own_typing_command(&mut self, is_typing: bool) -> Option<ClientCommand> {
        if self.own_typing == is_typing {
            return None;
        }
        self.own_typing = is_typing;
        Some(ClientCommand::Typing { is_typing })
    }

    /// Unconditional `Typing { false }`, sent after every message.
    pub fn stop_own_typing(&mut self) -> ClientCommand {
        self.own_typing = false;
        ClientCommand::Typing { is_typing: false }
    }

    /// Last typing state we transmitted.
    pub fn own_typing(&self) -> bool {
        self.own_typing
    }

    /// Whether a user is present.
    pub fn is_present(&self, user_id: UserId) -> bool {
        self.roster.contains_key(&user_id)
    }

    /// Whether a user is typing.
    pub fn is_typing(&self, user_id: UserId) -> bool {
        self.typing.contains(&user_id)
    }

    /// Look up a present user.
    pub fn user(&self, user_id: UserId) -> Option<&User> {
        self.roster.get(&user_id)
    }

    /// Present users in join order.
    pub fn roster(&self) -> impl Iterator<Item = &User> {
        self.roster.values()
    }

    /// Typing users in the order they started.
    pub fn typing(&self) -> impl Iterator<Item = UserId> + '_ {
        self.typing.iter().copied()
    }

    /// Display names of typing users.
    pub fn typing_names(&self) -> Vec<&str> {
        self.typing
            .iter()
            .filter_map(|id| self.roster.get(id))
            .map(|u| u.display_name.as_str())
            .collect()
    }

    /// Drop all presence state.
    pub fn clear(&mut self) {
        self.roster.clear();
        self.typing.clear();
        self.own_typing = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leave_clears_typing_without_stop_event() {
        let mut presence = Presence::new();
        presence.join(User::new(1, "a"));
        presence.set_typing(1, true);
        assert!(presence.is_typing(1));

        presence.leave(1);

        assert!(!presence.is_present(1));
        assert!(!presence.is_typing(1));
    }

    #[test]
    fn typing_for_absent_user_is_ignored() {
        let mut presence = Presence::new();
        assert!(!presence.set_typing(9, true));
        assert_eq!(presence.typing().count(), 0);
    }

    #[test]
    fn rejoin_updates_display_name() {
        let mut presence = Presence::new();
        presence.join(User::new(1, "a"));
        assert!(!presence.join(User::new(1, "a")));
        assert!(presence.join(User::new(1, "b")));
        assert_eq!(presence.user(1).map(|u| u.display_name.as_str()), Some("b"));
    }

    #[test]
    fn roster_snapshot_prunes_typing() {
        let mut presence = Presence::new();
        presence.join(User::new(1, "a"));
        presence.join(User::new(2, "b"));
        presence.set_typing(1, true);
        presence.set_typing(2, true);

        presence.replace_roster(vec![User::new(2, "b"), User::new(3, "c")]);

        assert_eq!(presence.typing().collect::<Vec<_>>(), vec![2]);
        assert_eq!(presence.roster().map(|u| u.id).collect::<Vec<_>>(), vec![2, 3]);
    }

    #[test]
    fn own_typing_deduplicates() {
        let mut presence = Presence::new();
        assert_eq!(
            presence.own_typing_command(true),
            Some(ClientCommand::Typing { is_typing: true })
        );
        assert_eq!(presence.own_typing_command(true), None);
        assert_eq!(
            presence.own_typing_command(false),
            Some(ClientCommand::Typing { is_typing: false })
        );
        assert_eq!(presence.own_typing_command(false), None);
    }

    #[test]
    fn typing_names_follow_start_order() {
        let mut presence = Presence::new();
        presence.join(User::new(1, "alice"));
        presence.join(User::new(2, "bob"));
        presence.set_typing(2, true);
        presence.set_typing(1, true);

        assert_eq!(presence.typing_names(), vec!["bob", "alice"]);
    }
}
