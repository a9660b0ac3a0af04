//! The known-players list.

use std::collections::BTreeMap;

use transport::PlayerId;

/// Players known to this endpoint, by ID.
///
/// On the host this is every connected peer; on a peer it is filled from
/// the roster replay and announcements.
#[derive(Debug, Default)]
pub struct Roster {
    players: BTreeMap<PlayerId, String>,
}

impl Roster {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records or updates a player's username.
    pub fn insert(&mut self, player: PlayerId, username: impl Into<String>) {
        self.players.insert(player, username.into());
    }

    pub fn remove(&mut self, player: PlayerId) -> Option<String> {
        self.players.remove(&player)
    }

    #[must_use]
    pub fn contains(&self, player: PlayerId) -> bool {
        self.players.contains_key(&player)
    }

    #[must_use]
    pub fn username(&self, player: PlayerId) -> Option<&str> {
        self.players.get(&player).map(String::as_str)
    }

    /// All known players in ascending ID order.
    #[must_use]
    pub fn players(&self) -> Vec<(PlayerId, String)> {
        self.players
            .iter()
            .map(|(id, name)| (*id, name.clone()))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.players.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_remove_listing() {
        let mut roster = Roster::new();
        roster.insert(2, "alice");
        roster.insert(3, "bob");
        assert!(roster.contains(2));
        assert_eq!(roster.username(3), Some("bob"));
        assert_eq!(
            roster.players(),
            vec![(2, "alice".to_owned()), (3, "bob".to_owned())]
        );

        assert_eq!(roster.remove(2), Some("alice".to_owned()));
        assert!(!roster.contains(2));
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn reinsert_updates_username() {
        let mut roster = Roster::new();
        roster.insert(2, "alice");
        roster.insert(2, "alice2");
        assert_eq!(roster.username(2), Some("alice2"));
        assert_eq!(roster.len(), 1);
    }
}
