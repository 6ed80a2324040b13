//! The roster: who is registered, who is connected, and who is winning.
//!
//! Entries are keyed by their login character and kept in login order.
//! A disconnect only detaches the endpoint; the entry, its entity handle
//! and its points stay so the same character can log in again and pick up
//! where it left off.

use asciiarena_protocol::{EntityId, LoginStatus};
use asciiarena_transport::Endpoint;
use tracing::{debug, info, warn};

use crate::{RoomConfig, RoomError};

/// One roster entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    character: char,
    endpoint: Option<Endpoint>,
    entity: Option<EntityId>,
    points: u32,
}

impl Player {
    fn new(character: char, endpoint: Endpoint) -> Self {
        Self {
            character,
            endpoint: Some(endpoint),
            entity: None,
            points: 0,
        }
    }

    pub fn character(&self) -> char {
        self.character
    }

    /// The endpoint this player is connected through, if any.
    pub fn endpoint(&self) -> Option<Endpoint> {
        self.endpoint
    }

    pub fn is_connected(&self) -> bool {
        self.endpoint.is_some()
    }

    /// The entity this player controls in the current arena.
    pub fn entity(&self) -> Option<EntityId> {
        self.entity
    }

    pub fn points(&self) -> u32 {
        self.points
    }
}

/// Result of [`Room::add_player`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Addition {
    /// A new entry was created.
    Added,
    /// A detached entry with the same character was re-attached.
    Reused,
    /// Every seat is taken.
    RoomComplete,
    /// The character is taken by a connected player.
    AlreadyExists,
}

impl From<Addition> for LoginStatus {
    fn from(addition: Addition) -> Self {
        match addition {
            Addition::Added => LoginStatus::Logged,
            Addition::Reused => LoginStatus::Reconnected,
            Addition::RoomComplete => LoginStatus::RoomCompleted,
            Addition::AlreadyExists => LoginStatus::AlreadyExists,
        }
    }
}

/// Parses a login character: exactly one uppercase ASCII letter.
///
/// # Errors
/// Returns `RoomError::InvalidCharacter` for anything else.
pub fn parse_character(raw: &str) -> Result<char, RoomError> {
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_uppercase() => Ok(c),
        _ => Err(RoomError::InvalidCharacter(raw.to_string())),
    }
}

/// The player roster of the single game room.
#[derive(Debug)]
pub struct Room {
    config: RoomConfig,
    players: Vec<Player>,
}

impl Room {
    pub fn new(config: RoomConfig) -> Self {
        Self {
            config,
            players: Vec::new(),
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Seats in the room.
    pub fn size(&self) -> usize {
        self.config.players
    }

    pub fn points_to_win(&self) -> u32 {
        self.config.points_to_win
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Returns `true` once every seat has a roster entry.
    pub fn is_complete(&self) -> bool {
        self.players.len() >= self.config.players
    }

    // -----------------------------------------------------------------------
    // Logins
    // -----------------------------------------------------------------------

    /// Validates `raw` and registers it for `endpoint`.
    ///
    /// Invalid characters leave the roster untouched.
    pub fn login(&mut self, raw: &str, endpoint: Endpoint) -> LoginStatus {
        match parse_character(raw) {
            Ok(character) => self.add_player(character, endpoint).into(),
            Err(e) => {
                warn!(%endpoint, error = %e, "login attempt with invalid character");
                LoginStatus::InvalidCharacter
            }
        }
    }

    /// Registers `character` for `endpoint`.
    ///
    /// A detached entry with the same character is re-attached even when
    /// the room is complete, keeping its entity and points.
    pub fn add_player(&mut self, character: char, endpoint: Endpoint) -> Addition {
        if let Some(player) = self.player_mut(character) {
            if player.is_connected() {
                debug!(%character, %endpoint, "character already connected");
                return Addition::AlreadyExists;
            }
            player.endpoint = Some(endpoint);
            info!(%character, %endpoint, "player reconnected");
            return Addition::Reused;
        }

        if self.is_complete() {
            debug!(%character, %endpoint, "room complete");
            return Addition::RoomComplete;
        }

        self.players.push(Player::new(character, endpoint));
        info!(%character, %endpoint, "player registered");
        Addition::Added
    }

    /// Clears the endpoint of whichever player uses it. Returns the
    /// character of that player.
    pub fn detach(&mut self, endpoint: Endpoint) -> Option<char> {
        let player = self
            .players
            .iter_mut()
            .find(|p| p.endpoint == Some(endpoint))?;
        player.endpoint = None;
        info!(character = %player.character, %endpoint, "player disconnected");
        Some(player.character)
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    pub fn player(&self, character: char) -> Option<&Player> {
        self.players.iter().find(|p| p.character == character)
    }

    fn player_mut(&mut self, character: char) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.character == character)
    }

    pub fn player_with_endpoint(&self, endpoint: Endpoint) -> Option<&Player> {
        self.players.iter().find(|p| p.endpoint == Some(endpoint))
    }

    /// Every roster entry, in login order.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    /// Every registered character, in login order.
    pub fn characters(&self) -> Vec<char> {
        self.players.iter().map(|p| p.character).collect()
    }

    /// Characters of players that are currently connected.
    pub fn connected_characters(&self) -> Vec<char> {
        self.players
            .iter()
            .filter(|p| p.is_connected())
            .map(|p| p.character)
            .collect()
    }

    /// Endpoints of every connected player.
    pub fn endpoints(&self) -> Vec<Endpoint> {
        self.players.iter().filter_map(|p| p.endpoint).collect()
    }

    // -----------------------------------------------------------------------
    // Arena bookkeeping
    // -----------------------------------------------------------------------

    /// Binds `character` to its entity in a freshly loaded arena.
    ///
    /// # Errors
    /// Returns `RoomError::UnknownCharacter` if nobody uses `character`.
    pub fn attach_entity(&mut self, character: char, entity: EntityId) -> Result<(), RoomError> {
        let player = self
            .player_mut(character)
            .ok_or(RoomError::UnknownCharacter(character))?;
        player.entity = Some(entity);
        Ok(())
    }

    /// Drops every entity binding. Called before a new arena is attached.
    pub fn release_entities(&mut self) {
        for player in &mut self.players {
            player.entity = None;
        }
    }

    /// Awards one point to `character` and returns its new total.
    ///
    /// # Errors
    /// Returns `RoomError::UnknownCharacter` if nobody uses `character`.
    pub fn add_point(&mut self, character: char) -> Result<u32, RoomError> {
        let player = self
            .player_mut(character)
            .ok_or(RoomError::UnknownCharacter(character))?;
        player.points += 1;
        Ok(player.points)
    }

    /// Characters whose points reached the points-to-win threshold.
    pub fn winners(&self) -> Vec<char> {
        self.players
            .iter()
            .filter(|p| p.points >= self.config.points_to_win)
            .map(|p| p.character)
            .collect()
    }

    /// Removes every roster entry.
    pub fn clear(&mut self) {
        self.players.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(players: usize) -> Room {
        Room::new(RoomConfig {
            players,
            points_to_win: 2,
        })
    }

    #[test]
    fn test_parse_character_accepts_single_uppercase_letter() {
        assert_eq!(parse_character("A").unwrap(), 'A');
        assert_eq!(parse_character("Z").unwrap(), 'Z');
    }

    #[test]
    fn test_parse_character_rejects_everything_else() {
        for raw in ["", "a", "AB", "1", "@", "Ä", " "] {
            assert!(
                matches!(parse_character(raw), Err(RoomError::InvalidCharacter(_))),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_login_with_invalid_character_leaves_roster_unchanged() {
        let mut room = room(2);
        room.login("A", Endpoint::new(1));

        assert_eq!(room.login("b", Endpoint::new(2)), LoginStatus::InvalidCharacter);
        assert_eq!(room.login("", Endpoint::new(2)), LoginStatus::InvalidCharacter);
        assert_eq!(room.characters(), vec!['A']);
        assert_eq!(room.endpoints(), vec![Endpoint::new(1)]);
    }

    #[test]
    fn test_add_player_outcomes() {
        let mut room = room(2);
        assert_eq!(room.add_player('A', Endpoint::new(1)), Addition::Added);
        assert_eq!(room.add_player('A', Endpoint::new(2)), Addition::AlreadyExists);
        assert_eq!(room.add_player('B', Endpoint::new(2)), Addition::Added);
        assert!(room.is_complete());
        assert_eq!(room.add_player('C', Endpoint::new(3)), Addition::RoomComplete);
        assert_eq!(room.characters(), vec!['A', 'B']);
    }

    #[test]
    fn test_reconnection_reuses_the_entry() {
        let mut room = room(2);
        room.add_player('A', Endpoint::new(1));
        room.add_player('B', Endpoint::new(2));
        room.attach_entity('A', EntityId(4)).unwrap();
        room.add_point('A').unwrap();

        assert_eq!(room.detach(Endpoint::new(1)), Some('A'));
        assert_eq!(room.connected_characters(), vec!['B']);

        // The room is complete, but 'A' holds a detached seat.
        assert_eq!(room.login("A", Endpoint::new(7)), LoginStatus::Reconnected);
        assert_eq!(room.len(), 2);

        let a = room.player('A').unwrap();
        assert_eq!(a.endpoint(), Some(Endpoint::new(7)));
        assert_eq!(a.entity(), Some(EntityId(4)));
        assert_eq!(a.points(), 1);
    }

    #[test]
    fn test_detach_unknown_endpoint_is_none() {
        let mut room = room(2);
        room.add_player('A', Endpoint::new(1));
        assert_eq!(room.detach(Endpoint::new(9)), None);
        assert!(room.player('A').unwrap().is_connected());
    }

    #[test]
    fn test_player_with_endpoint() {
        let mut room = room(2);
        room.add_player('A', Endpoint::new(1));
        room.add_player('B', Endpoint::new(2));
        assert_eq!(
            room.player_with_endpoint(Endpoint::new(2)).map(Player::character),
            Some('B')
        );
        room.detach(Endpoint::new(2));
        assert!(room.player_with_endpoint(Endpoint::new(2)).is_none());
    }

    #[test]
    fn test_attach_entity_unknown_character() {
        let mut room = room(2);
        assert!(matches!(
            room.attach_entity('Q', EntityId(0)),
            Err(RoomError::UnknownCharacter('Q'))
        ));
    }

    #[test]
    fn test_release_entities() {
        let mut room = room(1);
        room.add_player('A', Endpoint::new(1));
        room.attach_entity('A', EntityId(0)).unwrap();
        room.release_entities();
        assert_eq!(room.player('A').unwrap().entity(), None);
    }

    #[test]
    fn test_winners_reach_points_to_win() {
        let mut room = room(2);
        room.add_player('A', Endpoint::new(1));
        room.add_player('B', Endpoint::new(2));

        assert_eq!(room.add_point('B').unwrap(), 1);
        assert!(room.winners().is_empty());
        assert_eq!(room.add_point('B').unwrap(), 2);
        assert_eq!(room.winners(), vec!['B']);
    }

    #[test]
    fn test_clear_empties_the_roster() {
        let mut room = room(2);
        room.add_player('A', Endpoint::new(1));
        room.clear();
        assert!(room.is_empty());
        assert!(!room.is_complete());
        assert_eq!(room.add_player('A', Endpoint::new(2)), Addition::Added);
    }
}
