use crate::errors::GameError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable player identity, assigned by turn order when the match starts.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub usize);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A participant in a match and their running point total.
///
/// Two records describe the same player when their [`Player::key`] matches;
/// use the key with `sort_by_key` / `dedup_by_key` rather than comparing
/// whole records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Turn-order identifier (0-based)
    id: PlayerId,
    /// Display name
    name: String,
    /// Accumulated points
    points: i64,
}

impl Player {
    pub fn new(id: usize, name: impl Into<String>) -> Result<Self, GameError> {
        Self::with_points(id, name, 0)
    }

    pub fn with_points(id: usize, name: impl Into<String>, points: i64) -> Result<Self, GameError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(GameError::InvalidInput(format!(
                "player {id} has a blank name"
            )));
        }
        Ok(Self {
            id: PlayerId(id),
            name,
            points,
        })
    }

    /// Identity key used for ordering and deduplication.
    pub fn key(&self) -> PlayerId {
        self.id
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn points(&self) -> i64 {
        self.points
    }

    pub fn add_points(&mut self, delta: i64) {
        self.points = self.points.saturating_add(delta);
    }

    pub fn same_player(&self, other: &Player) -> bool {
        self.key() == other.key()
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.name, self.points)
    }
}
