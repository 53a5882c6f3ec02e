use serde::{Deserialize, Serialize};
use std::fmt;

/// A single entry of the card deck.
/// Whoever draws it has `points` added to their total; the value may be negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Point delta applied to the drawing player
    pub points: i64,
    /// Optional display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Optional flavour text shown with the card
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Card {
    pub fn new(points: i64) -> Self {
        Self {
            points,
            name: None,
            description: None,
        }
    }

    pub fn named(name: impl Into<String>, points: i64) -> Self {
        Self {
            points,
            name: Some(name.into()),
            description: None,
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} ({:+})", name, self.points),
            None => write!(f, "{:+}", self.points),
        }
    }
}
