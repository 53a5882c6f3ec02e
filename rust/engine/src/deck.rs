use rand::Rng;
use serde_json::Value;
use std::fs;
use std::path::Path;

use crate::cards::Card;
use crate::errors::DeckError;

/// Immutable card source loaded once at startup.
///
/// The first record of the source is a header row describing the columns and
/// is never part of the draw pool. Draws are with replacement, so the deck
/// cannot run out.
#[derive(Debug, Clone)]
pub struct Deck {
    header: Value,
    cards: Vec<Card>,
}

impl Deck {
    /// Builds a deck from raw records, treating `records[0]` as the header.
    ///
    /// # Errors
    ///
    /// - [`DeckError::Empty`] if there is no record after the header
    /// - [`DeckError::InvalidCard`] if a playable record is not a valid [`Card`]
    pub fn from_records(records: Vec<Value>) -> Result<Self, DeckError> {
        let mut records = records.into_iter();
        let header = records.next().ok_or(DeckError::Empty)?;

        let cards = records
            .enumerate()
            .map(|(offset, record)| {
                serde_json::from_value::<Card>(record).map_err(|err| DeckError::InvalidCard {
                    index: offset + 1,
                    reason: err.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if cards.is_empty() {
            return Err(DeckError::Empty);
        }

        Ok(Self { header, cards })
    }

    pub fn from_json_str(raw: &str) -> Result<Self, DeckError> {
        let records: Vec<Value> = serde_json::from_str(raw)?;
        Self::from_records(records)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DeckError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Deck with a placeholder header and the given playable cards.
    pub fn with_cards(cards: Vec<Card>) -> Result<Self, DeckError> {
        if cards.is_empty() {
            return Err(DeckError::Empty);
        }
        Ok(Self {
            header: Value::String("header".into()),
            cards,
        })
    }

    /// Picks a playable card uniformly at random.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Card {
        let idx = rng.random_range(0..self.cards.len());
        self.cards[idx].clone()
    }

    pub fn header(&self) -> &Value {
        &self.header
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Number of playable cards (header excluded).
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}
