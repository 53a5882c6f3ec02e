use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::cards::Card;
use crate::deck::Deck;
use crate::errors::GameError;
use crate::game::GameState;
use crate::player::{Player, PlayerId};
use crate::rules::{normalize_names, WINNING_POINTS};

/// Outcome of one `play_round` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Player who drew
    pub player: PlayerId,
    /// Card drawn this turn
    pub card: Card,
    /// Drawing player's total after the card was applied
    pub points: i64,
    /// Winner declared by this turn, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<PlayerId>,
}

/// Drives a [`GameState`] through draw → apply → check → advance.
///
/// The engine owns its RNG but no game state, so one engine can be built per
/// request around a state loaded from storage.
///
/// # Examples
///
/// ```
/// use pointrush_engine::cards::Card;
/// use pointrush_engine::deck::Deck;
/// use pointrush_engine::engine::TurnEngine;
/// use std::sync::Arc;
///
/// let deck = Arc::new(Deck::with_cards(vec![Card::new(1000)]).unwrap());
/// let mut engine = TurnEngine::new(deck, Some(7));
///
/// let mut state = engine.initialize(["Ann", "Bo"]).unwrap();
/// let turn = engine.play_round(&mut state).unwrap();
///
/// assert_eq!(turn.points, 1000);
/// assert!(state.winner().is_some());
/// assert!(engine.play_round(&mut state).is_err());
/// ```
#[derive(Debug)]
pub struct TurnEngine {
    deck: Arc<Deck>,
    rng: ChaCha20Rng,
}

impl TurnEngine {
    pub fn new(deck: Arc<Deck>, seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(rand::random);
        Self {
            deck,
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    /// Starts a match: ids follow the order of the non-blank names and a
    /// random player goes first. No card has been drawn yet.
    ///
    /// # Errors
    ///
    /// [`GameError::InvalidInput`] when no name is left after trimming, or
    /// when more than [`MAX_PLAYERS`](crate::rules::MAX_PLAYERS) names remain.
    pub fn initialize<I, S>(&mut self, names: I) -> Result<GameState, GameError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = normalize_names(names)?;
        let players = names
            .into_iter()
            .enumerate()
            .map(|(id, name)| Player::new(id, name))
            .collect::<Result<Vec<_>, _>>()?;
        let first = self.rng.random_range(0..players.len());
        GameState::new(players, first)
    }

    pub fn draw_card(&mut self) -> Card {
        self.deck.draw(&mut self.rng)
    }

    /// Plays one full turn for the current player.
    ///
    /// # Errors
    ///
    /// [`GameError::InvalidState`] when there are no players or the match is
    /// already won; the state is left untouched.
    pub fn play_round(&mut self, state: &mut GameState) -> Result<Turn, GameError> {
        state.ensure_in_progress()?;

        let card = self.draw_card();
        let drawer = state.apply_card(&card)?;
        let player = drawer.id();
        let points = drawer.points();

        let winner = state.check_winner(WINNING_POINTS).map(Player::id);
        if winner.is_none() {
            state.advance_turn()?;
        }

        Ok(Turn {
            player,
            card,
            points,
            winner,
        })
    }

    /// Clears the match: no players, no winner, a freshly drawn card on display.
    pub fn reset(&mut self) -> GameState {
        let card = self.draw_card();
        GameState::setup(Some(card))
    }
}
