use serde::{Deserialize, Serialize};

use crate::cards::Card;
use crate::errors::GameError;
use crate::player::Player;
use crate::rules::first_to_reach;

/// Lifecycle stage of a match, derived from the state itself.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    /// No players entered yet
    Setup,
    /// Players entered, nobody has won
    InProgress,
    /// A winner has been declared; only a reset leaves this phase
    Finished,
}

/// Single source of truth for one match.
///
/// Invariants, checked whenever a state is built or restored:
/// - player ids are `0..n` in list order
/// - `current_player_index < players.len()` when there are players
/// - a winner, if any, is one of the players
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawGameState")]
pub struct GameState {
    players: Vec<Player>,
    current_player_index: usize,
    current_card: Option<Card>,
    winner: Option<Player>,
}

#[derive(Deserialize)]
struct RawGameState {
    #[serde(default)]
    players: Vec<Player>,
    #[serde(default)]
    current_player_index: usize,
    #[serde(default)]
    current_card: Option<Card>,
    #[serde(default)]
    winner: Option<Player>,
}

impl TryFrom<RawGameState> for GameState {
    type Error = GameError;

    fn try_from(raw: RawGameState) -> Result<Self, Self::Error> {
        GameState::restore(
            raw.players,
            raw.current_player_index,
            raw.current_card,
            raw.winner,
        )
    }
}

impl GameState {
    /// A state with no players, waiting for names.
    pub fn setup(current_card: Option<Card>) -> Self {
        Self {
            players: Vec::new(),
            current_player_index: 0,
            current_card,
            winner: None,
        }
    }

    /// A fresh match with the given players, `current_player_index` going first.
    pub fn new(players: Vec<Player>, current_player_index: usize) -> Result<Self, GameError> {
        if players.is_empty() {
            return Err(GameError::InvalidInput(
                "a match needs at least one player".to_string(),
            ));
        }
        Self::restore(players, current_player_index, None, None)
    }

    /// Rebuilds a state from its parts, validating every invariant.
    pub fn restore(
        players: Vec<Player>,
        current_player_index: usize,
        current_card: Option<Card>,
        winner: Option<Player>,
    ) -> Result<Self, GameError> {
        for (expected, player) in players.iter().enumerate() {
            if player.id().0 != expected {
                return Err(GameError::InvalidState(format!(
                    "player ids must be sequential, found {} at position {expected}",
                    player.id()
                )));
            }
            if player.name().trim().is_empty() {
                return Err(GameError::InvalidState(format!(
                    "player {expected} has a blank name"
                )));
            }
        }

        if players.is_empty() {
            if current_player_index != 0 {
                return Err(GameError::InvalidState(
                    "current player index set without players".to_string(),
                ));
            }
        } else if current_player_index >= players.len() {
            return Err(GameError::InvalidState(format!(
                "current player index {current_player_index} out of bounds for {} players",
                players.len()
            )));
        }

        if let Some(w) = &winner {
            if !players.iter().any(|p| p.same_player(w)) {
                return Err(GameError::InvalidState(format!(
                    "winner {} is not part of the match",
                    w.id()
                )));
            }
        }

        Ok(Self {
            players,
            current_player_index,
            current_card,
            winner,
        })
    }

    pub fn phase(&self) -> GamePhase {
        if self.players.is_empty() {
            GamePhase::Setup
        } else if self.winner.is_some() {
            GamePhase::Finished
        } else {
            GamePhase::InProgress
        }
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn current_player_index(&self) -> usize {
        self.current_player_index
    }

    /// Player whose turn it is; `None` during setup.
    pub fn current_player(&self) -> Option<&Player> {
        self.players.get(self.current_player_index)
    }

    pub fn current_card(&self) -> Option<&Card> {
        self.current_card.as_ref()
    }

    pub fn winner(&self) -> Option<&Player> {
        self.winner.as_ref()
    }

    /// Adds the card's points to the current player and makes it the current card.
    pub fn apply_card(&mut self, card: &Card) -> Result<&Player, GameError> {
        self.ensure_in_progress()?;
        let idx = self.current_player_index;
        self.players[idx].add_points(card.points);
        self.current_card = Some(card.clone());
        Ok(&self.players[idx])
    }

    /// Declares the first player (in list order) at or above `threshold` the winner.
    ///
    /// An already declared winner is kept.
    pub fn check_winner(&mut self, threshold: i64) -> Option<&Player> {
        if self.winner.is_none() {
            self.winner = first_to_reach(&self.players, threshold).cloned();
        }
        self.winner.as_ref()
    }

    /// Passes the turn to the next player, wrapping around.
    ///
    /// Returns `Ok(false)` without moving when the match is already won.
    pub fn advance_turn(&mut self) -> Result<bool, GameError> {
        match self.phase() {
            GamePhase::Setup => Err(GameError::InvalidState(
                "no match in progress".to_string(),
            )),
            GamePhase::Finished => Ok(false),
            GamePhase::InProgress => {
                self.current_player_index = (self.current_player_index + 1) % self.players.len();
                Ok(true)
            }
        }
    }

    pub(crate) fn ensure_in_progress(&self) -> Result<(), GameError> {
        match self.phase() {
            GamePhase::InProgress => Ok(()),
            GamePhase::Setup => Err(GameError::InvalidState(
                "no match in progress; enter player names first".to_string(),
            )),
            GamePhase::Finished => Err(GameError::InvalidState(
                "match is over; reset to play again".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::PlayerId;

    fn players(points: &[i64]) -> Vec<Player> {
        points
            .iter()
            .enumerate()
            .map(|(i, p)| Player::with_points(i, format!("p{i}"), *p).expect("player"))
            .collect()
    }

    #[test]
    fn setup_state_has_no_current_player() {
        let gs = GameState::setup(Some(Card::new(5)));
        assert_eq!(gs.phase(), GamePhase::Setup);
        assert!(gs.current_player().is_none());
        assert_eq!(gs.current_card(), Some(&Card::new(5)));
    }

    #[test]
    fn new_rejects_out_of_bounds_index() {
        let err = GameState::new(players(&[0, 0]), 2).unwrap_err();
        assert!(err.is_invalid_state());
    }

    #[test]
    fn restore_rejects_non_sequential_ids() {
        let ps = vec![
            Player::new(0, "Ann").expect("player"),
            Player::new(3, "Bo").expect("player"),
        ];
        assert!(GameState::restore(ps, 0, None, None).is_err());
    }

    #[test]
    fn restore_rejects_foreign_winner() {
        let stranger = Player::with_points(7, "X", 1000).expect("player");
        assert!(GameState::restore(players(&[0]), 0, None, Some(stranger)).is_err());
    }

    #[test]
    fn apply_card_credits_current_player() {
        let mut gs = GameState::new(players(&[0, 0, 0]), 1).expect("state");
        gs.apply_card(&Card::new(40)).expect("apply");
        gs.apply_card(&Card::new(-15)).expect("apply");
        assert_eq!(gs.players()[1].points(), 25);
        assert_eq!(gs.players()[0].points(), 0);
        assert_eq!(gs.current_player().map(Player::points), Some(25));
        assert_eq!(gs.current_card(), Some(&Card::new(-15)));
    }

    #[test]
    fn check_winner_uses_first_in_order() {
        let mut gs = GameState::new(players(&[1200, 1500]), 0).expect("state");
        let winner = gs.check_winner(1000).expect("winner");
        assert_eq!(winner.id(), PlayerId(0));
        assert_eq!(gs.phase(), GamePhase::Finished);
    }

    #[test]
    fn advance_turn_wraps_and_stops_after_win() {
        let mut gs = GameState::new(players(&[0, 0]), 1).expect("state");
        assert!(gs.advance_turn().expect("advance"));
        assert_eq!(gs.current_player_index(), 0);

        let mut finished = GameState::new(players(&[1000, 0]), 1).expect("state");
        finished.check_winner(1000);
        assert!(!finished.advance_turn().expect("advance"));
        assert_eq!(finished.current_player_index(), 1);
    }

    #[test]
    fn advance_turn_in_setup_is_invalid_state() {
        let mut gs = GameState::setup(None);
        assert!(gs.advance_turn().unwrap_err().is_invalid_state());
    }

    #[test]
    fn deserialization_validates_invariants() {
        let gs = GameState::new(players(&[10, 20]), 1).expect("state");
        let json = serde_json::to_string(&gs).expect("serialize");
        let back: GameState = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, gs);

        let broken = r#"{"players":[{"id":0,"name":"Ann","points":0}],"current_player_index":4}"#;
        assert!(serde_json::from_str::<GameState>(broken).is_err());
    }
}
