use pointrush_engine::cards::Card;
use pointrush_engine::deck::Deck;
use pointrush_engine::engine::{Turn, TurnEngine};
use pointrush_engine::errors::GameError;
use pointrush_engine::game::{GamePhase, GameState};
use pointrush_engine::player::Player;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use thiserror::Error;

pub type SessionId = String;

const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);

/// Key-value persistence for serialized game snapshots, keyed by browser session.
pub trait SessionStore: Send + Sync + fmt::Debug {
    fn load(&self, id: &SessionId) -> Result<Option<String>, SessionError>;
    fn store(&self, id: &SessionId, snapshot: String) -> Result<(), SessionError>;
    /// Drops entries idle for longer than `ttl`, returning their ids.
    fn purge_expired(&self, ttl: Duration) -> Vec<SessionId>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug)]
struct StoredSnapshot {
    snapshot: String,
    last_active: Instant,
}

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: RwLock<HashMap<SessionId, StoredSnapshot>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn backdate(&self, id: &SessionId, by: Duration) {
        if let Ok(mut guard) = self.entries.write() {
            if let Some(entry) = guard.get_mut(id) {
                entry.last_active = Instant::now()
                    .checked_sub(by)
                    .unwrap_or(entry.last_active);
            }
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self, id: &SessionId) -> Result<Option<String>, SessionError> {
        let mut guard = self
            .entries
            .write()
            .map_err(|_| SessionError::StoragePoisoned)?;
        Ok(guard.get_mut(id).map(|entry| {
            entry.last_active = Instant::now();
            entry.snapshot.clone()
        }))
    }

    fn store(&self, id: &SessionId, snapshot: String) -> Result<(), SessionError> {
        let mut guard = self
            .entries
            .write()
            .map_err(|_| SessionError::StoragePoisoned)?;
        guard.insert(
            id.clone(),
            StoredSnapshot {
                snapshot,
                last_active: Instant::now(),
            },
        );
        Ok(())
    }

    fn purge_expired(&self, ttl: Duration) -> Vec<SessionId> {
        let mut expired = Vec::new();
        let mut guard = match self.entries.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.retain(|id, entry| {
            if entry.last_active.elapsed() > ttl {
                expired.push(id.clone());
                false
            } else {
                true
            }
        });
        expired
    }

    fn len(&self) -> usize {
        match self.entries.read() {
            Ok(guard) => guard.len(),
            Err(_) => 0,
        }
    }
}

/// Loads a browser's game, runs one engine operation on it and writes it back.
///
/// Nothing about a game lives outside the store between requests; every
/// call builds its own [`TurnEngine`] around the loaded snapshot.
#[derive(Debug)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    deck: Arc<Deck>,
    seed: Option<u64>,
    engines_built: AtomicU64,
    session_ttl: Duration,
}

impl SessionManager {
    pub fn new(deck: Arc<Deck>) -> Self {
        Self::with_store(Arc::new(MemorySessionStore::new()), deck)
    }

    pub fn with_store(store: Arc<dyn SessionStore>, deck: Arc<Deck>) -> Self {
        Self {
            store,
            deck,
            seed: None,
            engines_built: AtomicU64::new(0),
            session_ttl: DEFAULT_SESSION_TTL,
        }
    }

    /// Makes engines deterministic: the n-th engine is seeded with `seed + n`.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    pub fn deck(&self) -> Arc<Deck> {
        Arc::clone(&self.deck)
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    pub fn view(&self, id: &SessionId) -> Result<GameView, SessionError> {
        let state = self.load(id)?;
        Ok(GameView::from(&state))
    }

    pub fn start_game<I, S>(&self, id: &SessionId, names: I) -> Result<GameView, SessionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut engine = self.engine();
        let state = match engine.initialize(names) {
            Ok(state) => state,
            Err(err) => {
                tracing::info!(session_id = %id, error = %err, "rejected player setup");
                return Err(err.into());
            }
        };
        self.persist(id, &state)?;

        tracing::info!(
            session_id = %id,
            players = state.players().len(),
            first_player = state.current_player_index(),
            "match started"
        );
        Ok(GameView::from(&state))
    }

    pub fn play_round(&self, id: &SessionId) -> Result<RoundResult, SessionError> {
        let mut engine = self.engine();
        let mut state = self.load(id)?;

        let turn = match engine.play_round(&mut state) {
            Ok(turn) => turn,
            Err(err) => {
                tracing::debug!(
                    session_id = %id,
                    phase = ?state.phase(),
                    error = %err,
                    "round rejected"
                );
                return Err(err.into());
            }
        };
        self.persist(id, &state)?;

        tracing::debug!(
            session_id = %id,
            player_id = %turn.player,
            card_points = turn.card.points,
            points = turn.points,
            "round played"
        );
        if let Some(winner) = turn.winner {
            tracing::info!(session_id = %id, player_id = %winner, points = turn.points, "match won");
        }

        Ok(RoundResult {
            turn,
            state: GameView::from(&state),
        })
    }

    pub fn reset(&self, id: &SessionId) -> Result<GameView, SessionError> {
        let state = self.engine().reset();
        self.persist(id, &state)?;
        tracing::info!(session_id = %id, "match reset");
        Ok(GameView::from(&state))
    }

    /// Drops sessions idle longer than the TTL and returns how many went.
    pub fn cleanup_expired(&self) -> usize {
        let expired = self.store.purge_expired(self.session_ttl);
        for id in &expired {
            tracing::debug!(session_id = %id, "session expired");
        }
        expired.len()
    }

    pub fn active_sessions(&self) -> usize {
        self.store.len()
    }

    fn engine(&self) -> TurnEngine {
        let n = self.engines_built.fetch_add(1, Ordering::Relaxed);
        TurnEngine::new(self.deck(), self.seed.map(|seed| seed.wrapping_add(n)))
    }

    /// Missing or unreadable snapshots read as an empty setup state. Nothing
    /// is drawn here, so repeated reads of an unknown session agree.
    fn load(&self, id: &SessionId) -> Result<GameState, SessionError> {
        match self.store.load(id)? {
            None => Ok(GameState::setup(None)),
            Some(raw) => match serde_json::from_str::<GameState>(&raw) {
                Ok(state) => Ok(state),
                Err(err) => {
                    tracing::warn!(
                        session_id = %id,
                        error = %err,
                        "discarding corrupt game snapshot"
                    );
                    Ok(GameState::setup(None))
                }
            },
        }
    }

    fn persist(&self, id: &SessionId, state: &GameState) -> Result<(), SessionError> {
        let snapshot = serde_json::to_string(state)
            .map_err(|err| SessionError::Serialization(err.to_string()))?;
        self.store.store(id, snapshot)
    }
}

/// What the presentation layer shows for a game.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameView {
    pub phase: GamePhase,
    pub players: Vec<Player>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_player: Option<Player>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_card: Option<Card>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<Player>,
    pub winning_points: i64,
}

impl From<&GameState> for GameView {
    fn from(state: &GameState) -> Self {
        Self {
            phase: state.phase(),
            players: state.players().to_vec(),
            current_player: state.current_player().cloned(),
            current_card: state.current_card().cloned(),
            winner: state.winner().cloned(),
            winning_points: pointrush_engine::rules::WINNING_POINTS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoundResult {
    pub turn: Turn,
    pub state: GameView,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Game(#[from] GameError),
    #[error("Failed to serialize game state: {0}")]
    Serialization(String),
    #[error("Session storage poisoned")]
    StoragePoisoned,
}

impl SessionError {
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, SessionError::Game(err) if err.is_invalid_state())
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, SessionError::Game(err) if err.is_invalid_input())
    }
}

impl crate::errors::IntoErrorResponse for SessionError {
    fn status_code(&self) -> warp::http::StatusCode {
        use warp::http::StatusCode;
        match self {
            SessionError::Game(GameError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            SessionError::Game(GameError::InvalidState(_)) => StatusCode::CONFLICT,
            SessionError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            SessionError::StoragePoisoned => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            SessionError::Game(GameError::InvalidInput(_)) => "invalid_input",
            SessionError::Game(GameError::InvalidState(_)) => "invalid_state",
            SessionError::Serialization(_) => "serialization_error",
            SessionError::StoragePoisoned => "session_storage_error",
        }
    }

    fn error_message(&self) -> String {
        match self {
            SessionError::Game(GameError::InvalidInput(msg))
            | SessionError::Game(GameError::InvalidState(msg)) => msg.clone(),
            other => other.to_string(),
        }
    }

    fn severity(&self) -> crate::errors::ErrorSeverity {
        use crate::errors::ErrorSeverity;
        match self {
            SessionError::StoragePoisoned => ErrorSeverity::Critical,
            SessionError::Serialization(_) => ErrorSeverity::Server,
            SessionError::Game(_) => ErrorSeverity::Client,
        }
    }
}
