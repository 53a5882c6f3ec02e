//! # pointrush-engine: Turn Engine for a Points Race Card Game
//!
//! Players take turns drawing a card from a shared deck; the card's points
//! go to whoever drew it, and the first player (in turn order) to reach
//! [`rules::WINNING_POINTS`] wins the match.
//!
//! ## Core Modules
//!
//! - [`cards`] - Card records
//! - [`deck`] - Immutable deck with a non-playable header row
//! - [`player`] - Player identity and point totals
//! - [`game`] - Game state, phases and per-turn transitions
//! - [`engine`] - Turn orchestration with a seeded RNG
//! - [`rules`] - Winning threshold, name validation, tie-break
//! - [`errors`] - Error types for game and deck operations
//!
//! ## Quick Start
//!
//! ```rust
//! use pointrush_engine::deck::Deck;
//! use pointrush_engine::engine::TurnEngine;
//! use pointrush_engine::game::GamePhase;
//! use std::sync::Arc;
//!
//! let deck = Deck::from_json_str(
//!     r#"[{"name": "Name", "points": "Points"}, {"points": 400}, {"points": 700}]"#,
//! )
//! .unwrap();
//! let mut engine = TurnEngine::new(Arc::new(deck), Some(42));
//!
//! let mut state = engine.initialize(["Ann", "Bo"]).unwrap();
//! while state.phase() == GamePhase::InProgress {
//!     engine.play_round(&mut state).unwrap();
//! }
//! println!("winner: {}", state.winner().unwrap());
//! ```

pub mod cards;
pub mod deck;
pub mod engine;
pub mod errors;
pub mod game;
pub mod player;
pub mod rules;
