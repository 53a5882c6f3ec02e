pub mod api;
pub mod game;
pub mod health;

pub use api::StartGameRequest;
pub use health::health;
