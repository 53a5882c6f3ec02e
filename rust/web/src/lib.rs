//! Web front end for the card points game: signed-cookie sessions, HTML
//! pages, a JSON API and the server lifecycle around them.

pub mod assets;
pub mod config;
pub mod cookie;
pub mod errors;
pub mod handlers;
pub mod logging;
pub mod middleware;
pub mod server;
pub mod session;
pub mod views;

pub use assets::{Asset, AssetError, Assets};
pub use config::{
    load_with_sources, AppConfig, ConfigError, ConfigOverrides, ConfigResolved, ConfigSources,
    ValueSource,
};
pub use cookie::{BrowserSession, CookieError, SessionCookies, SESSION_COOKIE};
pub use errors::{ErrorResponse, ErrorSeverity, IntoErrorResponse};
pub use logging::{init_logging, LogEntry, LogFormat, TestLogSubscriber};
pub use middleware::{log_response, with_request_logging, RequestStart};
pub use server::{routes, AppContext, ServerError, ServerHandle, WebServer};
pub use session::{
    GameView, MemorySessionStore, RoundResult, SessionError, SessionId, SessionManager,
    SessionStore,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_provides_shared_components() {
        let ctx = AppContext::new_for_tests();

        let sessions = ctx.sessions();
        assert_eq!(sessions.active_sessions(), 0);
        assert!(!sessions.deck().is_empty());
        assert!(ctx.assets().dir().ends_with("static"));
    }
}
