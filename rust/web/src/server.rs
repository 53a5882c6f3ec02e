use crate::assets::Assets;
use crate::config::{AppConfig, ConfigError};
use crate::cookie::{BrowserSession, SessionCookies, SESSION_COOKIE};
use crate::handlers;
use crate::middleware::with_request_logging;
use crate::session::SessionManager;
use pointrush_engine::deck::Deck;
use pointrush_engine::errors::DeckError;
use rand::RngCore;
use std::collections::HashMap;
use std::convert::Infallible;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use warp::filters::BoxedFilter;
use warp::reply::Response;
use warp::Filter;

const FORM_LIMIT_BYTES: u64 = 16 * 1024;
const JANITOR_PERIOD: Duration = Duration::from_secs(60);

/// Everything a request handler may need, built once per server.
#[derive(Debug, Clone)]
pub struct AppContext {
    config: AppConfig,
    sessions: Arc<SessionManager>,
    cookies: SessionCookies,
    assets: Assets,
}

impl AppContext {
    pub fn new(config: AppConfig) -> Result<Self, ServerError> {
        config.validate()?;

        let deck = Deck::load(&config.deck_path)?;
        tracing::info!(
            deck = %config.deck_path.display(),
            cards = deck.len(),
            "card deck loaded"
        );

        if !config.static_dir.exists() {
            tracing::warn!(
                static_dir = %config.static_dir.display(),
                "static directory missing; assets will 404"
            );
        }

        let sessions = SessionManager::new(Arc::new(deck))
            .with_seed(config.seed)
            .with_ttl(config.session_ttl());
        let cookies = SessionCookies::new(Self::signing_key(&config));
        let assets = Assets::new(config.static_dir.clone());

        Ok(Self {
            config,
            sessions: Arc::new(sessions),
            cookies,
            assets,
        })
    }

    pub fn new_for_tests() -> Self {
        Self::new(AppConfig::for_tests()).expect("test context")
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn sessions(&self) -> Arc<SessionManager> {
        Arc::clone(&self.sessions)
    }

    pub fn cookies(&self) -> SessionCookies {
        self.cookies.clone()
    }

    pub fn assets(&self) -> Assets {
        self.assets.clone()
    }

    /// A configured secret wins; otherwise cookies only survive this process.
    fn signing_key(config: &AppConfig) -> Vec<u8> {
        match &config.secret_key {
            Some(secret) => secret.as_bytes().to_vec(),
            None => {
                tracing::warn!(
                    "no secret key configured; using a random key, sessions end on restart"
                );
                let mut key = vec![0u8; 32];
                rand::rng().fill_bytes(&mut key);
                key
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind to address: {0}")]
    BindError(#[from] std::io::Error),
    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("Failed to load card deck: {0}")]
    DeckError(#[from] DeckError),
    #[error("Server task failed: {0}")]
    TaskError(String),
}

#[derive(Debug, Clone)]
pub struct WebServer {
    context: AppContext,
}

impl WebServer {
    pub fn new(config: AppConfig) -> Result<Self, ServerError> {
        let context = AppContext::new(config)?;
        Ok(Self { context })
    }

    pub async fn start(self) -> Result<ServerHandle, ServerError> {
        let WebServer { context } = self;
        let bind_addr = Self::bind_addr(context.config())?;

        // surface an occupied port as an io error before warp takes over
        if bind_addr.port() != 0 {
            drop(std::net::TcpListener::bind(bind_addr)?);
        }

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let app = with_request_logging(routes(&context));
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
        };

        let (addr, server_future) = warp::serve(app)
            .try_bind_with_graceful_shutdown(bind_addr, shutdown_signal)
            .map_err(Self::map_warp_error)?;

        tracing::info!(address = %addr, "web server listening on http://{}", addr);

        let task = tokio::spawn(async move {
            server_future.await;
            Ok(())
        });
        let janitor = Self::spawn_janitor(context.sessions());

        Ok(ServerHandle::new(addr, shutdown_tx, task, janitor))
    }

    fn spawn_janitor(sessions: Arc<SessionManager>) -> JoinHandle<()> {
        let period = JANITOR_PERIOD.min(sessions.session_ttl());
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // the first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let purged = sessions.cleanup_expired();
                if purged > 0 {
                    tracing::info!(
                        purged,
                        remaining = sessions.active_sessions(),
                        "expired sessions purged"
                    );
                }
            }
        })
    }

    fn bind_addr(config: &AppConfig) -> Result<SocketAddr, ServerError> {
        let host = config.host.as_str();

        if let Ok(addr) = host.parse::<SocketAddr>() {
            return Ok(addr);
        }

        if let Ok(ip) = host.parse::<std::net::IpAddr>() {
            return Ok(SocketAddr::new(ip, config.port));
        }

        let candidate = format!("{}:{}", host, config.port);
        let mut addrs = candidate.to_socket_addrs().map_err(|err| {
            ConfigError::Invalid(format!("failed to resolve address `{candidate}`: {err}"))
        })?;

        addrs.next().ok_or_else(|| {
            ConfigError::Invalid(format!("failed to resolve address `{candidate}`")).into()
        })
    }

    fn map_warp_error(err: warp::Error) -> ServerError {
        use std::error::Error as StdError;

        if let Some(source) = err.source() {
            if let Some(io_err) = source.downcast_ref::<std::io::Error>() {
                let recreated = std::io::Error::new(io_err.kind(), io_err.to_string());
                return ServerError::BindError(recreated);
            }
        }

        ServerError::TaskError(err.to_string())
    }
}

/// The full route table without the request logging wrapper.
pub fn routes(context: &AppContext) -> BoxedFilter<(Response,)> {
    health_route()
        .or(static_routes(context))
        .unify()
        .or(page_routes(context))
        .unify()
        .or(api_routes(context))
        .unify()
        .boxed()
}

fn health_route() -> BoxedFilter<(Response,)> {
    warp::path("health")
        .and(warp::get())
        .and(warp::path::end())
        .map(handlers::health)
        .boxed()
}

fn static_routes(context: &AppContext) -> BoxedFilter<(Response,)> {
    warp::path("static")
        .and(warp::path::tail())
        .and(warp::get())
        .and(with_assets(context.assets()))
        .then(|tail: warp::path::Tail, assets: Assets| async move {
            assets.respond(tail.as_str()).await
        })
        .boxed()
}

fn page_routes(context: &AppContext) -> BoxedFilter<(Response,)> {
    let sessions = context.sessions();
    let browser = with_browser_session(context.cookies());

    let index = warp::path::end()
        .and(warp::get())
        .and(browser.clone())
        .then(handlers::game::index);

    let submit = warp::path::end()
        .and(warp::post())
        .and(with_session_manager(sessions.clone()))
        .and(browser.clone())
        .and(warp::body::content_length_limit(FORM_LIMIT_BYTES))
        .and(warp::body::form::<HashMap<String, String>>())
        .then(handlers::game::submit_players);

    let show = warp::path!("play_game")
        .and(warp::get())
        .and(with_session_manager(sessions.clone()))
        .and(browser.clone())
        .then(handlers::game::show_game);

    let play = warp::path!("play_game")
        .and(warp::post())
        .and(with_session_manager(sessions.clone()))
        .and(browser.clone())
        .then(handlers::game::play_round);

    let reset = warp::path!("reset")
        .and(warp::post())
        .and(with_session_manager(sessions))
        .and(browser)
        .then(handlers::game::reset);

    index
        .or(submit)
        .unify()
        .or(show)
        .unify()
        .or(play)
        .unify()
        .or(reset)
        .unify()
        .boxed()
}

fn api_routes(context: &AppContext) -> BoxedFilter<(Response,)> {
    let sessions = context.sessions();
    let browser = with_browser_session(context.cookies());

    let game = warp::path!("api" / "game")
        .and(warp::get())
        .and(with_session_manager(sessions.clone()))
        .and(browser.clone())
        .then(handlers::api::get_game);

    let players = warp::path!("api" / "game" / "players")
        .and(warp::post())
        .and(with_session_manager(sessions.clone()))
        .and(browser.clone())
        .and(warp::body::content_length_limit(FORM_LIMIT_BYTES))
        .and(warp::body::json::<handlers::StartGameRequest>())
        .then(handlers::api::start_game);

    let rounds = warp::path!("api" / "game" / "rounds")
        .and(warp::post())
        .and(with_session_manager(sessions.clone()))
        .and(browser.clone())
        .then(handlers::api::play_round);

    let reset = warp::path!("api" / "game" / "reset")
        .and(warp::post())
        .and(with_session_manager(sessions))
        .and(browser)
        .then(handlers::api::reset);

    game.or(players)
        .unify()
        .or(rounds)
        .unify()
        .or(reset)
        .unify()
        .boxed()
}

fn with_assets(assets: Assets) -> impl Filter<Extract = (Assets,), Error = Infallible> + Clone {
    warp::any().map(move || assets.clone())
}

fn with_session_manager(
    sessions: Arc<SessionManager>,
) -> impl Filter<Extract = (Arc<SessionManager>,), Error = Infallible> + Clone {
    warp::any().map(move || Arc::clone(&sessions))
}

/// Resolves the signed cookie into the request's session, minting one if needed.
fn with_browser_session(cookies: SessionCookies) -> BoxedFilter<(BrowserSession,)> {
    warp::cookie::optional(SESSION_COOKIE)
        .map(move |raw: Option<String>| cookies.resolve(raw.as_deref()))
        .boxed()
}

#[derive(Debug)]
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<Result<(), ServerError>>>,
    janitor: Option<JoinHandle<()>>,
}

impl ServerHandle {
    fn new(
        addr: SocketAddr,
        shutdown: oneshot::Sender<()>,
        task: JoinHandle<Result<(), ServerError>>,
        janitor: JoinHandle<()>,
    ) -> Self {
        Self {
            addr,
            shutdown: Some(shutdown),
            task: Some(task),
            janitor: Some(janitor),
        }
    }

    pub fn address(&self) -> SocketAddr {
        self.addr
    }

    pub async fn shutdown(mut self) -> Result<(), ServerError> {
        if let Some(janitor) = self.janitor.take() {
            janitor.abort();
        }

        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }

        if let Some(task) = self.task.take() {
            match task.await {
                Ok(result) => result?,
                Err(err) => {
                    return Err(ServerError::TaskError(format!(
                        "server task join error: {err}"
                    )))
                }
            }
        }

        tracing::info!(address = %self.addr, "web server stopped");
        Ok(())
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if let Some(janitor) = self.janitor.take() {
            janitor.abort();
        }

        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }

        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
