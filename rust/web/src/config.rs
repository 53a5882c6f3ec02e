use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const ENV_PREFIX: &str = "POINTRUSH_";
const MIN_SECRET_LEN: usize = 16;

/// Resolved server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Interface to bind
    pub host: String,
    /// Port to bind (0 picks a free port)
    pub port: u16,
    /// JSON card deck, first record is the header
    pub deck_path: PathBuf,
    /// Directory served under `/static`
    pub static_dir: PathBuf,
    /// Key signing the session cookie; generated per process when absent
    #[serde(skip_serializing)]
    pub secret_key: Option<String>,
    /// Idle minutes before a browser session is dropped
    pub session_ttl_minutes: u64,
    /// Fixed RNG seed for reproducible games
    pub seed: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 5000,
            deck_path: PathBuf::from("data/cards.json"),
            static_dir: PathBuf::from("rust/web/static"),
            secret_key: None,
            session_ttl_minutes: 30,
            seed: None,
        }
    }
}

impl AppConfig {
    pub fn for_tests() -> Self {
        let manifest = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            deck_path: manifest.join("../../data/cards.json"),
            static_dir: manifest.join("static"),
            secret_key: Some("test-secret-key-0123456789".into()),
            session_ttl_minutes: 30,
            seed: Some(7),
        }
    }

    /// Idle lifetime of a browser session. Saturates instead of overflowing;
    /// `validate` rejects values that would need to.
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_minutes.saturating_mul(60))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid("host cannot be empty".into()));
        }
        if self.session_ttl_minutes == 0 {
            return Err(ConfigError::Invalid(
                "session_ttl_minutes must be greater than 0".into(),
            ));
        }
        if self.session_ttl_minutes.checked_mul(60).is_none() {
            return Err(ConfigError::Invalid(format!(
                "session_ttl_minutes too large: {}",
                self.session_ttl_minutes
            )));
        }
        if let Some(secret) = &self.secret_key {
            if secret.len() < MIN_SECRET_LEN {
                return Err(ConfigError::Invalid(format!(
                    "secret_key must be at least {MIN_SECRET_LEN} bytes"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSource {
    Default,
    File,
    Env,
    Cli,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConfigSources {
    pub host: ValueSource,
    pub port: ValueSource,
    pub deck_path: ValueSource,
    pub static_dir: ValueSource,
    pub secret_key: ValueSource,
    pub session_ttl_minutes: ValueSource,
    pub seed: ValueSource,
}

impl Default for ConfigSources {
    fn default() -> Self {
        Self {
            host: ValueSource::Default,
            port: ValueSource::Default,
            deck_path: ValueSource::Default,
            static_dir: ValueSource::Default,
            secret_key: ValueSource::Default,
            session_ttl_minutes: ValueSource::Default,
            seed: ValueSource::Default,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigResolved {
    pub config: AppConfig,
    pub sources: ConfigSources,
}

/// Command-line overrides, highest precedence.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ConfigOverrides {
    /// TOML config file (also POINTRUSH_CONFIG)
    #[arg(long = "config", short = 'c')]
    pub config_file: Option<PathBuf>,
    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,
    /// Port to bind to
    #[arg(long, short = 'p')]
    pub port: Option<u16>,
    /// Card deck JSON file
    #[arg(long = "deck")]
    pub deck_path: Option<PathBuf>,
    /// Static assets directory
    #[arg(long = "static-dir", short = 'd')]
    pub static_dir: Option<PathBuf>,
    /// Secret used to sign session cookies
    #[arg(long = "secret-key")]
    pub secret_key: Option<String>,
    /// Idle session lifetime in minutes
    #[arg(long = "session-ttl")]
    pub session_ttl_minutes: Option<u64>,
    /// RNG seed for reproducible games
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    port: Option<u16>,
    #[serde(default)]
    deck_path: Option<PathBuf>,
    #[serde(default)]
    static_dir: Option<PathBuf>,
    #[serde(default)]
    secret_key: Option<String>,
    #[serde(default)]
    session_ttl_minutes: Option<u64>,
    #[serde(default)]
    seed: Option<u64>,
}

/// Loads configuration from defaults, the config file, the process
/// environment and `overrides`, in increasing precedence.
pub fn load_with_sources(overrides: &ConfigOverrides) -> Result<ConfigResolved, ConfigError> {
    resolve(|key| std::env::var(key).ok(), overrides)
}

pub fn resolve<E>(env: E, overrides: &ConfigOverrides) -> Result<ConfigResolved, ConfigError>
where
    E: Fn(&str) -> Option<String>,
{
    let mut cfg = AppConfig::default();
    let mut sources = ConfigSources::default();
    let env_var = |name: &str| env(&format!("{ENV_PREFIX}{name}")).filter(|v| !v.is_empty());

    let file_path = overrides
        .config_file
        .clone()
        .or_else(|| env_var("CONFIG").map(PathBuf::from));
    if let Some(path) = file_path {
        let raw = fs::read_to_string(path)?;
        let file: FileConfig = toml::from_str(&raw)?;
        apply_file(&mut cfg, &mut sources, file);
    }

    if let Some(v) = env_var("HOST") {
        cfg.host = v;
        sources.host = ValueSource::Env;
    }
    if let Some(v) = env_var("PORT") {
        cfg.port = v
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("invalid port: {v}")))?;
        sources.port = ValueSource::Env;
    }
    if let Some(v) = env_var("DECK") {
        cfg.deck_path = PathBuf::from(v);
        sources.deck_path = ValueSource::Env;
    }
    if let Some(v) = env_var("STATIC_DIR") {
        cfg.static_dir = PathBuf::from(v);
        sources.static_dir = ValueSource::Env;
    }
    if let Some(v) = env_var("SECRET_KEY") {
        cfg.secret_key = Some(v);
        sources.secret_key = ValueSource::Env;
    }
    if let Some(v) = env_var("SESSION_TTL_MINUTES") {
        cfg.session_ttl_minutes = v
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("invalid session ttl: {v}")))?;
        sources.session_ttl_minutes = ValueSource::Env;
    }
    if let Some(v) = env_var("SEED") {
        cfg.seed = Some(
            v.parse()
                .map_err(|_| ConfigError::Invalid(format!("invalid seed: {v}")))?,
        );
        sources.seed = ValueSource::Env;
    }

    apply_overrides(&mut cfg, &mut sources, overrides);

    cfg.validate()?;
    Ok(ConfigResolved {
        config: cfg,
        sources,
    })
}

fn apply_file(cfg: &mut AppConfig, sources: &mut ConfigSources, file: FileConfig) {
    if let Some(v) = file.host {
        cfg.host = v;
        sources.host = ValueSource::File;
    }
    if let Some(v) = file.port {
        cfg.port = v;
        sources.port = ValueSource::File;
    }
    if let Some(v) = file.deck_path {
        cfg.deck_path = v;
        sources.deck_path = ValueSource::File;
    }
    if let Some(v) = file.static_dir {
        cfg.static_dir = v;
        sources.static_dir = ValueSource::File;
    }
    if let Some(v) = file.secret_key {
        cfg.secret_key = Some(v);
        sources.secret_key = ValueSource::File;
    }
    if let Some(v) = file.session_ttl_minutes {
        cfg.session_ttl_minutes = v;
        sources.session_ttl_minutes = ValueSource::File;
    }
    if let Some(v) = file.seed {
        cfg.seed = Some(v);
        sources.seed = ValueSource::File;
    }
}

fn apply_overrides(cfg: &mut AppConfig, sources: &mut ConfigSources, o: &ConfigOverrides) {
    if let Some(v) = &o.host {
        cfg.host = v.clone();
        sources.host = ValueSource::Cli;
    }
    if let Some(v) = o.port {
        cfg.port = v;
        sources.port = ValueSource::Cli;
    }
    if let Some(v) = &o.deck_path {
        cfg.deck_path = v.clone();
        sources.deck_path = ValueSource::Cli;
    }
    if let Some(v) = &o.static_dir {
        cfg.static_dir = v.clone();
        sources.static_dir = ValueSource::Cli;
    }
    if let Some(v) = &o.secret_key {
        cfg.secret_key = Some(v.clone());
        sources.secret_key = ValueSource::Cli;
    }
    if let Some(v) = o.session_ttl_minutes {
        cfg.session_ttl_minutes = v;
        sources.session_ttl_minutes = ValueSource::Cli;
    }
    if let Some(v) = o.seed {
        cfg.seed = Some(v);
        sources.seed = ValueSource::Cli;
    }
}
