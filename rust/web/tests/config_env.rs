use pointrush_web::{load_with_sources, ConfigError, ConfigOverrides, ValueSource};
use serial_test::serial;
use std::io::Write;

const VARS: &[&str] = &[
    "POINTRUSH_CONFIG",
    "POINTRUSH_HOST",
    "POINTRUSH_PORT",
    "POINTRUSH_DECK",
    "POINTRUSH_STATIC_DIR",
    "POINTRUSH_SECRET_KEY",
    "POINTRUSH_SESSION_TTL_MINUTES",
    "POINTRUSH_SEED",
];

fn clear_env() {
    for var in VARS {
        std::env::remove_var(var);
    }
}

#[test]
#[serial]
fn process_environment_overrides_config_file() {
    clear_env();
    let mut file = tempfile::NamedTempFile::new().expect("temp config");
    writeln!(file, "port = 6100\nseed = 11\nsecret_key = \"file-secret-0123456789\"").expect("write");

    std::env::set_var("POINTRUSH_CONFIG", file.path());
    std::env::set_var("POINTRUSH_PORT", "6200");

    let resolved = load_with_sources(&ConfigOverrides::default()).expect("resolve");
    clear_env();

    assert_eq!(resolved.config.port, 6200);
    assert_eq!(resolved.sources.port, ValueSource::Env);
    assert_eq!(resolved.config.seed, Some(11));
    assert_eq!(resolved.sources.seed, ValueSource::File);
    assert_eq!(resolved.sources.host, ValueSource::Default);
}

#[test]
#[serial]
fn command_line_beats_environment() {
    clear_env();
    std::env::set_var("POINTRUSH_HOST", "0.0.0.0");

    let overrides = ConfigOverrides {
        host: Some("localhost".into()),
        ..ConfigOverrides::default()
    };
    let resolved = load_with_sources(&overrides).expect("resolve");
    clear_env();

    assert_eq!(resolved.config.host, "localhost");
    assert_eq!(resolved.sources.host, ValueSource::Cli);
}

#[test]
#[serial]
fn malformed_environment_value_is_rejected() {
    clear_env();
    std::env::set_var("POINTRUSH_SESSION_TTL_MINUTES", "soon");

    let result = load_with_sources(&ConfigOverrides::default());
    clear_env();

    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}
