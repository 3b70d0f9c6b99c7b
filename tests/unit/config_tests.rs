use std::time::Duration;

use uci_analyser::config::StderrMode;
use uci_analyser::{AppError, EngineConfig};

fn sample_toml() -> &'static str {
    r#"
engine = "/usr/games/stockfish"
search_depth = 18
variations = 3
new_game_command = "ucinewgame"
response_timeout_seconds = 30
shutdown_grace_seconds = 2
stderr = "null"

[options]
Threads = "4"
Hash = "256"
"SyzygyPath" = "/opt/syzygy"
"#
}

#[test]
fn parses_valid_config() {
    let config = EngineConfig::from_toml_str(sample_toml()).expect("config parses");

    assert_eq!(config.engine.to_str(), Some("/usr/games/stockfish"));
    assert_eq!(config.search_depth, 18);
    assert_eq!(config.variations, 3);
    assert_eq!(config.stderr, StderrMode::Null);
    assert_eq!(config.response_timeout(), Some(Duration::from_secs(30)));
    assert_eq!(config.shutdown_grace(), Duration::from_secs(2));
    assert_eq!(config.options.get("Hash").map(String::as_str), Some("256"));
}

#[test]
fn options_iterate_in_name_order() {
    let config = EngineConfig::from_toml_str(sample_toml()).expect("config parses");
    let names: Vec<&str> = config.options.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["Hash", "SyzygyPath", "Threads"]);
}

#[test]
fn minimal_config_uses_defaults() {
    let config = EngineConfig::from_toml_str("engine = \"stockfish\"\n").expect("config parses");

    assert_eq!(config.search_depth, 20);
    assert_eq!(config.variations, 1);
    assert_eq!(config.new_game_command, "ucinewgame");
    assert_eq!(config.stderr, StderrMode::Inherit);
    assert_eq!(config.response_timeout(), None, "0 means wait indefinitely");
    assert_eq!(config.shutdown_grace(), Duration::from_secs(5));
    assert!(config.options.is_empty());
    assert_eq!(config, EngineConfig::for_engine("stockfish"));
}

#[test]
fn zero_search_depth_is_rejected() {
    let result = EngineConfig::from_toml_str("engine = \"stockfish\"\nsearch_depth = 0\n");
    match result {
        Err(AppError::Config(msg)) => assert!(msg.contains("search_depth"), "got: {msg}"),
        other => panic!("expected Err(AppError::Config), got: {other:?}"),
    }
}

#[test]
fn zero_variations_is_rejected() {
    let result = EngineConfig::from_toml_str("engine = \"stockfish\"\nvariations = 0\n");
    assert!(matches!(result, Err(AppError::Config(msg)) if msg.contains("variations")));
}

#[test]
fn empty_engine_is_rejected() {
    let result = EngineConfig::from_toml_str("engine = \"\"\n");
    assert!(matches!(result, Err(AppError::Config(msg)) if msg.contains("engine")));
}

#[test]
fn blank_new_game_command_is_rejected() {
    let result = EngineConfig::from_toml_str("engine = \"sf\"\nnew_game_command = \"  \"\n");
    assert!(matches!(result, Err(AppError::Config(msg)) if msg.contains("new_game_command")));
}

#[test]
fn option_name_containing_value_token_is_rejected() {
    let raw = "engine = \"sf\"\n[options]\n\"Hash value 1\" = \"2\"\n";
    assert!(matches!(
        EngineConfig::from_toml_str(raw),
        Err(AppError::Config(msg)) if msg.contains("invalid option name")
    ));
}

#[test]
fn missing_engine_is_a_toml_error() {
    match EngineConfig::from_toml_str("search_depth = 10\n") {
        Err(AppError::Config(msg)) => assert!(msg.starts_with("invalid config"), "got: {msg}"),
        other => panic!("expected Err(AppError::Config), got: {other:?}"),
    }
}

#[test]
fn unknown_stderr_mode_is_rejected() {
    assert!(matches!(
        EngineConfig::from_toml_str("engine = \"sf\"\nstderr = \"capture\"\n"),
        Err(AppError::Config(_))
    ));
}

#[test]
fn loads_from_file() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("analyser.toml");
    std::fs::write(&path, sample_toml()).expect("write config");

    let config = EngineConfig::load_from_path(&path).expect("config loads");
    assert_eq!(config.search_depth, 18);
}

#[test]
fn missing_file_is_a_config_error() {
    let temp = tempfile::tempdir().expect("tempdir");
    let result = EngineConfig::load_from_path(temp.path().join("absent.toml"));
    assert!(matches!(result, Err(AppError::Config(msg)) if msg.contains("failed to read config")));
}
