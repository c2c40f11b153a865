//! Coverage for config parsing, overrides, and path resolution.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use tandem::config::{config_dir, load_config, Config};

#[test]
fn defaults_match_documented_values() {
    let config = Config::default();
    assert_eq!(config.models.default, "gemini/gemini-1.5-flash");
    assert_eq!(config.experiment.default_condition, "acceptance");
    assert_eq!(config.experiment.default_participant, "anon");
    assert_eq!(config.experiment.log_path, Path::new("chat_logs.csv"));
    assert_eq!(config.generation.timeout(), Some(Duration::from_secs(30)));
}

#[test]
fn empty_toml_yields_defaults() {
    let parsed = Config::from_toml("");
    assert!(parsed.is_ok());
    let config = match parsed {
        Ok(config) => config,
        Err(err) => panic!("empty config should parse: {err}"),
    };
    assert_eq!(config.models.default, "gemini/gemini-1.5-flash");
}

#[test]
fn parse_full_config() {
    let toml_str = r#"
[models]
default = "openai/gpt-4o-mini"

[experiment]
default_condition = "rejection"
default_participant = "pilot"
log_path = "/data/study/chat_logs.csv"

[generation]
timeout_secs = 0
"#;
    let config = match Config::from_toml(toml_str) {
        Ok(config) => config,
        Err(err) => panic!("full config should parse: {err}"),
    };
    assert_eq!(config.models.default, "openai/gpt-4o-mini");
    assert_eq!(config.experiment.default_condition, "rejection");
    assert_eq!(config.experiment.default_participant, "pilot");
    assert_eq!(
        config.experiment.log_path,
        Path::new("/data/study/chat_logs.csv")
    );
    assert!(config.generation.timeout().is_none());
}

#[test]
fn mistyped_field_is_rejected() {
    let result = Config::from_toml("[generation]\ntimeout_secs = \"soon\"\n");
    assert!(result.is_err());
}

#[test]
fn env_overrides_take_precedence() {
    let env: HashMap<&str, &str> = HashMap::from([
        ("TANDEM_MODEL", "openai/gpt-4o"),
        ("TANDEM_CONDITION", "friend_like"),
        ("TANDEM_LOG_PATH", "/tmp/override.csv"),
        ("TANDEM_TIMEOUT_SECS", "5"),
    ]);
    let mut config = Config::default();
    config.apply_overrides(|key| env.get(key).map(|v| (*v).to_owned()));

    assert_eq!(config.models.default, "openai/gpt-4o");
    assert_eq!(config.experiment.default_condition, "friend_like");
    assert_eq!(config.experiment.log_path, Path::new("/tmp/override.csv"));
    assert_eq!(config.generation.timeout(), Some(Duration::from_secs(5)));
}

#[test]
fn invalid_timeout_override_is_ignored() {
    let mut config = Config::default();
    let env = |key: &str| (key == "TANDEM_TIMEOUT_SECS").then(|| "ten".to_owned());
    config.apply_overrides(env);
    assert_eq!(config.generation.timeout_secs, 30);
}

#[test]
fn missing_config_file_yields_defaults() {
    let tmp = tempfile::tempdir().expect("should create temp dir");
    let loaded = load_config(&tmp.path().join("config.toml"));
    assert!(loaded.is_ok());
    if let Ok(config) = loaded {
        assert_eq!(config.experiment.default_condition, "acceptance");
    }
}

#[test]
fn malformed_config_file_is_an_error() {
    let tmp = tempfile::tempdir().expect("should create temp dir");
    let path = tmp.path().join("config.toml");
    std::fs::write(&path, "[models\ndefault = ")
        .expect("should write config");
    let err = match load_config(&path) {
        Ok(_) => panic!("malformed config should fail"),
        Err(err) => err,
    };
    assert!(err.to_string().contains("failed to parse config"));
}

#[test]
fn config_dir_resolves() {
    let path = match config_dir() {
        Ok(path) => path,
        Err(err) => panic!("config dir should resolve: {err}"),
    };
    assert!(path.ends_with(".tandem"));
}
