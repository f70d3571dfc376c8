//! Integration tests for layered configuration loading

use crate::integration::test_utils::with_isolated_env;
use jikan_relay::api::JikanClient;
use jikan_relay::config::{global_config_path, ConfigLoader, RelayConfig, ValidationError};
use std::time::Duration;
use tempfile::TempDir;

fn write(path: &std::path::Path, content: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

#[test]
fn test_defaults_when_no_sources_exist() {
    let test_dir = TempDir::new().unwrap();
    with_isolated_env(&test_dir, || {
        let workspace = test_dir.path().join("ws");
        std::fs::create_dir_all(&workspace).unwrap();

        let config = ConfigLoader::load(&workspace).unwrap();
        assert_eq!(config, RelayConfig::default());
        assert!(config.validate().is_ok());
    });
}

#[test]
fn test_layer_precedence() {
    let test_dir = TempDir::new().unwrap();
    with_isolated_env(&test_dir, || {
        let workspace = test_dir.path().join("ws");

        let global = global_config_path().unwrap();
        assert!(global.starts_with(test_dir.path()));
        write(
            &global,
            r#"
[api]
base_url = "http://global.example/v4"
request_timeout_ms = 1000

[pacing]
min_interval_ms = 100
"#,
        );
        write(
            &workspace.join("config/config.toml"),
            r#"
[pacing]
min_interval_ms = 200

[retry]
backoff_ms = 50
"#,
        );
        write(
            &workspace.join("config/development.toml"),
            r#"
[retry]
backoff_ms = 75
"#,
        );

        let config = ConfigLoader::load(&workspace).unwrap();
        assert_eq!(config.api.base_url, "http://global.example/v4");
        assert_eq!(config.api.request_timeout_ms, 1000);
        assert_eq!(config.pacing.min_interval_ms, 200, "workspace beats global");
        assert_eq!(config.retry.backoff_ms, 75, "env file beats base file");
        assert_eq!(config.retry.max_retry_attempts, 3);

        std::env::set_var("JIKAN_RELAY__PACING__MIN_INTERVAL_MS", "0");
        std::env::set_var("JIKAN_RELAY__RETRY__MAX_RETRY_ATTEMPTS", "1");
        let config = ConfigLoader::load(&workspace).unwrap();
        assert_eq!(config.pacing.min_interval_ms, 0, "environment beats files");
        assert_eq!(config.retry.max_retry_attempts, 1);
    });
}

#[test]
fn test_env_name_selects_workspace_file() {
    let test_dir = TempDir::new().unwrap();
    with_isolated_env(&test_dir, || {
        let workspace = test_dir.path().join("ws");
        write(
            &workspace.join("config/production.toml"),
            "[search]\ndefault_page_size = 10\n",
        );

        assert_eq!(
            ConfigLoader::load(&workspace).unwrap().search.default_page_size,
            25
        );

        std::env::set_var("JIKAN_RELAY_ENV", "production");
        assert_eq!(
            ConfigLoader::load(&workspace).unwrap().search.default_page_size,
            10
        );
    });
}

#[test]
fn test_invalid_file_values_fail_validation() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("relay.toml");
    write(
        &config_file,
        r#"
[api]
base_url = "not a url"
connect_timeout_ms = 0

[search]
default_page_size = 50

[logging]
output = "syslog"
"#,
    );

    let config = ConfigLoader::load_from_file(&config_file).unwrap();
    let errors = config.validate().unwrap_err();
    assert_eq!(errors.len(), 4);
    assert!(errors.iter().any(|e| matches!(e, ValidationError::Logging(_))));
    assert!(errors.iter().any(|e| matches!(e, ValidationError::Search(_))));
}

#[test]
fn test_malformed_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("relay.toml");
    write(&config_file, "[pacing]\nmin_interval_ms = \"soon\"\n");
    assert!(ConfigLoader::load_from_file(&config_file).is_err());
}

#[test]
fn test_client_from_config_uses_pacing_and_retry() {
    let mut config = RelayConfig::default();
    config.pacing.min_interval_ms = 1000;
    config.retry.max_retry_attempts = 0;

    let client = JikanClient::from_config(&config).unwrap();
    assert_eq!(client.queue().min_interval(), Duration::from_millis(1000));
    assert_eq!(client.retry_executor().policy().total_attempts(), 1);
}
