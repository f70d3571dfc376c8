//! Integration tests for the binary's logging and config surfaces.
//!
//! Only the `config` command is exercised so no network access is needed.

use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn relay_command(temp_dir: &TempDir) -> Command {
    let home = temp_dir.path().join("home");
    let config_home = temp_dir.path().join("config");
    fs::create_dir_all(&home).unwrap();
    fs::create_dir_all(&config_home).unwrap();

    let mut cmd = Command::new(env!("CARGO_BIN_EXE_jikan-relay"));
    cmd.env("HOME", home.as_os_str())
        .env("XDG_CONFIG_HOME", config_home.as_os_str())
        .env_remove("JIKAN_RELAY_LOG")
        .env_remove("JIKAN_RELAY_LOG_FORMAT")
        .env_remove("JIKAN_RELAY_LOG_OUTPUT")
        .env_remove("JIKAN_RELAY_ENV");
    cmd
}

#[test]
fn test_config_command_prints_effective_toml() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = temp_dir.path().join("ws");
    fs::create_dir_all(workspace.join("config")).unwrap();
    fs::write(
        workspace.join("config/config.toml"),
        "[pacing]\nmin_interval_ms = 4000\n",
    )
    .unwrap();

    let output = relay_command(&temp_dir)
        .arg("--workspace")
        .arg(&workspace)
        .arg("config")
        .output()
        .unwrap();

    assert!(
        output.status.success(),
        "jikan-relay config should succeed: stderr={:?}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    let printed: toml::Value = toml::from_str(&stdout).unwrap();
    assert_eq!(printed["pacing"]["min_interval_ms"].as_integer(), Some(4000));
    assert_eq!(
        printed["api"]["base_url"].as_str(),
        Some("https://api.jikan.moe/v4")
    );
}

#[test]
fn test_default_logging_stays_off_stdout() {
    let temp_dir = TempDir::new().unwrap();
    let output = relay_command(&temp_dir)
        .arg("--workspace")
        .arg(temp_dir.path())
        .arg("--verbose")
        .arg("config")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(toml::from_str::<toml::Value>(&stdout).is_ok(), "stdout is pure TOML");
    assert!(stderr.contains("jikan-relay starting"), "verbose logs go to stderr");
}

#[test]
fn test_log_file_receives_json_logs() {
    let temp_dir = TempDir::new().unwrap();
    let log_file = temp_dir.path().join("logs/relay.log");

    let output = relay_command(&temp_dir)
        .arg("--workspace")
        .arg(temp_dir.path())
        .arg("--log-level")
        .arg("debug")
        .arg("--log-format")
        .arg("json")
        .arg("--log-file")
        .arg(&log_file)
        .arg("config")
        .output()
        .unwrap();

    assert!(output.status.success());
    let content = fs::read_to_string(&log_file).unwrap();
    let first = content.lines().next().unwrap();
    let entry: serde_json::Value = serde_json::from_str(first).unwrap();
    assert!(entry.get("timestamp").is_some());
    assert!(content.contains("jikan-relay starting"));
}

#[test]
fn test_invalid_log_format_fails_fast() {
    let temp_dir = TempDir::new().unwrap();
    let output = relay_command(&temp_dir)
        .arg("--workspace")
        .arg(temp_dir.path())
        .arg("--log-format")
        .arg("xml")
        .arg("config")
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid log format"));
}
