#![allow(clippy::unwrap_used, clippy::expect_used)]

//! CLI smoke tests for the socctrader-server binary
//!
//! These tests verify that the CLI commands work correctly, including
//! configuration validation, help output and the one-shot reconcile command.

use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

use tempfile::TempDir;
use tokio::time::timeout;

/// Helper to run the socctrader-server binary with given arguments
fn run_server(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_socctrader-server"))
        .args(args)
        .env("RUST_LOG", "off")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .expect("Failed to execute socctrader-server")
}

/// Helper to run the socctrader-server binary with timeout
async fn run_server_with_timeout(
    args: &[&str],
    timeout_duration: Duration,
) -> Result<std::process::Output, Box<dyn std::error::Error>> {
    let mut cmd = tokio::process::Command::new(env!("CARGO_BIN_EXE_socctrader-server"));
    cmd.args(args)
        .env("RUST_LOG", "off")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = cmd.spawn()?;

    match timeout(timeout_duration, child.wait_with_output()).await {
        Ok(result) => result.map_err(Into::into),
        Err(_elapsed) => Err("elapsed".into()),
    }
}

fn write_config(dir: &TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write config file");
    path_str(&path)
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[test]
fn test_cli_help_command() {
    let output = run_server(&["--help"]);

    assert!(output.status.success(), "Help command should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("socctrader-server"), "Should contain binary name");
    assert!(stdout.contains("Usage:"), "Should contain usage information");
    assert!(stdout.contains("run"), "Should contain 'run' subcommand");
    assert!(stdout.contains("check"), "Should contain 'check' subcommand");
    assert!(stdout.contains("reconcile"), "Should contain 'reconcile' subcommand");
    assert!(stdout.contains("--config"), "Should mention config option");
    assert!(stdout.contains("--mock"), "Should mention mock option");
}

#[test]
fn test_cli_version_command() {
    let output = run_server(&["--version"]);

    assert!(output.status.success(), "Version command should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("socctrader-server"), "Should contain binary name");
    assert!(
        stdout.chars().any(|c| c.is_ascii_digit()),
        "Should contain version numbers"
    );
}

#[test]
fn test_cli_invalid_command() {
    let output = run_server(&["invalid-command"]);

    assert!(!output.status.success(), "Invalid command should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("error") || stderr.contains("unrecognized"),
        "Should contain error message about invalid command: {stderr}"
    );
}

#[test]
fn test_cli_config_validation_missing_file() {
    let output = run_server(&["--config", "/nonexistent/config.yaml", "check"]);

    assert!(
        !output.status.success(),
        "Should fail when config file doesn't exist"
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("does not exist"),
        "Should indicate config file not found: {stderr}"
    );
}

#[test]
fn test_cli_config_validation_invalid_yaml() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(&temp_dir, "invalid.yaml", "invalid: yaml: content: [unclosed");

    let output = run_server(&["--config", &config_path, "check"]);

    assert!(!output.status.success(), "Should fail with invalid YAML");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("failed to load configuration"),
        "Should mention the load failure: {stderr}"
    );
}

#[test]
fn test_cli_config_validation_valid_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(
        &temp_dir,
        "valid.yaml",
        r#"
server:
  bind_addr: "127.0.0.1:8081"
database:
  dsn: "sqlite::memory:"
logging:
  level: info
  format: json
modules:
  socctrader:
    config:
      app_name: "socctraderApp"
      default_page_size: 50
      search:
        backend: memory
      sync:
        base_delay_ms: 100
"#,
    );

    let output = run_server(&["--config", &config_path, "check"]);

    if !output.status.success() {
        eprintln!("STDERR: {}", String::from_utf8_lossy(&output.stderr));
    }
    assert!(output.status.success(), "Should succeed with valid config");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Configuration is valid"), "{stdout}");
    assert!(stdout.contains("127.0.0.1:8081"), "Should echo the effective config: {stdout}");
}

#[test]
fn test_cli_check_rejects_invalid_module_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(
        &temp_dir,
        "bad_module.yaml",
        r"
modules:
  socctrader:
    config:
      default_page_size: 500
      max_page_size: 100
",
    );

    let output = run_server(&["--config", &config_path, "check"]);

    assert!(!output.status.success(), "Should fail with inconsistent page sizes");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("default_page_size"), "{stderr}");
}

#[test]
fn test_cli_check_rejects_unknown_module_keys() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(
        &temp_dir,
        "unknown_key.yaml",
        r"
modules:
  socctrader:
    config:
      no_such_option: true
",
    );

    let output = run_server(&["--config", &config_path, "check"]);

    assert!(!output.status.success(), "Should fail on an unknown module key");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("socctrader"), "{stderr}");
}

#[test]
fn test_cli_run_command_config_validation() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(
        &temp_dir,
        "bad_addr.yaml",
        r#"
server:
  bind_addr: "not-an-address"
"#,
    );

    let output = run_server(&["--config", &config_path, "--mock", "run"]);

    assert!(
        !output.status.success(),
        "Should fail with invalid bind address"
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("invalid bind address"),
        "Should mention address parsing issue: {stderr}"
    );
}

#[test]
fn test_cli_print_config_applies_overrides() {
    let output = run_server(&["--mock", "--port", "9123", "-vv", "--print-config"]);

    assert!(output.status.success(), "Print config should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Effective configuration"), "{stdout}");
    assert!(stdout.contains("127.0.0.1:9123"), "Port override should apply: {stdout}");
    assert!(stdout.contains("sqlite::memory:"), "Mock DSN should apply: {stdout}");
    assert!(stdout.contains("debug"), "-vv should raise the level: {stdout}");
}

#[test]
fn test_cli_env_overrides_config_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(
        &temp_dir,
        "env.yaml",
        r#"
server:
  bind_addr: "127.0.0.1:8082"
"#,
    );

    let output = Command::new(env!("CARGO_BIN_EXE_socctrader-server"))
        .args(["--config", &config_path, "--print-config"])
        .env("RUST_LOG", "off")
        .env("SOCCTRADER__SERVER__BIND_ADDR", "127.0.0.1:8083")
        .output()
        .expect("Failed to execute socctrader-server");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("127.0.0.1:8083"), "Env should win over the file: {stdout}");
}

#[test]
fn test_cli_reconcile_prints_report() {
    let output = run_server(&["--mock", "reconcile"]);

    if !output.status.success() {
        eprintln!("STDERR: {}", String::from_utf8_lossy(&output.stderr));
    }
    assert!(output.status.success(), "Reconcile should succeed on an empty store");

    let stdout = String::from_utf8_lossy(&output.stdout);
    let report: serde_json::Value = serde_json::from_str(&stdout).expect("report is JSON");
    let kinds = report["kinds"].as_array().expect("kinds array");
    assert_eq!(kinds.len(), 6);
    assert!(kinds.iter().all(|k| k["missing"] == 0 && k["orphaned"] == 0));
}

#[tokio::test]
async fn test_cli_run_serves_until_stopped() {
    // A running server never exits on its own; a timeout means it started.
    match run_server_with_timeout(&["--mock", "--port", "0", "run"], Duration::from_secs(2)).await {
        Err(e) if e.to_string().contains("elapsed") => {}
        Ok(output) => panic!(
            "server exited early: {}",
            String::from_utf8_lossy(&output.stderr)
        ),
        Err(other) => panic!("Unexpected failure: {other}"),
    }
}
