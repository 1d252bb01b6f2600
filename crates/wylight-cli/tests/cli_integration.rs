//! CLI Integration Tests
//!
//! These tests run the `wylight` binary with a private config and recent
//! file. Scans listen on a free loopback port, so no controller is needed.
//!
//! ```
//! cargo test --package wylight-cli --test cli_integration
//! ```

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

/// Run wylight with its config and recent file inside `dir`
fn run_wylight(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_wylight"))
        .args(args)
        .env("WYLIGHT_CONFIG", dir.join("config.toml"))
        .env("WYLIGHT_RECENT", dir.join("recent.txt"))
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run wylight binary")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn free_udp_port() -> u16 {
    let socket = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
    socket.local_addr().unwrap().port()
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_command() {
    let dir = TempDir::new().unwrap();
    let output = run_wylight(dir.path(), &["--help"]);

    assert!(output.status.success(), "Help should succeed");
    let stdout = stdout(&output);
    assert!(stdout.contains("WyLight"), "Help should mention WyLight");
    assert!(stdout.contains("scan"), "Help should list scan command");
    assert!(stdout.contains("recent"), "Help should list recent command");
    assert!(stdout.contains("select"), "Help should list select command");
}

#[test]
fn test_version_command() {
    let dir = TempDir::new().unwrap();
    let output = run_wylight(dir.path(), &["--version"]);

    assert!(output.status.success(), "Version should succeed");
    assert!(stdout(&output).contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_completions_command() {
    let dir = TempDir::new().unwrap();
    let output = run_wylight(dir.path(), &["completions", "bash"]);

    assert!(output.status.success());
    assert!(stdout(&output).contains("wylight"));
}

// =============================================================================
// Config Tests
// =============================================================================

#[test]
fn test_config_path_honors_env() {
    let dir = TempDir::new().unwrap();
    let output = run_wylight(dir.path(), &["config", "path"]);

    assert!(output.status.success());
    assert!(stdout(&output).contains("config.toml"));
    assert!(stdout(&output).contains(&*dir.path().to_string_lossy()));
}

#[test]
fn test_config_set_then_get() {
    let dir = TempDir::new().unwrap();
    let set = run_wylight(dir.path(), &["config", "set", "timeout-ms", "1500"]);
    assert!(set.status.success(), "{}", String::from_utf8_lossy(&set.stderr));

    let get = run_wylight(dir.path(), &["config", "get", "timeout-ms"]);
    assert_eq!(stdout(&get).trim(), "1500");

    let show = run_wylight(dir.path(), &["config", "show"]);
    assert!(stdout(&show).contains("timeout_ms = 1500"));
    assert!(stdout(&show).contains("port = 55555"));
}

#[test]
fn test_config_set_rejects_bad_port() {
    let dir = TempDir::new().unwrap();
    let output = run_wylight(dir.path(), &["config", "set", "port", "0"]);
    assert!(!output.status.success());
}

// =============================================================================
// Recent and Select Tests
// =============================================================================

#[test]
fn test_recent_empty() {
    let dir = TempDir::new().unwrap();
    let output = run_wylight(dir.path(), &["recent"]);

    assert!(output.status.success());
    assert!(stdout(&output).contains("No recently used controllers."));
}

#[test]
fn test_recent_json_lists_file_in_order() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("recent.txt"),
        "192.168.0.14:2000,WiFly-EZX,2\nbroken line\n192.168.0.15:2000,Kitchen\n",
    )
    .unwrap();

    let output = run_wylight(dir.path(), &["recent", "--format", "json"]);
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["count"], 2);
    assert_eq!(value["endpoints"][0]["name"], "WiFly-EZX");
    assert_eq!(value["endpoints"][0]["score"], 2);
    assert_eq!(value["endpoints"][1]["address"], "192.168.0.15:2000");
}

#[test]
fn test_select_from_recent_remembers() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("recent.txt"),
        "192.168.0.14:2000,WiFly-EZX,2\n192.168.0.15:2000,Kitchen\n",
    )
    .unwrap();

    let output = run_wylight(dir.path(), &["--style", "plain", "select", "1"]);
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(stdout(&output), "192.168.0.15:2000\n");

    let recent = run_wylight(dir.path(), &["recent", "--format", "csv", "--no-header"]);
    let lines: Vec<String> = stdout(&recent).lines().map(str::to_string).collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with("1,192.168.0.15:2000,Kitchen,false,1,"));
}

#[test]
fn test_select_unknown_target_fails() {
    let dir = TempDir::new().unwrap();
    let output = run_wylight(dir.path(), &["select", "7"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("No controller matches"));
}

// =============================================================================
// Scan Tests (loopback, no controller)
// =============================================================================

#[test]
fn test_scan_without_controllers_lists_recent_offline() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("recent.txt"), "192.168.0.14:2000,WiFly-EZX\n").unwrap();
    let port = free_udp_port().to_string();

    let output = run_wylight(
        dir.path(),
        &[
            "scan", "--timeout", "200", "--bind", "127.0.0.1", "--port", &port, "--json",
        ],
    );
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );

    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["count"], 1);
    assert_eq!(value["online"], 0);
    assert_eq!(value["summary"]["found"], 0);
    assert_eq!(value["summary"]["reason"], "timeout");
    assert_eq!(value["endpoints"][0]["online"], false);
}
