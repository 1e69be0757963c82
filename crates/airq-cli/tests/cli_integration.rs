//! CLI Integration Tests
//!
//! These tests run the `airq` binary against a local mock HTTP server and a
//! temporary database.
//!
//! ```
//! cargo test --package airq-cli --test cli_integration
//! ```

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use airq_types::SourceZone;
use tempfile::TempDir;
use time::OffsetDateTime;
use time::macros::format_description;

/// Unreachable endpoint: nothing listens on port 1.
const DEAD_URL: &str = "http://127.0.0.1:1";

struct Workspace {
    _dir: TempDir,
    config: PathBuf,
    db: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("config.toml");
        std::fs::write(&config, "request_timeout_ms = 2000\n").unwrap();
        let db = dir.path().join("data.db");
        Self {
            _dir: dir,
            config,
            db,
        }
    }

    fn run(&self, base_url: &str, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_airq"))
            .arg("--no-color")
            .arg("--quiet")
            .arg("--config")
            .arg(&self.config)
            .arg("--db")
            .arg(&self.db)
            .arg("--base-url")
            .arg(base_url)
            .args(args)
            .env_remove("RUST_LOG")
            .output()
            .expect("Failed to run airq binary")
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Series body with `hours` hourly readings ending at the current Warsaw hour.
fn series_body(hours: i64) -> String {
    let fmt = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    let now = SourceZone::WARSAW
        .localize(OffsetDateTime::now_utc())
        .replace_minute(0)
        .unwrap()
        .replace_second(0)
        .unwrap()
        .replace_nanosecond(0)
        .unwrap();
    let values: Vec<serde_json::Value> = (0..hours)
        .map(|i| {
            serde_json::json!({
                "date": (now - time::Duration::hours(i)).format(&fmt).unwrap(),
                "value": 20.0 + i as f64,
            })
        })
        .collect();
    serde_json::json!({ "key": "PM10", "values": values }).to_string()
}

fn serve_series(server: &mut mockito::Server, sensor: i64, hours: i64) -> mockito::Mock {
    server
        .mock("GET", format!("/data/getData/{sensor}").as_str())
        .with_status(200)
        .with_body(series_body(hours))
        .create()
}

fn db_exists(path: &Path) -> bool {
    path.exists()
}

// =============================================================================
// Help and configuration
// =============================================================================

#[test]
fn test_help_lists_commands() {
    let output = Command::new(env!("CARGO_BIN_EXE_airq"))
        .arg("--help")
        .output()
        .unwrap();
    assert!(output.status.success());

    let text = stdout(&output);
    for command in ["stations", "sensors", "fetch", "history", "analyze", "index", "watch", "cache"] {
        assert!(text.contains(command), "help should list {command}");
    }
}

#[test]
fn test_config_show_reflects_overrides() {
    let ws = Workspace::new();
    let output = ws.run(DEAD_URL, &["config", "show"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let text = stdout(&output);
    assert!(text.contains("request_timeout_ms = 2000"));
    assert!(text.contains(DEAD_URL));
    assert!(text.contains("data.db"));
}

#[test]
fn test_invalid_config_exit_code() {
    let ws = Workspace::new();
    let output = ws.run("ftp://example.com", &["history", "92"]);
    assert_eq!(output.status.code(), Some(4));
    assert!(stderr(&output).contains("Invalid configuration"));
}

// =============================================================================
// Live and cached data
// =============================================================================

#[test]
fn test_fetch_live_then_cached() {
    let ws = Workspace::new();
    let mut server = mockito::Server::new();
    let mock = serve_series(&mut server, 92, 3);

    let output = ws.run(&server.url(), &["fetch", "92"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).starts_with("[live] sensor 92: 3 sample(s)"));
    mock.assert();
    assert!(db_exists(&ws.db));

    let output = ws.run(DEAD_URL, &["fetch", "92"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).starts_with("[cached] sensor 92: 3 sample(s)"));
}

#[test]
fn test_fetch_json_has_provenance() {
    let ws = Workspace::new();
    let mut server = mockito::Server::new();
    serve_series(&mut server, 7, 2);

    let output = ws.run(&server.url(), &["--format", "json", "fetch", "7"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["provenance"], "live");
    assert_eq!(json["data"].as_array().unwrap().len(), 2);
}

#[test]
fn test_fetch_without_cache_is_no_data() {
    let ws = Workspace::new();
    let output = ws.run(DEAD_URL, &["fetch", "92"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("No data available for sensor 92"));
    assert!(stdout(&output).is_empty());
}

#[test]
fn test_history_never_contacts_service() {
    let ws = Workspace::new();
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", mockito::Matcher::Any)
        .expect(0)
        .create();

    let output = ws.run(&server.url(), &["history", "92"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).starts_with("[cached] sensor 92: 0 sample(s)"));
    mock.assert();
}

#[test]
fn test_analyze_and_export_after_fetch() {
    let ws = Workspace::new();
    let mut server = mockito::Server::new();
    serve_series(&mut server, 92, 5);
    assert!(ws.run(&server.url(), &["fetch", "92"]).status.success());

    let output = ws.run(DEAD_URL, &["--format", "json", "analyze", "92", "--anomalies"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["summary"]["count"], 5);
    assert_eq!(json["summary"]["mean"], 22.0);
    // Values fall towards the present: 24, 23, ..., 20.
    assert_eq!(json["summary"]["trend"], "falling");
    assert!(json["anomalies"].is_array());

    let output = ws.run(DEAD_URL, &["cache", "export", "92"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let csv = stdout(&output);
    assert!(csv.starts_with("sensor_id,timestamp,value\n"));
    assert_eq!(csv.lines().count(), 6);
}

#[test]
fn test_huge_hour_windows_do_not_crash() {
    let ws = Workspace::new();
    let mut server = mockito::Server::new();
    serve_series(&mut server, 92, 3);
    assert!(ws.run(&server.url(), &["fetch", "92"]).status.success());

    let max = u32::MAX.to_string();
    for args in [
        vec!["history", "92", "--hours", max.as_str()],
        vec!["analyze", "92", "--hours", max.as_str(), "--hourly"],
        vec!["cache", "export", "92", "--hours", max.as_str()],
    ] {
        let output = ws.run(DEAD_URL, &args);
        assert!(output.status.success(), "{args:?} stderr: {}", stderr(&output));
    }

    let output = ws.run(DEAD_URL, &["history", "92", "--hours", max.as_str()]);
    assert!(stdout(&output).starts_with("[cached] sensor 92: 3 sample(s)"));
}

#[test]
fn test_retention_above_bound_is_invalid_config() {
    let ws = Workspace::new();
    let output = ws.run(DEAD_URL, &["--retention-hours", "100000", "history", "92"]);
    assert_eq!(output.status.code(), Some(4));
}

#[test]
fn test_cache_range_of_unknown_sensor() {
    let ws = Workspace::new();
    let output = ws.run(DEAD_URL, &["cache", "range", "5"]);
    assert_eq!(output.status.code(), Some(2));
}
