//! End-to-end tests of the compiled binary

use crate::common::Workspace;
use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;

fn cmd() -> Command {
    Command::cargo_bin("arana").unwrap()
}

#[cfg(unix)]
#[test]
fn test_success_exit_zero() {
    let workspace = Workspace::new();
    cmd()
        .arg("https://example.com/jobs")
        .arg(&workspace.config)
        .args(["-p", "2", "-c", "true", "--base-dir"])
        .arg(workspace.path())
        .assert()
        .success()
        .stdout("\n");
}

#[cfg(unix)]
#[test]
fn test_failure_mirrors_exit_code() {
    let workspace = Workspace::new();
    cmd()
        .arg("https://example.com/jobs")
        .arg(&workspace.config)
        .args(["-p", "2", "-c", "false", "--base-dir"])
        .arg(workspace.path())
        .assert()
        .code(1)
        .stdout("")
        .stderr(contains(r#""failed":true"#).and(contains(r#""exitCode":1"#)));
}

#[cfg(unix)]
#[test]
fn test_scraper_stdout_printed_verbatim() {
    let workspace = Workspace::new();
    let script = workspace.echo_script();
    cmd()
        .arg("https://example.com/jobs")
        .arg(&workspace.config)
        .args(["-c", "sh", "--script"])
        .arg(&script)
        .arg("--base-dir")
        .arg(workspace.path())
        .assert()
        .success()
        .stdout(contains("--url=https://example.com/jobs\n").and(contains("--page=0\n")));
}

#[test]
fn test_spawn_failure_has_no_exit_code() {
    let workspace = Workspace::new();
    cmd()
        .arg("https://example.com/jobs")
        .arg(&workspace.config)
        .args(["-c", "/nonexistent/binary", "--base-dir"])
        .arg(workspace.path())
        .assert()
        .code(1)
        .stderr(contains("/nonexistent/binary").and(contains("exitCode").not()));
}

#[test]
fn test_missing_config_is_usage_error() {
    let workspace = Workspace::new();
    cmd()
        .arg("https://example.com/jobs")
        .arg(workspace.path().join("missing.json"))
        .assert()
        .code(2)
        .stderr(contains("Config file does not exist"));
}

#[test]
fn test_invalid_url_is_usage_error() {
    let workspace = Workspace::new();
    cmd()
        .arg("ftp://x.com/a")
        .arg(&workspace.config)
        .assert()
        .code(2)
        .stderr(contains("Invalid URL"));
}

#[test]
fn test_invalid_settings_is_usage_error() {
    let workspace = Workspace::new();
    let settings = workspace.path().join("arana.toml");
    std::fs::write(&settings, "[runner]\ntimeout-secs = 0\n").unwrap();

    cmd()
        .arg("https://example.com/jobs")
        .arg(&workspace.config)
        .arg("--settings")
        .arg(&settings)
        .assert()
        .code(2)
        .stderr(contains("timeout-secs"));
}

#[cfg(unix)]
#[test]
fn test_settings_file_supplies_runner() {
    let workspace = Workspace::new();
    let settings = workspace.path().join("arana.toml");
    std::fs::write(
        &settings,
        format!(
            "[runner]\nexecutable = \"false\"\nbase-dir = \"{}\"\n",
            workspace.path().display()
        ),
    )
    .unwrap();

    cmd()
        .arg("https://example.com/jobs")
        .arg(&workspace.config)
        .arg("--settings")
        .arg(&settings)
        .assert()
        .code(1)
        .stderr(contains(r#""exitCode":1"#));
}

#[test]
fn test_help_mentions_example() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("--casperjs").and(contains("--check-robots")));
}

#[cfg(unix)]
#[tokio::test]
async fn test_check_robots_refuses() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /"))
        .mount(&mock_server)
        .await;

    let workspace = Workspace::new();
    cmd()
        .arg(format!("{}/jobs", mock_server.uri()))
        .arg(&workspace.config)
        .args(["-c", "true", "--check-robots", "--base-dir"])
        .arg(workspace.path())
        .assert()
        .code(1)
        .stdout("")
        .stderr(contains("Crawling not allowed by robots.txt"));
}

/// Runs the binary and parses all of stderr as a single JSON document
fn stderr_json(assert: assert_cmd::assert::Assert) -> serde_json::Value {
    let stderr = String::from_utf8(assert.get_output().stderr.clone()).unwrap();
    serde_json::from_str(stderr.trim())
        .unwrap_or_else(|e| panic!("stderr is not a lone JSON payload ({}): {:?}", e, stderr))
}

#[cfg(unix)]
#[test]
fn test_failed_run_stderr_is_only_payload() {
    let workspace = Workspace::new();
    let assert = cmd()
        .arg("https://example.com/jobs")
        .arg(&workspace.config)
        .args(["-c", "false", "--base-dir"])
        .arg(workspace.path())
        .assert()
        .code(1);

    let payload = stderr_json(assert);
    assert_eq!(payload["failed"], true);
    assert_eq!(payload["exitCode"], 1);
    assert_eq!(payload["message"], "Script exited with non zero exit status");
}

#[test]
fn test_spawn_failure_stderr_is_only_payload() {
    let workspace = Workspace::new();
    let assert = cmd()
        .arg("https://example.com/jobs")
        .arg(&workspace.config)
        .args(["-c", "/nonexistent/binary", "--base-dir"])
        .arg(workspace.path())
        .assert()
        .code(1);

    let payload = stderr_json(assert);
    assert_eq!(payload["failed"], true);
    assert!(payload.get("exitCode").is_none());
    assert!(payload["message"]
        .as_str()
        .unwrap()
        .contains("/nonexistent/binary"));
}

#[cfg(unix)]
#[test]
fn test_timeout_keeps_partial_output() {
    let workspace = Workspace::new();
    let script = workspace.path().join("slow.sh");
    std::fs::write(&script, "echo partial-result\necho diag >&2\nsleep 5\n").unwrap();

    let assert = cmd()
        .arg("https://example.com/jobs")
        .arg(&workspace.config)
        .args(["-c", "sh", "--timeout", "1", "--script"])
        .arg(&script)
        .arg("--base-dir")
        .arg(workspace.path())
        .assert()
        .code(1);

    let payload = stderr_json(assert);
    assert_eq!(payload["message"], "Script timed out after 1s");
    assert_eq!(payload["stdout"], "partial-result");
    assert_eq!(payload["stderr"], "diag");
    assert!(payload.get("exitCode").is_none());
}
