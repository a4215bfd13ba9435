//! Integration tests for the `jamf` CLI binary.
//!
//! Argument parsing, help output, completions and error exit codes run
//! without a server; the rest talk to a wiremock JSS.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// The `jamf` binary with `JAMF_*` variables cleared and config
/// directories pointed at a nonexistent path.
fn jamf_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("jamf");
    cmd.env("HOME", "/tmp/jamf-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/jamf-cli-test-nonexistent")
        .env_remove("JAMF_PROFILE")
        .env_remove("JAMF_SERVER")
        .env_remove("JAMF_USERNAME")
        .env_remove("JAMF_PASSWORD")
        .env_remove("JAMF_OUTPUT")
        .env_remove("RUST_LOG");
    cmd
}

/// `jamf_cmd` aimed at a mock server with flag credentials.
fn jamf_at(server: &MockServer) -> assert_cmd::Command {
    let mut cmd = jamf_cmd();
    cmd.args(["--server", &server.uri(), "--username", "api-user"])
        .env("JAMF_PASSWORD", "s3cret");
    cmd
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

async fn mount_buildings(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/JSSResource/buildings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "buildings": [
                { "id": 1, "name": "Headquarters" },
                { "id": 2, "name": "Warehouse" }
            ]
        })))
        .mount(server)
        .await;
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = jamf_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    jamf_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("Jamf Pro")
            .and(predicate::str::contains("list"))
            .and(predicate::str::contains("mdm"))
            .and(predicate::str::contains("config")),
    );
}

#[test]
fn test_version_flag() {
    jamf_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("jamf"));
}

#[test]
fn test_completions_bash() {
    jamf_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_unknown_resource_is_usage_error() {
    jamf_cmd()
        .args(["list", "toasters"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid value"));
}

// ── Configuration errors ────────────────────────────────────────────

#[test]
fn test_list_without_config_reports_missing_config() {
    let output = jamf_cmd().args(["list", "computers"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("jamf config init"));
}

#[test]
fn test_unknown_profile_exits_not_found() {
    jamf_cmd()
        .args(["--profile", "nope", "list", "computers"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("nope"));
}

#[test]
fn test_server_without_credentials_is_auth_error() {
    jamf_cmd()
        .args(["--server", "jss.example.com", "list", "computers"])
        .assert()
        .code(3);
}

#[test]
fn test_config_set_and_show_round_trip_through_file() {
    let home = tempfile::tempdir().unwrap();
    let run = |args: &[&str]| {
        let mut cmd = jamf_cmd();
        cmd.env("HOME", home.path())
            .env("XDG_CONFIG_HOME", home.path())
            .args(args);
        cmd
    };

    run(&["config", "set", "server", "jss.example.com"])
        .assert()
        .success();
    run(&["config", "set", "username", "api-user"])
        .assert()
        .success();
    run(&["config", "set", "port", "not-a-port"])
        .assert()
        .code(2);

    run(&["--output", "json", "config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("jss.example.com")
                .and(predicate::str::contains("api-user"))
                .and(predicate::str::contains("8443")),
        );
}

// ── Against a mock server ───────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_list_buildings_as_json() {
    let server = MockServer::start().await;
    mount_buildings(&server).await;

    let output = jamf_at(&server)
        .args(["--output", "json", "list", "buildings"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let listed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(listed[1]["name"], "Warehouse");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_list_filter_and_plain_output() {
    let server = MockServer::start().await;
    mount_buildings(&server).await;

    jamf_at(&server)
        .args(["--output", "plain", "list", "buildings", "--filter", "WARE"])
        .assert()
        .success()
        .stdout("2\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_show_unknown_object_exits_not_found() {
    let server = MockServer::start().await;
    mount_buildings(&server).await;

    jamf_at(&server)
        .args(["show", "buildings", "Annex"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Annex"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_delete_without_yes_refuses_when_not_interactive() {
    let server = MockServer::start().await;
    mount_buildings(&server).await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    jamf_at(&server)
        .args(["delete", "buildings", "Warehouse"])
        .write_stdin("")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--yes"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_delete_read_only_resource_is_unsupported() {
    let server = MockServer::start().await;

    jamf_at(&server)
        .args(["--yes", "delete", "ldap-servers", "corp"])
        .assert()
        .code(5);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_delete_reports_ids_gone_before_delete() {
    let server = MockServer::start().await;
    // Both resolve, then Warehouse disappears before the delete pass.
    Mock::given(method("GET"))
        .and(path("/JSSResource/buildings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "buildings": [
                { "id": 1, "name": "Headquarters" },
                { "id": 2, "name": "Warehouse" }
            ]
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/JSSResource/buildings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "buildings": [{ "id": 1, "name": "Headquarters" }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/JSSResource/buildings/id/1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/JSSResource/buildings/id/2"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let output = jamf_at(&server)
        .args(["--yes", "--output", "json", "delete", "buildings", "1", "Warehouse"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report, json!({ "deleted": [1], "skipped": [2] }));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Deleted 1 buildings"));
}
