//! Integration tests for the `gridline` CLI binary.
//!
//! Argument parsing, help, completions and error exits run without a
//! backend; the collection commands run against a wiremock server passed
//! via `--base-url`.
#![allow(clippy::unwrap_used)]

use std::process::Output;

use assert_cmd::assert::OutputAssertExt;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `gridline` binary with env isolation.
///
/// Clears all `GRIDLINE_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn gridline_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("gridline");
    cmd.env("HOME", "/tmp/gridline-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/gridline-cli-test-nonexistent")
        .env("NO_COLOR", "1")
        .env_remove("GRIDLINE_PROFILE")
        .env_remove("GRIDLINE_BASE_URL")
        .env_remove("GRIDLINE_TOKEN")
        .env_remove("GRIDLINE_OUTPUT")
        .env_remove("GRIDLINE_INSECURE")
        .env_remove("GRIDLINE_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

/// Command pointed at a mock backend.
fn against(server: &MockServer) -> assert_cmd::Command {
    let mut cmd = gridline_cmd();
    cmd.arg("--base-url").arg(server.uri());
    cmd
}

/// Run a command off the async runtime so the mock server keeps serving.
async fn run(mut cmd: assert_cmd::Command) -> Output {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

fn combined_output(output: &Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn products_page() -> serde_json::Value {
    json!({
        "data": {
            "items": [
                { "id": 1, "name": "Widget", "code": "W-1" },
                { "id": 2, "name": "Gadget, large", "code": null }
            ],
            "pagination": { "total": 2, "totalPages": 1 }
        }
    })
}

async fn products_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(products_page()))
        .mount(&server)
        .await;
    server
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = gridline_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    gridline_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("paginated REST collections")
            .and(predicate::str::contains("list"))
            .and(predicate::str::contains("import"))
            .and(predicate::str::contains("export")),
    );
}

#[test]
fn test_version_flag() {
    gridline_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("gridline"));
}

#[test]
fn test_completions_bash() {
    gridline_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_config_path_points_at_config_toml() {
    gridline_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

// ── Error exits ─────────────────────────────────────────────────────

#[test]
fn test_list_without_config_or_url_fails() {
    let output = gridline_cmd().args(["list", "products"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(combined_output(&output).contains("No backend configured"));
}

#[test]
fn test_unknown_output_format_is_usage_error() {
    let output = gridline_cmd()
        .args(["-o", "yaml", "list", "products"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_unsupported_page_size_is_rejected_before_any_request() {
    let output = gridline_cmd()
        .args(["--base-url", "http://127.0.0.1:9", "list", "products", "--limit", "7"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("page size 7"));
}

#[test]
fn test_delete_without_yes_in_non_interactive_context() {
    let output = gridline_cmd()
        .args(["--base-url", "http://127.0.0.1:9", "delete", "products", "4"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("--yes"));
}

// ── Against a mock backend ──────────────────────────────────────────

#[tokio::test]
async fn test_list_renders_table_and_footer() {
    let server = products_server().await;
    let mut cmd = against(&server);
    cmd.args(["list", "products"]);

    run(cmd).await.assert().success().stdout(
        predicate::str::contains("NAME")
            .and(predicate::str::contains("Gadget, large"))
            .and(predicate::str::contains("2 of 2 products"))
            .and(predicate::str::contains("page 1 of 1")),
    );
}

#[tokio::test]
async fn test_list_sends_page_limit_and_search() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products"))
        .and(query_param("page", "1"))
        .and(query_param("limit", "25"))
        .and(query_param("search", "wid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(products_page()))
        .expect(1)
        .mount(&server)
        .await;

    let mut cmd = against(&server);
    cmd.args(["-o", "plain", "list", "products", "--limit", "25", "--search", "  wid  "]);
    run(cmd).await.assert().success().stdout("1\n2\n");
}

#[tokio::test]
async fn test_list_json_carries_pagination() {
    let server = products_server().await;
    let mut cmd = against(&server);
    cmd.args(["-o", "json", "list", "products"]);

    let output = run(cmd).await;
    assert!(output.status.success());
    let body: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body["items"][1]["name"], "Gadget, large");
    assert_eq!(body["pagination"]["total"], 2);
}

#[tokio::test]
async fn test_backend_outage_exits_with_connection_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let mut cmd = against(&server);
    cmd.args(["list", "products"]);
    assert_eq!(run(cmd).await.status.code(), Some(7));
}

#[tokio::test]
async fn test_export_writes_quoted_csv_to_file() {
    let server = products_server().await;
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("products.csv");

    let mut cmd = against(&server);
    cmd.args(["export", "products", "--out"]).arg(&file);
    run(cmd).await.assert().success();

    let csv = std::fs::read_to_string(&file).unwrap();
    assert_eq!(csv, "id,name,code\n1,Widget,W-1\n2,\"Gadget, large\",\n");
}

#[tokio::test]
async fn test_export_selected_ids_only() {
    let server = products_server().await;
    let mut cmd = against(&server);
    cmd.args(["export", "products", "--id", "2"]);

    run(cmd)
        .await
        .assert()
        .success()
        .stdout("id,name,code\n2,\"Gadget, large\",\n");
}

#[tokio::test]
async fn test_export_unknown_id_is_not_found() {
    let server = products_server().await;
    let mut cmd = against(&server);
    cmd.args(["export", "products", "--id", "99"]);
    assert_eq!(run(cmd).await.status.code(), Some(4));
}

#[tokio::test]
async fn test_import_with_rejection_exits_partial() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/products"))
        .and(body_json(json!({ "name": "Widget", "code": "W-1" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": { "id": 1, "name": "Widget", "code": "W-1" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/products"))
        .and(body_json(json!({ "name": "Copy", "code": "W-1" })))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "message": "duplicate code"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("products.csv");
    std::fs::write(&file, "name,code\nWidget,W-1\nCopy,W-1\n").unwrap();

    let mut cmd = against(&server);
    cmd.args(["import", "products"]).arg(&file);
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(9));
    let text = combined_output(&output);
    assert!(text.contains("duplicate code"), "{text}");
    assert!(text.contains("Imported 1 of 2 records"), "{text}");
}

#[tokio::test]
async fn test_import_malformed_file_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("broken.csv");
    std::fs::write(&file, "name,code\nA,1,surplus\n").unwrap();

    let mut cmd = against(&server);
    cmd.args(["import", "products"]).arg(&file);
    let output = run(cmd).await;
    assert_eq!(output.status.code(), Some(1));
    assert!(combined_output(&output).contains("Could not read import file"));
}

#[tokio::test]
async fn test_delete_with_yes_calls_backend() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/products/4"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let mut cmd = against(&server);
    cmd.args(["-y", "delete", "products", "4"]);
    run(cmd)
        .await
        .assert()
        .success()
        .stderr(predicate::str::contains("Deleted \"#4\""));
}

#[tokio::test]
async fn test_delete_keeps_zero_padded_id_in_path() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/products/007"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let mut cmd = against(&server);
    cmd.args(["-y", "delete", "products", "007"]);
    run(cmd).await.assert().success();
}

#[tokio::test]
async fn test_export_matches_string_keyed_ids() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "items": [
                    { "id": "007", "name": "Agent" },
                    { "id": "7", "name": "Seven" }
                ],
                "pagination": { "total": 2, "totalPages": 1 }
            }
        })))
        .mount(&server)
        .await;

    let mut cmd = against(&server);
    cmd.args(["export", "products", "--id", "007"]);
    run(cmd).await.assert().success().stdout("id,name\n007,Agent\n");
}

#[tokio::test]
async fn test_delete_missing_row_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/products/4"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "no such product" })))
        .mount(&server)
        .await;

    let mut cmd = against(&server);
    cmd.args(["-y", "delete", "products", "4"]);
    let output = run(cmd).await;
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("gridline list products"));
}

#[tokio::test]
async fn test_create_prints_the_new_row() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/products"))
        .and(body_json(json!({ "name": "Widget" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": { "id": 12, "name": "Widget" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut cmd = against(&server);
    cmd.args(["-o", "plain", "create", "products", "--data", r#"{"name": "Widget"}"#]);
    run(cmd).await.assert().success().stdout("12\n");
}
