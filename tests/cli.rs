//! End-to-end tests for the pypi-downloads binary.

use std::fs;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;


fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("pypi-downloads").unwrap();
    cmd.env_remove("PYPI_DOWNLOADS_PACKAGE")
        .env_remove("PYPISTATS_API_URL")
        .env_remove("RUST_LOG");
    cmd
}


/// Serve one canned JSON response and return the API base URL.
fn serve_once(status_line: &'static str, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf);
            let response = format!(
                "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });

    format!("http://{addr}/api")
}


#[test]
fn requires_package_and_out() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("--package"));

    cmd()
        .args(["--package", "numpy"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--out"));
}


#[test]
fn offline_without_history_fails() {
    let tmp_dir = TempDir::new().unwrap();

    cmd()
        .current_dir(tmp_dir.path())
        .args(["--package", "numpy", "--out", "chart.png", "--offline"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::starts_with("Error:"));
}


#[test]
fn offline_renders_png_from_history() {
    let tmp_dir = TempDir::new().unwrap();
    let history = tmp_dir.path().join("history.csv");
    let out = tmp_dir.path().join("charts").join("downloads.png");
    fs::write(&history, "date,downloads\n2024-03-01,10\n2024-03-04,40\n").unwrap();

    cmd()
        .arg("--package")
        .arg("numpy")
        .arg("--out")
        .arg(&out)
        .arg("--history-csv")
        .arg(&history)
        .arg("--offline")
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 4 days"));

    let bytes = fs::read(&out).unwrap();
    assert_eq!(&bytes[..4], b"\x89PNG");
}


#[test]
fn empty_window_exits_non_zero() {
    let tmp_dir = TempDir::new().unwrap();
    let history = tmp_dir.path().join("history.csv");
    fs::write(&history, "date,downloads\n2999-01-01,10\n").unwrap();

    cmd()
        .arg("--package")
        .arg("numpy")
        .arg("--out")
        .arg(tmp_dir.path().join("chart.svg"))
        .arg("--history-csv")
        .arg(&history)
        .arg("--offline")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No data to plot"));
}


#[test]
fn fetch_merges_into_history() {
    let tmp_dir = TempDir::new().unwrap();
    let history = tmp_dir.path().join("history.csv");
    fs::write(&history, "date,downloads\n2024-01-01,5\n2024-01-03,7\n").unwrap();

    let api_url = serve_once(
        "HTTP/1.1 200 OK",
        r#"{"data": [
            {"category": "with_mirrors", "date": "2024-01-02", "downloads": 300},
            {"category": "without_mirrors", "date": "2024-01-02", "downloads": 3},
            {"category": "without_mirrors", "date": "2024-01-03", "downloads": 9}
        ]}"#,
    );

    cmd()
        .arg("--package")
        .arg("demo")
        .arg("--out")
        .arg(tmp_dir.path().join("chart.svg"))
        .arg("--history-csv")
        .arg(&history)
        .arg("--api-url")
        .arg(&api_url)
        .assert()
        .success();

    let contents = fs::read_to_string(&history).unwrap();
    assert_eq!(contents, "date,downloads\n2024-01-01,5\n2024-01-02,3\n2024-01-03,9\n");
}


#[test]
fn http_error_fails_without_touching_history() {
    let tmp_dir = TempDir::new().unwrap();
    let history = tmp_dir.path().join("history.csv");
    let original = "date,downloads\n2024-01-01,5\n";
    fs::write(&history, original).unwrap();

    let api_url = serve_once("HTTP/1.1 500 Internal Server Error", "{}");

    cmd()
        .arg("--package")
        .arg("demo")
        .arg("--out")
        .arg(tmp_dir.path().join("chart.png"))
        .arg("--history-csv")
        .arg(&history)
        .arg("--api-url")
        .arg(&api_url)
        .assert()
        .failure()
        .stderr(predicate::str::contains("HTTP 500"));

    assert_eq!(fs::read_to_string(&history).unwrap(), original);
}
