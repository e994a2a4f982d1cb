//! Integration tests for the pyrunner CLI binary
//!
//! These tests execute the compiled binary using `assert_cmd`, with `/bin/sh`
//! as the interpreter and the temporary directory as the working directory so
//! no `pyrunner.toml` from the surrounding checkout is discovered.

#![cfg(unix)]

use assert_cmd::assert::OutputAssertExt;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};
use tempfile::TempDir;

fn pyrunner_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("pyrunner"));
    cmd.current_dir(dir)
        .env_remove("PYRUNNER_INTERPRETER")
        .env_remove("PYRUNNER_TIMEOUT_MS")
        .env_remove("PYRUNNER_WORKING_DIR")
        .env_remove("RUST_LOG")
        .stdin(Stdio::null())
        .args(["--interpreter", "/bin/sh"]);
    cmd
}

fn script(dir: &TempDir, name: &str, body: &str) {
    fs::write(dir.path().join(name), body).unwrap();
}

#[test]
fn exec_prints_stdout() {
    let dir = TempDir::new().unwrap();
    script(&dir, "hello.sh", "echo 'Hello World'\n");

    pyrunner_cmd(dir.path())
        .args(["exec", "hello.sh"])
        .assert()
        .success()
        .stdout("Hello World\n");
}

#[test]
fn exec_forwards_arguments_after_script() {
    let dir = TempDir::new().unwrap();
    script(&dir, "args.sh", "printf '%s|' \"$@\"\n");

    pyrunner_cmd(dir.path())
        .args(["exec", "args.sh", "42", "--not-a-flag", "Second \"quoted\" example"])
        .assert()
        .success()
        .stdout("42|--not-a-flag|Second \"quoted\" example|\n");
}

#[test]
fn exec_with_stderr_exits_script_failed() {
    let dir = TempDir::new().unwrap();
    script(&dir, "fail.sh", "echo 'Traceback: boom' >&2\n");

    pyrunner_cmd(dir.path())
        .args(["exec", "fail.sh"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Traceback: boom"));
}

#[test]
fn exec_timeout_prints_partial_output_and_exits_timeout() {
    let dir = TempDir::new().unwrap();
    script(&dir, "slow.sh", "echo started\nexec sleep 30\n");

    pyrunner_cmd(dir.path())
        .args(["--timeout-ms", "300", "exec", "slow.sh"])
        .assert()
        .code(10)
        .stdout(predicate::str::contains("started"))
        .stdout(predicate::str::contains("PYRUNNER TIMEOUT"));
}

#[test]
fn exec_missing_script_is_precondition_failure() {
    let dir = TempDir::new().unwrap();

    pyrunner_cmd(dir.path())
        .args(["exec", "absent.sh"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("absent.sh"));
}

#[test]
fn missing_interpreter_is_configuration_failure() {
    let dir = TempDir::new().unwrap();
    script(&dir, "hello.sh", "echo hi\n");

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("pyrunner"));
    cmd.current_dir(dir.path())
        .args(["--interpreter", "/nonexistent/python3", "exec", "hello.sh"])
        .assert()
        .code(2);
}

#[test]
fn negative_timeout_is_configuration_failure() {
    let dir = TempDir::new().unwrap();
    script(&dir, "hello.sh", "echo hi\n");

    pyrunner_cmd(dir.path())
        .args(["--timeout-ms", "-1", "exec", "hello.sh"])
        .assert()
        .code(2);
}

#[test]
fn json_output_reports_full_result() {
    let dir = TempDir::new().unwrap();
    script(&dir, "mixed.sh", "echo out\necho err >&2\nexit 5\n");

    let output = pyrunner_cmd(dir.path())
        .args(["--json", "exec", "mixed.sh"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["stdout"], "out");
    assert_eq!(json["stderr"], "err");
    assert_eq!(json["exit_code"], 5);
    assert_eq!(json["timed_out"], false);
}

#[test]
fn payload_out_writes_decoded_bytes() {
    let dir = TempDir::new().unwrap();
    script(&dir, "plot.sh", "echo \"b'aGVsbG8gd29ybGQ='\"\n");

    pyrunner_cmd(dir.path())
        .args(["exec", "plot.sh", "--payload-out", "plot.bin"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 11 bytes"));

    assert_eq!(fs::read(dir.path().join("plot.bin")).unwrap(), b"hello world");
}

#[test]
fn config_json_reports_sources() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("pyrunner.toml"), "[runner]\ntimeout_ms = 1500\n").unwrap();

    let output = pyrunner_cmd(dir.path())
        .args(["--json", "config"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["interpreter"]["value"], "/bin/sh");
    assert_eq!(json["interpreter"]["source"], "cli");
    assert_eq!(json["timeout_ms"]["value"], "1500");
    assert_eq!(json["timeout_ms"]["source"], "config");
}

#[test]
fn venv_path_prints_environment_interpreter() {
    let dir = TempDir::new().unwrap();

    pyrunner_cmd(dir.path())
        .args(["--cwd"])
        .arg(dir.path())
        .args(["venv", "path"])
        .assert()
        .success()
        .stdout(predicate::str::ends_with(".venv/bin/python3\n"));
}

#[test]
fn venv_relative_path_is_under_working_directory() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("work")).unwrap();

    pyrunner_cmd(dir.path())
        .args(["--cwd", "work", "venv", "--path", "env", "path"])
        .assert()
        .success()
        .stdout(predicate::str::ends_with("work/env/bin/python3\n"));
}

#[test]
fn venv_delete_without_environment_succeeds() {
    let dir = TempDir::new().unwrap();

    pyrunner_cmd(dir.path())
        .args(["venv", "--path", "env", "delete"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No environment"));
}

#[test]
fn version_output() {
    Command::new(assert_cmd::cargo::cargo_bin!("pyrunner"))
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("pyrunner"));
}
