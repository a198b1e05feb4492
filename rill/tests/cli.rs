//! Binary tests for the `rill` CLI.

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;

fn script(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write script");
    file
}

#[test]
fn runs_a_script() {
    let file = script("print(1 + 2);");
    Command::cargo_bin("rill")
        .unwrap()
        .arg(file.path())
        .assert()
        .success()
        .stdout("3\n");
}

#[test]
fn script_result_is_not_printed() {
    let file = script("let a = 5; a * 2;");
    Command::cargo_bin("rill")
        .unwrap()
        .arg(file.path())
        .assert()
        .success()
        .stdout("");
}

#[test]
fn runtime_errors_exit_nonzero() {
    let file = script("5 + true;");
    Command::cargo_bin("rill")
        .unwrap()
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("[1:4] type mismatch: INTEGER + BOOLEAN"));
}

#[test]
fn parse_errors_exit_nonzero() {
    let file = script("const A = 1;\nA = 2;");
    Command::cargo_bin("rill")
        .unwrap()
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("can not reassign constant A."));
}

#[test]
fn missing_file_exits_nonzero() {
    Command::cargo_bin("rill")
        .unwrap()
        .arg("no-such-file.rill")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no-such-file.rill"));
}

#[test]
fn version_flag() {
    Command::cargo_bin("rill")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("rill"));
}
