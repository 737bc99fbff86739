//! CLI tests for the pd binary

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_help_lists_commands() {
    Command::cargo_bin("pd")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("stop"));
}

#[test]
fn test_rejects_unknown_subcommand() {
    Command::cargo_bin("pd")
        .unwrap()
        .arg("dance")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_list_rejects_unknown_format() {
    Command::cargo_bin("pd")
        .unwrap()
        .args(["list", "--format", "yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown format"));
}
