#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;

fn skerry() -> Command {
    let mut cmd = Command::cargo_bin("skerry").expect("binary under test");
    cmd.env_remove("SKERRY_ENDPOINT").env_remove("SKERRY_TOKEN");
    cmd
}

// ---------------------------------------------------------------------------
// Argument surface
// ---------------------------------------------------------------------------

#[test]
fn help_lists_the_command_groups() {
    skerry()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("service"))
        .stdout(predicate::str::contains("config"))
        .stdout(predicate::str::contains("table"))
        .stdout(predicate::str::contains("script"));
}

#[test]
fn version_flag_prints_the_version() {
    skerry()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("skerry"));
}

#[test]
fn no_arguments_is_a_usage_error() {
    skerry()
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn unknown_format_is_rejected() {
    skerry()
        .args(["--format", "xml", "service", "list"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("xml"));
}

// ---------------------------------------------------------------------------
// Local validation, no backend involved
// ---------------------------------------------------------------------------

#[test]
fn config_get_unknown_key_fails() {
    skerry()
        .args(["config", "get", "todo", "noSuchKey"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("unknown settings key"));
}

#[test]
fn script_download_invalid_name_prints_the_accepted_shapes() {
    skerry()
        .args(["script", "download", "todo", "bogus"])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("For a table script"))
        .stdout(predicate::str::contains("For a scheduler script"))
        .stderr(predicate::str::contains("unrecognized script name"));
}

#[test]
fn table_update_without_changes_is_a_no_op() {
    skerry()
        .args(["table", "update", "todo", "items"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No updates performed"));
}

// ---------------------------------------------------------------------------
// Endpoint handling
// ---------------------------------------------------------------------------

#[test]
fn malformed_endpoint_is_a_configuration_error() {
    skerry()
        .args(["--endpoint", "::bad::", "service", "list"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("configuration error"));
}

#[test]
fn endpoint_env_var_is_honored() {
    skerry()
        .env("SKERRY_ENDPOINT", "::bad::")
        .args(["service", "list"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("configuration error"));
}
