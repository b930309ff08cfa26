use assert_cmd::Command;
use tempfile::tempdir;

const QPG: &str = "qpg";

fn cmd(catalog: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin(QPG).unwrap();
    cmd.arg("--catalog").arg(catalog);
    cmd
}

#[test]
fn help_succeeds() {
    let mut cmd = Command::cargo_bin(QPG).unwrap();
    cmd.arg("--help").assert().success();
}

#[test]
fn source_add_then_list_round_trips() {
    let dir = tempdir().unwrap();
    let catalog = dir.path().join("index.sqlite");

    cmd(&catalog)
        .args(["source", "add", "work", "postgresql://ro@localhost:5432/db"])
        .assert()
        .success();

    let assert = cmd(&catalog).args(["source", "list"]).assert().success();
    let output = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(output.contains("work"));
    assert!(!output.contains("secret"));
}

#[test]
fn source_remove_drops_the_source() {
    let dir = tempdir().unwrap();
    let catalog = dir.path().join("index.sqlite");

    cmd(&catalog)
        .args(["source", "add", "work", "postgresql://ro@localhost:5432/db"])
        .assert()
        .success();
    cmd(&catalog).args(["source", "remove", "work"]).assert().success();

    let assert = cmd(&catalog).args(["source", "list"]).assert().success();
    let output = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(!output.contains("work"));
}

#[test]
fn status_on_empty_catalog_succeeds() {
    let dir = tempdir().unwrap();
    let catalog = dir.path().join("index.sqlite");
    cmd(&catalog).arg("status").assert().success();
}

#[test]
fn get_on_missing_object_exits_with_user_error_code() {
    let dir = tempdir().unwrap();
    let catalog = dir.path().join("index.sqlite");
    cmd(&catalog)
        .args(["source", "add", "work", "postgresql://ro@localhost:5432/db"])
        .assert()
        .success();

    cmd(&catalog)
        .args(["get", "work", "public.nope"])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn context_add_then_list_round_trips() {
    let dir = tempdir().unwrap();
    let catalog = dir.path().join("index.sqlite");

    cmd(&catalog)
        .args(["context", "add", "qpg://work", "billing domain source"])
        .assert()
        .success();

    let assert = cmd(&catalog).args(["context", "list"]).assert().success();
    let output = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(output.contains("qpg://work"));
    assert!(output.contains("billing domain source"));
}

#[test]
fn context_add_rejects_malformed_target() {
    let dir = tempdir().unwrap();
    let catalog = dir.path().join("index.sqlite");

    cmd(&catalog)
        .args(["context", "add", "not-a-target", "note"])
        .assert()
        .failure();
}

#[test]
fn context_remove_drops_the_note() {
    let dir = tempdir().unwrap();
    let catalog = dir.path().join("index.sqlite");

    cmd(&catalog)
        .args(["context", "add", "qpg://work/public", "schema note"])
        .assert()
        .success();
    cmd(&catalog)
        .args(["context", "remove", "qpg://work/public"])
        .assert()
        .success();

    let assert = cmd(&catalog).args(["context", "list"]).assert().success();
    let output = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(!output.contains("schema note"));
}

#[test]
fn auth_check_against_unregistered_source_exits_with_user_error_code() {
    let dir = tempdir().unwrap();
    let catalog = dir.path().join("index.sqlite");
    cmd(&catalog)
        .args(["auth", "check", "nope"])
        .assert()
        .failure()
        .code(1);
}
