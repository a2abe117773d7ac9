use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;

fn ultest() -> Command {
    let mut cmd = Command::cargo_bin("ultest").unwrap();
    cmd.arg("--no-color");
    cmd
}

fn suite_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn runs_every_builtin_block_without_config() {
    ultest()
        .arg("run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Starting printer ..."))
        .stdout(predicate::str::contains("Ended printer. All Good!!!"))
        .stdout(predicate::str::contains("Ended selection. All Good!!!"))
        .stdout(predicate::str::contains("Ended template. All Good!!!"))
        .stderr(predicate::str::contains("suite result: ok. 3 completed, 0 skipped"));
}

#[test]
fn only_flag_restricts_and_announces() {
    ultest()
        .args(["run", "--only", "template"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Executing only 'template' test block"))
        .stdout(predicate::str::contains("Ended template. All Good!!!"))
        .stdout(predicate::str::contains("Starting printer").not())
        .stderr(predicate::str::contains("1 completed, 2 skipped"));
}

#[test]
fn level_flag_shows_test_logs() {
    ultest()
        .args(["run", "--only", "printer", "--level", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("testing 1"))
        .stdout(predicate::str::contains("sorted keys { a: 2, b: 1 }"));
}

#[test]
fn level_flag_is_range_checked() {
    ultest().args(["run", "--level", "3"]).assert().failure();
}

#[test]
fn suite_file_selects_and_aliases_blocks() {
    let file = suite_file(
        r#"
        [testNames]
        except = ["printer"]

        [[tests]]
        name = "printer"

        [[tests]]
        name = "indexes"
        block = "selection"
        testIndexes = { only = [3] }
        logs = { level = 1 }
        "#,
    );

    ultest()
        .arg("run")
        .arg("--config")
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Executing all test blocks except 'printer'"))
        .stdout(predicate::str::contains("testing 3"))
        .stdout(predicate::str::contains("testing 1").not())
        .stdout(predicate::str::contains("Ended indexes. All Good!!!"));
}

#[test]
fn unknown_block_fails_before_running() {
    let file = suite_file(
        r#"
        [[tests]]
        name = "nope"
        "#,
    );

    ultest()
        .arg("run")
        .arg("--config")
        .arg(file.path())
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("no test block registered under 'nope'"));
}

#[test]
fn invalid_level_in_file_names_the_block() {
    let file = suite_file(
        r#"
        [[tests]]
        name = "template"
        logs = { level = 7 }
        "#,
    );

    ultest()
        .arg("run")
        .arg("--config")
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "invalid configuration for test block 'template'",
        ));
}

#[test]
fn malformed_suite_file_is_reported_with_location() {
    let file = suite_file("[[tests]\nname = \"printer\"\n");

    ultest()
        .arg("run")
        .arg("--config")
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid suite configuration"))
        .stderr(predicate::str::contains("[[tests]"));
}

#[test]
fn missing_suite_file_is_an_error() {
    ultest()
        .args(["run", "--config", "does-not-exist.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read 'does-not-exist.toml'"));
}

#[test]
fn list_shows_registered_and_configured_blocks() {
    let file = suite_file(
        r#"
        [testNames]
        only = ["fmt"]

        [[tests]]
        name = "fmt"
        block = "printer"

        [[tests]]
        name = "template"
        "#,
    );

    ultest()
        .arg("list")
        .arg("--config")
        .arg(file.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("  printer\n  selection\n  template\n"))
        .stderr(predicate::str::contains("  fmt (printer)"))
        .stderr(predicate::str::contains("  template [skipped]"));
}

#[test]
fn caught_panics_stay_off_stderr() {
    ultest()
        .args(["run", "--only", "selection"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Ended selection. All Good!!!"))
        .stderr(predicate::str::contains("panicked").not());
}

#[test]
fn verbose_flag_enables_harness_tracing() {
    ultest()
        .env_remove("RUST_LOG")
        .args(["-v", "run", "--only", "template"])
        .assert()
        .success()
        .stderr(predicate::str::contains("running test block"));

    ultest()
        .env_remove("RUST_LOG")
        .args(["run", "--only", "template"])
        .assert()
        .success()
        .stderr(predicate::str::contains("running test block").not());
}
