//! Command-line tests that need no network access.

use assert_cmd::Command;
use predicates::prelude::*;

fn harvester() -> Command {
    #[allow(clippy::expect_used)]
    Command::cargo_bin("seaaroundus-harvester").expect("binary is built")
}

#[test]
fn test_list_prints_categories() {
    harvester()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("eez"))
        .stdout(predicate::str::contains("highseas"))
        .stdout(predicate::str::contains("fishing-entity"));
}

#[test]
fn test_harvest_unknown_category_fails_before_fetching() {
    let dir = tempfile::TempDir::new().unwrap();
    harvester()
        .args(["harvest", "unicorn", "--state-file"])
        .arg(dir.path().join("state.yaml"))
        .args(["--api-url", "http://127.0.0.1:9"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Unknown category: 'unicorn'"));

    assert!(!dir.path().join("state.yaml").exists());
}

#[test]
fn test_harvest_rejects_invalid_api_url() {
    harvester()
        .args(["harvest", "eez", "--api-url", "not a url"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration"));
}

#[test]
fn test_harvest_without_categories_is_usage_error() {
    harvester().arg("harvest").assert().failure();
}
