//! Command-line tests for the `pf` binary

use assert_cmd::Command;
use predicates::prelude::*;

const PROPOSAL: &str = "# Recipe App\n\n## Executive Summary\nCook & learn.\n";

fn pf(home: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("pf").unwrap();
    cmd.current_dir(home)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"))
        .env_remove("RUST_LOG");
    cmd
}

fn write_config(dir: &std::path::Path, key_env: &str) -> std::path::PathBuf {
    let path = dir.join("pf.yml");
    std::fs::write(&path, format!("llm:\n  provider: gemini\n  api-key-env: {}\n", key_env)).unwrap();
    path
}

#[test]
fn test_export_html() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("proposal.md"), PROPOSAL).unwrap();

    pf(dir.path())
        .args(["export", "proposal.md", "--name", "Recipe App", "--format", "html", "--out", "."])
        .assert()
        .success()
        .stdout(predicate::str::contains("recipe_app_proposal.html"));

    let html = std::fs::read_to_string(dir.path().join("recipe_app_proposal.html")).unwrap();
    assert!(html.contains("<title>Recipe App - Project Proposal</title>"));
    assert!(html.contains("Cook &amp; learn."));
}

#[test]
fn test_export_txt_is_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("proposal.md"), PROPOSAL).unwrap();

    pf(dir.path())
        .args(["export", "proposal.md", "--name", "Recipe App"])
        .assert()
        .success();

    let txt = std::fs::read_to_string(dir.path().join("recipe_app_proposal.txt")).unwrap();
    assert_eq!(txt, PROPOSAL);
}

#[test]
fn test_export_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    pf(dir.path())
        .args(["export", "nope.md", "--name", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read proposal"));
}

#[test]
fn test_check_without_key_prints_instructions() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "PROJECTFORGE_CLI_TEST_KEY");

    pf(dir.path())
        .env_remove("PROJECTFORGE_CLI_TEST_KEY")
        .arg("--config")
        .arg(&config)
        .arg("check")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Configuration Required"))
        .stdout(predicate::str::contains("PROJECTFORGE_CLI_TEST_KEY"));
}

#[test]
fn test_check_rejects_placeholder_key() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "PROJECTFORGE_CLI_TEST_KEY");

    pf(dir.path())
        .env("PROJECTFORGE_CLI_TEST_KEY", "YOUR_API_KEY_HERE")
        .arg("--config")
        .arg(&config)
        .arg("check")
        .assert()
        .failure();
}

#[test]
fn test_check_with_key_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "PROJECTFORGE_CLI_TEST_KEY");

    pf(dir.path())
        .env("PROJECTFORGE_CLI_TEST_KEY", "abc123")
        .arg("--config")
        .arg(&config)
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("gemini-2.5-flash"));
}
