//! Tests for the `livefile` binary's argument handling and `check` command.

use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn livefile(dir: &TempDir) -> Result<Command> {
    let mut cmd = Command::cargo_bin("livefile")?;
    cmd.current_dir(dir.path()).env("NO_COLOR", "1");
    Ok(cmd)
}

#[test]
fn test_help_lists_commands() -> Result<()> {
    let dir = TempDir::new()?;
    livefile(&dir)?
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("check"));
    Ok(())
}

#[test]
fn test_check_without_files_fails() -> Result<()> {
    let dir = TempDir::new()?;
    livefile(&dir)?
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing required field: files"));
    Ok(())
}

#[test]
fn test_check_reports_files() -> Result<()> {
    let dir = TempDir::new()?;
    fs::write(dir.path().join("notes.md"), "hello")?;

    livefile(&dir)?
        .args(["check", "notes.md=notes", "gone.md"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Configuration is valid"))
        .stderr(predicate::str::contains("'notes'"))
        .stderr(predicate::str::contains("(not found)"));
    Ok(())
}

#[test]
fn test_check_reads_config_file_in_working_directory() -> Result<()> {
    let dir = TempDir::new()?;
    fs::write(
        dir.path().join("livefile.toml"),
        "[[files]]\npath = \"log.txt\"\nid = \"log\"\n",
    )?;

    livefile(&dir)?
        .arg("check")
        .assert()
        .success()
        .stderr(predicate::str::contains("'log'"));
    Ok(())
}

#[test]
fn test_check_summary_names_overflow_policy() -> Result<()> {
    let dir = TempDir::new()?;
    fs::write(
        dir.path().join("livefile.toml"),
        "overflow = \"drop-newest\"\n[[files]]\npath = \"log.txt\"\n",
    )?;

    livefile(&dir)?
        .arg("check")
        .assert()
        .success()
        .stderr(predicate::str::contains("with drop-newest overflow"));
    Ok(())
}

#[test]
fn test_empty_id_is_rejected() -> Result<()> {
    let dir = TempDir::new()?;
    livefile(&dir)?
        .args(["check", "notes.md="])
        .assert()
        .failure()
        .stderr(predicate::str::contains("notes.md="));
    Ok(())
}

#[test]
fn test_duplicate_ids_are_rejected() -> Result<()> {
    let dir = TempDir::new()?;
    livefile(&dir)?
        .args(["check", "a.md=same", "b.md=same"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("same"));
    Ok(())
}

#[test]
fn test_missing_explicit_config_fails() -> Result<()> {
    let dir = TempDir::new()?;
    livefile(&dir)?
        .args(["check", "--config", "nowhere.toml", "notes.md"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config file not found"));
    Ok(())
}
