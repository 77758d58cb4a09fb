//! Integration tests for the cetdir CLI.
//!
//! Runs the binary against a temporary root directory so every command
//! works on its own `.cetdir/` state.

use anyhow::Result;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn cetdir(root: &Path, args: &[&str]) -> Result<Output> {
    Ok(Command::new(env!("CARGO_BIN_EXE_cetdir"))
        .arg("--config")
        .arg(root)
        .args(args)
        .output()?)
}

/// Creates a record and returns its id from the `✔ Created` line.
fn create(root: &Path, args: &[&str]) -> Result<String> {
    let mut full = vec!["create"];
    full.extend_from_slice(args);
    let output = cetdir(root, &full)?;
    assert!(output.status.success(), "{:?}", output);

    let stdout = String::from_utf8(output.stdout)?;
    let id = stdout
        .split_whitespace()
        .nth(3)
        .expect("created record id")
        .to_string();
    Ok(id)
}

#[test]
fn test_cli_version() -> Result<()> {
    let output = Command::new(env!("CARGO_BIN_EXE_cetdir"))
        .arg("--version")
        .output()?;

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("cetdir"));

    Ok(())
}

#[test]
fn test_cli_help() -> Result<()> {
    let output = Command::new(env!("CARGO_BIN_EXE_cetdir"))
        .arg("--help")
        .output()?;

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("list"));
    assert!(stdout.contains("approve-category"));
    assert!(stdout.contains("resend"));

    Ok(())
}

#[test]
fn test_cli_list_empty() -> Result<()> {
    let temp_dir = TempDir::new()?;

    let output = cetdir(temp_dir.path(), &["list", "persona"])?;

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("Sin invitar (0)"));
    assert!(stdout.contains("Verificadas (0)"));

    Ok(())
}

#[test]
fn test_cli_invite_flow() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let id = create(temp_dir.path(), &["persona", "Ana Pérez"])?;

    let output = cetdir(
        temp_dir.path(),
        &["--admin", "admin1", "invite", &id, "ana@cet.edu.ar"],
    )?;
    assert!(output.status.success(), "{:?}", output);
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("sin_invitacion → invitacion_enviada"));
    assert!(stdout.contains("invitation token:"));

    let output = cetdir(temp_dir.path(), &["list", "persona", "--long"])?;
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("Invitados sin reclamar (1)"));
    assert!(stdout.contains("ana@cet.edu.ar"));

    let outbox = temp_dir.path().join(".cetdir/outbox");
    assert!(outbox.join("tokens.json").exists());

    Ok(())
}

#[test]
fn test_cli_transition_requires_admin() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let id = create(temp_dir.path(), &["persona", "Ana", "--submission"])?;

    let output = cetdir(temp_dir.path(), &["reject", &id])?;

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr)?;
    assert!(stderr.contains("--admin"));

    Ok(())
}

#[test]
fn test_cli_approve_without_category_fails() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let id = create(temp_dir.path(), &["persona", "Ana", "--submission"])?;

    let output = cetdir(
        temp_dir.path(),
        &["--admin", "admin1", "approve-category", &id, ""],
    )?;

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr)?;
    assert!(stderr.contains("Error:"));

    let output = cetdir(temp_dir.path(), &["show", &id])?;
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("pendiente_aprobacion"));

    Ok(())
}

#[test]
fn test_cli_unknown_record_fails() -> Result<()> {
    let temp_dir = TempDir::new()?;

    let output = cetdir(temp_dir.path(), &["show", "missing"])?;

    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(1));

    Ok(())
}
