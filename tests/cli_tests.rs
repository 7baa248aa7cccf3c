//! CLI integration tests
//!
//! These tests verify the CLI commands work correctly by running the binary.

#![cfg(feature = "cli")]

use std::path::PathBuf;
use std::process::Command;

use tempfile::TempDir;

fn ecospold_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_ecospold"))
}

fn fixtures_dir() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path
}

// ============================================================================
// Validate Command Tests
// ============================================================================

#[test]
fn test_cli_validate_valid_file() {
    let output = Command::new(ecospold_bin())
        .args(["validate", fixtures_dir().join("v1/electricity.xml").to_str().unwrap()])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("1 file(s) checked, 0 invalid"));
}

#[test]
fn test_cli_validate_directory_with_invalid_file() {
    let output = Command::new(ecospold_bin())
        .args(["validate", fixtures_dir().join("batch").to_str().unwrap()])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("04_broken.xml"));
    assert!(stdout.contains("4 file(s) checked, 1 invalid"));
}

#[test]
fn test_cli_validate_v2() {
    let output = Command::new(ecospold_bin())
        .args([
            "validate",
            "--v2",
            fixtures_dir().join("v2/steel.spold").to_str().unwrap(),
        ])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
}

// ============================================================================
// Parse and Conversion Command Tests
// ============================================================================

#[test]
fn test_cli_parse_summary() {
    let output = Command::new(ecospold_bin())
        .args(["parse", fixtures_dir().join("v1/electricity.xml").to_str().unwrap()])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Generation: v1"));
    assert!(stdout.contains("dataset: 1"));
    assert!(stdout.contains("Valid: yes"));
}

#[test]
fn test_cli_to_json() {
    let output = Command::new(ecospold_bin())
        .args([
            "to-json",
            fixtures_dir().join("v1/electricity.xml").to_str().unwrap(),
        ])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["ecoSpold"]["dataset"][0]["number"], 1);
    assert_eq!(
        json["ecoSpold"]["dataset"][0]["flowData"]["exchange"][1]["CASNumber"],
        "7732-18-5"
    );
}

#[test]
fn test_cli_fill_defaults() {
    let dir = TempDir::new().unwrap();
    let output_path = dir.path().join("out").join("cement.xml");

    let output = Command::new(ecospold_bin())
        .args([
            "fill-defaults",
            fixtures_dir().join("batch/01_cement.xml").to_str().unwrap(),
            output_path.to_str().unwrap(),
        ])
        .output()
        .expect("Failed to execute command");
    assert!(!output.status.success(), "output directory must not be created");

    let output = Command::new(ecospold_bin())
        .args([
            "fill-defaults",
            fixtures_dir().join("batch/01_cement.xml").to_str().unwrap(),
            output_path.to_str().unwrap(),
            "--create-dirs",
        ])
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success());

    let text = std::fs::read_to_string(&output_path).unwrap();
    assert!(text.contains(r#"validUnits="Units.xml""#));
    assert!(text.contains(r#"uncertaintyType="1""#));
}

#[test]
fn test_cli_missing_config() {
    let output = Command::new(ecospold_bin())
        .args([
            "--config",
            "/nonexistent/ecospold.toml",
            "validate",
            fixtures_dir().join("v1/electricity.xml").to_str().unwrap(),
        ])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("config error"));
}
