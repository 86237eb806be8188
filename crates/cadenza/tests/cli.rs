// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Binary-level tests for configuration handling.
//!
//! None of these reach the network: they exercise config loading and the
//! checks `serve` performs before connecting.

use std::path::Path;
use std::process::{Command, Output};

fn cadenza(args: &[&str], config: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cadenza"))
        .args(args)
        .arg("--config")
        .arg(config)
        .env("RUST_LOG", "off")
        .output()
        .unwrap()
}

fn write_config(dir: &tempfile::TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("cadenza.toml");
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn check_config_accepts_valid_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        r#"
[bot]
command_prefix = "?"

[channels]
allowlist_path = "channels.json"
"#,
    );

    let output = cadenza(&["check-config"], &path);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("prefix=?"), "stdout: {stdout}");
    assert!(stdout.contains("allowlist=channels.json"), "stdout: {stdout}");
}

#[test]
fn check_config_rejects_unknown_key() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        r#"
[playback]
pol_interval_ms = 250
"#,
    );

    let output = cadenza(&["check-config"], &path);
    assert!(!output.status.success());
}

#[test]
fn check_config_rejects_out_of_range_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        r#"
[playback]
volume = 3.0
"#,
    );

    let output = cadenza(&["check-config"], &path);
    assert!(!output.status.success());
}

#[test]
fn serve_without_token_fails_before_connecting() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "[bot]\nname = \"cadenza\"\n");

    let output = cadenza(&["serve"], &path);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("discord.token"), "stderr: {stderr}");
}
