//! `specwiz config` against broken and valid configuration files.

use std::path::Path;
use std::process::{Command, Output};

fn specwiz(args: &[&str], config: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_specwiz"))
        .arg("--config")
        .arg(config)
        .args(args)
        .output()
        .unwrap()
}

fn write_configs(dir: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
    let broken = dir.join("broken.toml");
    std::fs::write(&broken, "[dataset]\nretry_delay_ms = \"soon\"\n").unwrap();
    let valid = dir.join("valid.toml");
    std::fs::write(&valid, "[display]\ncurrency = \" NOK\"\n").unwrap();
    (broken, valid)
}

#[test]
fn validate_reports_broken_config() {
    let dir = tempfile::tempdir().unwrap();
    let (broken, _) = write_configs(dir.path());

    let output = specwiz(&["config", "validate"], &broken);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stdout.contains("Validating configuration"), "stdout: {stdout}");
    assert!(stdout.contains("broken.toml"), "stdout: {stdout}");
    assert!(stderr.contains("Configuration error"), "stderr: {stderr}");
}

#[test]
fn validate_file_ignores_broken_global_config() {
    let dir = tempfile::tempdir().unwrap();
    let (broken, valid) = write_configs(dir.path());

    let output = specwiz(&["config", "validate", valid.to_str().unwrap()], &broken);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("Configuration is valid."), "stdout: {stdout}");
}

#[test]
fn path_prints_given_config() {
    let dir = tempfile::tempdir().unwrap();
    let (broken, _) = write_configs(dir.path());

    let output = specwiz(&["config", "path"], &broken);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), broken.to_str().unwrap());
}

#[test]
fn other_commands_still_require_valid_config() {
    let dir = tempfile::tempdir().unwrap();
    let (broken, _) = write_configs(dir.path());

    let output = specwiz(&["stats"], &broken);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("loading configuration"));
}
