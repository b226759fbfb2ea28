//! Shared helpers for the integration tests
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

/// Path to the test fixtures directory
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

pub fn fixture_path(name: &str) -> PathBuf {
    fixtures_dir().join(name)
}

pub fn valid_config_fixture() -> PathBuf {
    fixture_path("valid_config.toml")
}

pub fn invalid_config_fixture() -> PathBuf {
    fixture_path("invalid_config.toml")
}

/// Binary command isolated from the developer's own configuration:
/// home and config dirs point into `sandbox`, which is also the working
/// directory, and `CHORUS_*` / provider key variables are cleared.
pub fn router_cmd(sandbox: &Path) -> Command {
    let mut cmd = Command::cargo_bin("chorus-router").unwrap();
    cmd.current_dir(sandbox)
        .env("HOME", sandbox)
        .env("XDG_CONFIG_HOME", sandbox.join(".config"))
        .env_remove("RUST_LOG")
        .env_remove("GEMINI_API_KEY")
        .env_remove("OPENAI_API_KEY");
    for (key, _) in std::env::vars() {
        if key.starts_with("CHORUS_") {
            cmd.env_remove(key);
        }
    }
    cmd
}

/// Fresh sandbox directory
pub fn sandbox() -> TempDir {
    TempDir::new().unwrap()
}
