//! Common test utilities for kubeforge integration tests.
//!
//! Provides `TestEnv` for isolated test environments that don't read
//! the user's `~/.config/kubeforge/config.toml`.

#![allow(dead_code)]

use assert_cmd::Command;
use std::path::PathBuf;
pub use tempfile::TempDir;

/// A test environment with an isolated config directory.
///
/// The `kfg()` method returns a `Command` that sets `KFG_CONFIG_DIR`
/// per-invocation, making tests parallel-safe.
pub struct TestEnv {
    pub config_dir: TempDir,
}

impl TestEnv {
    /// Create a new test environment with an isolated config directory.
    pub fn new() -> Self {
        Self {
            config_dir: TempDir::new().unwrap(),
        }
    }

    /// Get a Command for the kfg binary with isolated config directory.
    pub fn kfg(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_kfg"));
        cmd.env("KFG_CONFIG_DIR", self.config_dir.path());
        cmd.env_remove("KFG_CONFIG");
        cmd
    }

    /// Write `config.toml` into the isolated config directory.
    pub fn write_config(&self, content: &str) -> PathBuf {
        let path = self.config_path();
        std::fs::write(&path, content).unwrap();
        path
    }

    /// Path of the (possibly not yet written) config file.
    pub fn config_path(&self) -> PathBuf {
        self.config_dir.path().join("config.toml")
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
