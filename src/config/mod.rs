//! Config file loading for kubeforge.
//!
//! The config file is TOML, with one table per option namespace
//! mirroring the dotted key space:
//!
//! ```toml
//! [build]
//! verbose = true
//! kubernetes-version = "1.29.2"
//!
//! [gpu]
//! nvidia-bucket = "gpu-artifacts"
//! ```
//!
//! Location precedence: `-C/--config` flag > `KFG_CONFIG` env var
//! (handled by the CLI layer) > `$XDG_CONFIG_HOME/kubeforge/config.toml`
//! when it exists > no file at all. `KFG_CONFIG_DIR` overrides the XDG
//! directory, which keeps tests off the user's real config.

use std::path::{Path, PathBuf};

use crate::Result;

/// File name looked up inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Environment variable overriding the config directory.
pub const KFG_CONFIG_DIR_ENV: &str = "KFG_CONFIG_DIR";

/// A loaded (or empty) hierarchical config source.
#[derive(Debug, Clone, Default)]
pub struct FileConfig {
    root: toml::Table,
    path: Option<PathBuf>,
}

impl FileConfig {
    /// A config source with no values; every lookup misses.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a config from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let root = content.parse::<toml::Table>()?;
        Ok(Self { root, path: None })
    }

    /// Load a config file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml(&content)?;
        config.path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Locate and load the config file.
    ///
    /// An explicit path must exist; without one, the default location is
    /// used when present and an empty config otherwise.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        if let Some(dir) = default_config_dir() {
            let path = dir.join(CONFIG_FILE_NAME);
            if path.exists() {
                return Self::load(&path);
            }
        }
        Ok(Self::empty())
    }

    /// Look up a value by dotted key, walking nested tables.
    pub fn lookup(&self, key: &str) -> Option<&toml::Value> {
        let mut segments = key.split('.');
        let mut current = self.root.get(segments.next()?)?;
        for segment in segments {
            current = current.as_table()?.get(segment)?;
        }
        Some(current)
    }

    /// The path this config was loaded from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// The directory searched for `config.toml` when no explicit path is
/// given: `KFG_CONFIG_DIR` if set, otherwise the XDG config directory.
pub fn default_config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(KFG_CONFIG_DIR_ENV) {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|dir| dir.join("kubeforge"))
}
