//! Kubeforge - a Kubernetes node-image build tool.
//!
//! This library provides the core functionality for the `kfg` CLI tool:
//! layered option resolution (defaults, config file, CLI flags),
//! required-together dependency validation, and the resolved build
//! options handed to the image pipeline.

pub mod cli;
pub mod commands;
pub mod config;
pub mod options;

use crate::options::OptionKind;

/// Library-level error type for kubeforge operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("duplicate option key: {0}")]
    DuplicateKey(String),

    #[error("invalid value for '{key}': expected {expected}")]
    TypeMismatch {
        /// Fully-qualified key of the offending option
        key: String,
        /// The kind declared at registration time
        expected: OptionKind,
    },

    #[error(
        "options in group '{group}' must be set together: present [{}], missing [{}]",
        present.join(", "),
        missing.join(", ")
    )]
    DependencyViolation {
        /// Name of the violated dependency group
        group: String,
        /// Keys whose resolved value differs from the default
        present: Vec<String>,
        /// Keys still at their default
        missing: Vec<String>,
    },

    #[error("unknown option key: {0}")]
    UnknownKey(String),
}

/// Result type alias for kubeforge operations.
pub type Result<T> = std::result::Result<T, Error>;
