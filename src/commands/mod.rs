//! Command implementations for the `kfg` CLI.
//!
//! Each command returns a serializable result; `main` renders it as
//! pretty JSON by default or as plain text with `-H/--human`.

pub mod build;
pub mod config;

pub use build::{BuildPlan, build_plan};
pub use config::{CheckReport, ShowReport, check_report, show_report};

use serde::Serialize;

/// A command result that can render itself for humans.
pub trait Output: Serialize {
    /// Plain-text rendering used with `-H/--human`.
    fn human(&self) -> String;
}

/// Print a command result to stdout in the selected format.
pub fn emit<T: Output>(result: &T, human: bool) -> crate::Result<()> {
    if human {
        println!("{}", result.human());
    } else {
        println!("{}", serde_json::to_string_pretty(result)?);
    }
    Ok(())
}
