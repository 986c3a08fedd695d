//! The `kfg config` commands: inspect resolution and validation.
//!
//! `config show` dumps the merged option set with per-value provenance
//! *before* validation, so a broken configuration can still be
//! inspected. `config check` runs the dependency validator and reports
//! every group's status; a violation surfaces as the usual fatal error.

use serde::Serialize;
use std::path::Path;

use crate::Result;
use crate::commands::Output;
use crate::options::{
    DependencyGroup, GroupStatus, OptionRegistry, ResolvedOptions, ResolvedValue, group_status,
    validate,
};

/// Resolved option dump with provenance.
#[derive(Debug, Clone, Serialize)]
pub struct ShowReport {
    /// Path of the loaded config file, if one was found
    pub config_file: Option<String>,
    /// Every option in registration order
    pub options: Vec<ResolvedValue>,
}

/// Build the `config show` report.
pub fn show_report(resolved: &ResolvedOptions, config_path: Option<&Path>) -> ShowReport {
    ShowReport {
        config_file: config_path.map(|p| p.display().to_string()),
        options: resolved.values().to_vec(),
    }
}

impl Output for ShowReport {
    fn human(&self) -> String {
        let mut lines = Vec::with_capacity(self.options.len() + 1);
        match &self.config_file {
            Some(path) => lines.push(format!("Config file: {}", path)),
            None => lines.push("Config file: (none)".to_string()),
        }

        let width = self
            .options
            .iter()
            .map(|o| o.key.len())
            .max()
            .unwrap_or(0);
        for option in &self.options {
            lines.push(format!(
                "{:width$} = {} ({})",
                option.key,
                option.value,
                option.source,
                width = width
            ));
        }
        lines.join("\n")
    }
}

/// Validation verdict for every dependency group.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    /// True when every group satisfies ALL_OR_NONE
    pub ok: bool,
    /// Per-group presence breakdown
    pub groups: Vec<GroupStatus>,
}

/// Build the `config check` report.
///
/// Fails with the validator's error on the first violated group, after
/// running `validate` the same way `build` does.
pub fn check_report(
    resolved: &ResolvedOptions,
    registry: &OptionRegistry,
    groups: &[DependencyGroup],
) -> Result<CheckReport> {
    validate(resolved, registry, groups)?;

    let mut statuses = Vec::with_capacity(groups.len());
    for group in groups {
        statuses.push(group_status(resolved, registry, group)?);
    }
    Ok(CheckReport {
        ok: true,
        groups: statuses,
    })
}

impl Output for CheckReport {
    fn human(&self) -> String {
        let mut lines = vec![format!(
            "Configuration {}",
            if self.ok { "OK" } else { "INVALID" }
        )];
        for status in &self.groups {
            let state = if status.present.is_empty() {
                "not configured".to_string()
            } else {
                format!("fully configured ({} options)", status.present.len())
            };
            lines.push(format!("  group {}: {}", status.group, state));
        }
        lines.join("\n")
    }
}
