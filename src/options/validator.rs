//! Required-together dependency validation.
//!
//! Some options only make sense as a unit: shipping an NVIDIA installer
//! without its license token location produces an image that cannot
//! license itself. Each such unit is a [`DependencyGroup`] with
//! ALL_OR_NONE policy: either every key in the group is set, or none is.
//!
//! A key counts as *set* when its resolved value differs from its
//! declared default. The defaults are sentinels chosen to be
//! distinguishable from real input (empty strings for bucket/location
//! options, `-1` for the gridd feature type), so "differs from default"
//! is a faithful presence test. A user explicitly passing the default
//! value is indistinguishable from leaving the flag alone; that
//! limitation is accepted here.
//!
//! Validation runs once, after all options are resolved, and never
//! mutates the snapshot. Checking the same snapshot twice yields the
//! same verdict.

use crate::Result;
use crate::options::registry::OptionRegistry;
use crate::options::resolver::ResolvedOptions;

/// A named set of options that must be configured as a unit.
#[derive(Debug, Clone)]
pub struct DependencyGroup {
    /// Group name, used in error messages
    pub name: String,
    /// Fully-qualified keys; all must be registered
    pub keys: Vec<String>,
}

impl DependencyGroup {
    /// Create a group from a name and fully-qualified keys.
    pub fn new(name: &str, keys: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            keys: keys.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Per-group presence breakdown.
///
/// Used both by [`validate`] and by `kfg config check` reporting.
#[derive(Debug, Clone, serde::Serialize)]
pub struct GroupStatus {
    /// Group name
    pub group: String,
    /// Keys whose resolved value differs from the default
    pub present: Vec<String>,
    /// Keys still at their default
    pub missing: Vec<String>,
}

impl GroupStatus {
    /// Whether the ALL_OR_NONE policy holds for this group.
    pub fn satisfied(&self) -> bool {
        self.present.is_empty() || self.missing.is_empty()
    }
}

/// Compute the presence breakdown of one group against a resolved
/// snapshot.
///
/// Fails with [`crate::Error::UnknownKey`] if the group names a key that
/// was never registered.
pub fn group_status(
    resolved: &ResolvedOptions,
    registry: &OptionRegistry,
    group: &DependencyGroup,
) -> Result<GroupStatus> {
    let mut present = Vec::new();
    let mut missing = Vec::new();

    for key in &group.keys {
        let field = registry
            .get(key)
            .ok_or_else(|| crate::Error::UnknownKey(key.clone()))?;
        let value = resolved
            .get(key)
            .ok_or_else(|| crate::Error::UnknownKey(key.clone()))?;
        if value.value != field.default {
            present.push(key.clone());
        } else {
            missing.push(key.clone());
        }
    }

    Ok(GroupStatus {
        group: group.name.clone(),
        present,
        missing,
    })
}

/// Check every group against the resolved snapshot, failing fast on the
/// first partial group.
pub fn validate(
    resolved: &ResolvedOptions,
    registry: &OptionRegistry,
    groups: &[DependencyGroup],
) -> Result<()> {
    for group in groups {
        let status = group_status(resolved, registry, group)?;
        if !status.satisfied() {
            return Err(crate::Error::DependencyViolation {
                group: status.group,
                present: status.present,
                missing: status.missing,
            });
        }
    }
    Ok(())
}

/// The standard kubeforge dependency groups.
///
/// Mirrors what the build pipeline actually requires: NVIDIA licensing
/// inputs travel together, the Kubernetes component versions travel
/// together, and a pinned containerd needs its checksum.
pub fn standard_groups() -> Vec<DependencyGroup> {
    vec![
        DependencyGroup::new(
            "nvidia",
            &[
                "gpu.nvidia-driver-version",
                "gpu.nvidia-bucket",
                "gpu.nvidia-installer-location",
                "gpu.nvidia-tok-location",
                "gpu.nvidia-gridd-feature-type",
            ],
        ),
        DependencyGroup::new(
            "kubernetes",
            &[
                "build.cni-version",
                "build.crictl-version",
                "build.kubernetes-version",
            ],
        ),
        DependencyGroup::new(
            "containerd",
            &["build.containerd-version", "build.containerd-sha256"],
        ),
    ]
}
