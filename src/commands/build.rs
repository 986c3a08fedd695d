//! The `kfg build` command: render the build plan.
//!
//! Everything the image pipeline needs is decided here - the derived
//! image name and the fully resolved, validated option set. The
//! provisioning itself (cloning the image-builder repo, driving packer)
//! is owned by that repo and takes the plan as its input.

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::commands::Output;
use crate::options::BuildOptions;

/// The rendered plan for one image build.
#[derive(Debug, Clone, Serialize)]
pub struct BuildPlan {
    /// Derived image name, `<prefix>-<yymmdd>-<8 hex chars>`
    pub image_name: String,
    /// Repo and branch the image builder is deployed from
    pub image_repo: String,
    pub image_repo_branch: String,
    /// The resolved option set the pipeline consumes
    pub options: BuildOptions,
}

/// Derive the plan from validated build options.
pub fn build_plan(options: &BuildOptions) -> BuildPlan {
    BuildPlan {
        image_name: image_name(&options.image_prefix),
        image_repo: options.image_repo.clone(),
        image_repo_branch: options.image_repo_branch.clone(),
        options: options.clone(),
    }
}

/// Generate the image name: date-stamped with a short unique suffix,
/// e.g. `kube-260807-3fa9c1d2`.
fn image_name(prefix: &str) -> String {
    let stamp = Utc::now().format("%y%m%d");
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}-{}", prefix, stamp, &suffix[..8])
}

impl Output for BuildPlan {
    fn human(&self) -> String {
        let mut lines = vec![
            format!("Image name:      {}", self.image_name),
            format!("Target OS:       {}", self.options.build_os),
            format!(
                "Image builder:   {} ({})",
                self.image_repo, self.image_repo_branch
            ),
            format!("Kubernetes:      {}", self.options.kubernetes_version),
            format!(
                "containerd:      {} (sha256 {})",
                self.options.containerd_version,
                abbreviate(&self.options.containerd_sha256)
            ),
            format!("CNI plugins:     {}", self.options.cni_version),
            format!("crictl:          {}", self.options.crictl_version),
        ];

        if !self.options.additional_images.is_empty() {
            lines.push(format!(
                "Extra images:    {}",
                self.options.additional_images.join(", ")
            ));
        }
        if self.options.add_falco {
            lines.push("Falco:           enabled".to_string());
        }
        if self.options.add_trivy {
            lines.push("Trivy:           enabled".to_string());
        }

        if self.options.enable_gpu_support {
            lines.push(format!(
                "GPU support:     {} ({})",
                self.options.gpu_vendor,
                match self.options.gpu_vendor.as_str() {
                    "nvidia" => format!("driver {}", self.options.nvidia_driver_version),
                    "amd" => format!("driver {}", self.options.amd_driver_version),
                    _ => "unknown vendor".to_string(),
                }
            ));
        }

        lines.join("\n")
    }
}

fn abbreviate(sha: &str) -> String {
    if sha.len() > 12 {
        format!("{}...", &sha[..12])
    } else {
        sha.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FileConfig;
    use crate::options::{CliValues, OptionRegistry, ResolvedOptions, standard_groups};

    fn default_options() -> BuildOptions {
        let reg = OptionRegistry::standard().unwrap();
        let resolved = ResolvedOptions::load(
            &reg,
            &FileConfig::empty(),
            &CliValues::new(),
            &standard_groups(),
        )
        .unwrap();
        BuildOptions::from_resolved(&resolved).unwrap()
    }

    #[test]
    fn test_image_name_shape() {
        let plan = build_plan(&default_options());
        let parts: Vec<&str> = plan.image_name.splitn(3, '-').collect();
        assert_eq!(parts[0], "kube");
        assert_eq!(parts[1].len(), 6);
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[2].len(), 8);
    }

    #[test]
    fn test_image_names_are_unique() {
        let opts = default_options();
        assert_ne!(build_plan(&opts).image_name, build_plan(&opts).image_name);
    }

    #[test]
    fn test_human_output_mentions_core_components() {
        let plan = build_plan(&default_options());
        let text = plan.human();
        assert!(text.contains("ubuntu-2204"));
        assert!(text.contains("1.25.3"));
        assert!(!text.contains("GPU support"));
    }

    #[test]
    fn test_human_output_includes_gpu_when_enabled() {
        let mut opts = default_options();
        opts.enable_gpu_support = true;
        opts.gpu_vendor = "nvidia".to_string();
        let text = build_plan(&opts).human();
        assert!(text.contains("GPU support:     nvidia"));
        assert!(text.contains("525.129.03"));
    }
}
