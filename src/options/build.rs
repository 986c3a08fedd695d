//! The typed build-options snapshot handed to the image pipeline.
//!
//! [`BuildOptions`] is a plain struct with one typed field per
//! registered option. It is constructed only from a snapshot that
//! already passed resolution and validation, and downstream code treats
//! it as immutable for the remainder of the process.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::Result;
use crate::options::resolver::ResolvedOptions;

/// Fully resolved, validated build options.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BuildOptions {
    pub verbose: bool,
    pub build_os: String,
    pub image_prefix: String,
    pub image_repo: String,
    pub image_repo_branch: String,
    pub containerd_version: String,
    pub containerd_sha256: String,
    pub crictl_version: String,
    pub cni_version: String,
    pub cni_deb_version: String,
    pub kubernetes_version: String,
    pub kubernetes_deb_version: String,
    pub kubernetes_rpm_version: String,
    pub extra_debs: String,
    pub additional_images: Vec<String>,
    pub additional_metadata: BTreeMap<String, String>,
    pub add_falco: bool,
    pub add_trivy: bool,
    pub enable_gpu_support: bool,
    pub gpu_vendor: String,
    pub gpu_model_support: String,
    pub gpu_instance_support: String,
    pub amd_driver_version: String,
    pub amd_deb_version: String,
    pub amd_usecase: String,
    pub nvidia_driver_version: String,
    pub nvidia_bucket: String,
    pub nvidia_installer_location: String,
    pub nvidia_tok_location: String,
    pub nvidia_gridd_feature_type: i64,
}

impl BuildOptions {
    /// Build the typed snapshot from resolved values.
    ///
    /// Expects a snapshot produced by [`ResolvedOptions::load`]; every
    /// accessor hit here is a key the standard registry declares.
    pub fn from_resolved(resolved: &ResolvedOptions) -> Result<Self> {
        Ok(Self {
            verbose: resolved.bool_value("build.verbose")?,
            build_os: resolved.str_value("build.build-os")?.to_string(),
            image_prefix: resolved.str_value("build.image-prefix")?.to_string(),
            image_repo: resolved.str_value("build.image-repo")?.to_string(),
            image_repo_branch: resolved.str_value("build.image-repo-branch")?.to_string(),
            containerd_version: resolved.str_value("build.containerd-version")?.to_string(),
            containerd_sha256: resolved.str_value("build.containerd-sha256")?.to_string(),
            crictl_version: resolved.str_value("build.crictl-version")?.to_string(),
            cni_version: resolved.str_value("build.cni-version")?.to_string(),
            cni_deb_version: resolved.str_value("build.cni-deb-version")?.to_string(),
            kubernetes_version: resolved.str_value("build.kubernetes-version")?.to_string(),
            kubernetes_deb_version: resolved
                .str_value("build.kubernetes-deb-version")?
                .to_string(),
            kubernetes_rpm_version: resolved
                .str_value("build.kubernetes-rpm-version")?
                .to_string(),
            extra_debs: resolved.str_value("build.extra-debs")?.to_string(),
            additional_images: resolved.list_value("build.additional-images")?.to_vec(),
            additional_metadata: resolved.map_value("build.additional-metadata")?.clone(),
            add_falco: resolved.bool_value("build.add-falco")?,
            add_trivy: resolved.bool_value("build.add-trivy")?,
            enable_gpu_support: resolved.bool_value("gpu.enable-gpu-support")?,
            gpu_vendor: resolved.str_value("gpu.gpu-vendor")?.to_string(),
            gpu_model_support: resolved.str_value("gpu.gpu-model-support")?.to_string(),
            gpu_instance_support: resolved.str_value("gpu.gpu-instance-support")?.to_string(),
            amd_driver_version: resolved.str_value("gpu.amd-driver-version")?.to_string(),
            amd_deb_version: resolved.str_value("gpu.amd-deb-version")?.to_string(),
            amd_usecase: resolved.str_value("gpu.amd-usecase")?.to_string(),
            nvidia_driver_version: resolved
                .str_value("gpu.nvidia-driver-version")?
                .to_string(),
            nvidia_bucket: resolved.str_value("gpu.nvidia-bucket")?.to_string(),
            nvidia_installer_location: resolved
                .str_value("gpu.nvidia-installer-location")?
                .to_string(),
            nvidia_tok_location: resolved.str_value("gpu.nvidia-tok-location")?.to_string(),
            nvidia_gridd_feature_type: resolved.int_value("gpu.nvidia-gridd-feature-type")?,
        })
    }
}
