//! Integration tests for `kfg build`.
//!
//! These drive the real binary end to end: option resolution from
//! config file and flags, dependency validation, and the rendered
//! build plan on stdout.

mod common;

use common::TestEnv;
use predicates::prelude::*;

#[test]
fn test_build_with_defaults_renders_plan() {
    let env = TestEnv::new();

    env.kfg()
        .arg("build")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"image_name\""))
        .stdout(predicate::str::contains("\"build-os\": \"ubuntu-2204\""))
        .stdout(predicate::str::contains("\"kubernetes-version\": \"1.25.3\""));
}

#[test]
fn test_build_human_output() {
    let env = TestEnv::new();

    env.kfg()
        .args(["build", "--human"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Image name:      kube-"))
        .stdout(predicate::str::contains("Target OS:       ubuntu-2204"));
}

#[test]
fn test_build_reads_config_file() {
    let env = TestEnv::new();
    env.write_config(
        r#"
        [build]
        build-os = "ubuntu-2004"
        cni-version = "1.4.0"
        crictl-version = "1.29.0"
        kubernetes-version = "1.29.2"
        "#,
    );

    env.kfg()
        .arg("build")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"build-os\": \"ubuntu-2004\""))
        .stdout(predicate::str::contains("\"kubernetes-version\": \"1.29.2\""));
}

#[test]
fn test_build_cli_flag_overrides_config_file() {
    let env = TestEnv::new();
    env.write_config("[build]\nimage-prefix = \"filepref\"\n");

    env.kfg()
        .args(["build", "--human", "--image-prefix", "clipref"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Image name:      clipref-"));
}

#[test]
fn test_build_explicit_config_flag() {
    let env = TestEnv::new();
    let other = TestEnv::new();
    let path = other.write_config("[build]\nbuild-os = \"ubuntu-2004\"\n");

    env.kfg()
        .args(["build", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("ubuntu-2004"));
}

#[test]
fn test_build_config_via_env_var() {
    let env = TestEnv::new();
    let other = TestEnv::new();
    let path = other.write_config("[build]\nbuild-os = \"ubuntu-2004\"\n");

    env.kfg()
        .env("KFG_CONFIG", &path)
        .arg("build")
        .assert()
        .success()
        .stdout(predicate::str::contains("ubuntu-2004"));
}

#[test]
fn test_build_fails_on_partial_nvidia_group() {
    let env = TestEnv::new();
    env.write_config("[gpu]\nnvidia-bucket = \"my-bucket\"\n");

    env.kfg()
        .args(["build", "--human"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("group 'nvidia'"))
        .stderr(predicate::str::contains("gpu.nvidia-tok-location"));
}

#[test]
fn test_build_fails_on_partial_group_from_flags_alone() {
    let env = TestEnv::new();

    env.kfg()
        .args(["build", "--human", "--containerd-version", "1.7.14"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("group 'containerd'"))
        .stderr(predicate::str::contains("build.containerd-sha256"));
}

#[test]
fn test_build_succeeds_when_group_fully_set() {
    let env = TestEnv::new();
    env.write_config(
        r#"
        [gpu]
        enable-gpu-support = true
        gpu-vendor = "nvidia"
        nvidia-driver-version = "535.104.05"
        nvidia-bucket = "gpu-artifacts"
        nvidia-installer-location = "installers/nvidia-grid.run"
        nvidia-tok-location = "tokens/client.tok"
        nvidia-gridd-feature-type = 4
        "#,
    );

    env.kfg()
        .args(["build", "--human"])
        .assert()
        .success()
        .stdout(predicate::str::contains("GPU support:     nvidia"));
}

#[test]
fn test_build_fails_on_type_mismatch() {
    let env = TestEnv::new();
    env.write_config("[build]\nverbose = \"yes\"\n");

    env.kfg()
        .args(["build", "--human"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("build.verbose"))
        .stderr(predicate::str::contains("expected bool"));
}

#[test]
fn test_build_json_error_output() {
    let env = TestEnv::new();
    env.write_config("[gpu]\nnvidia-bucket = \"my-bucket\"\n");

    env.kfg()
        .arg("build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("\"error\""))
        .stderr(predicate::str::contains("nvidia"));
}

#[test]
fn test_build_missing_explicit_config_fails() {
    let env = TestEnv::new();

    env.kfg()
        .args(["build", "--config", "/nonexistent/kubeforge.toml", "--human"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_build_malformed_config_fails() {
    let env = TestEnv::new();
    env.write_config("[build\nverbose = ");

    env.kfg()
        .args(["build", "--human"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse config file"));
}
