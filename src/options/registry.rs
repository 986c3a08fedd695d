//! Option field definitions and the registry that holds them.
//!
//! Every configurable option is described once, at startup, by an
//! [`OptionField`]: a dot-namespaced key, a fixed kind, a built-in
//! default, and help text. The registry feeds both the CLI flag surface
//! (one flag per field, named by the key's final segment) and the
//! source-layer resolver, so a field registered here is automatically
//! available as `--<name>` and as `[namespace] <name>` in the config
//! file.
//!
//! The registry is an explicit value threaded through function
//! arguments; there is no process-wide mutable state.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Namespace for general image-build options.
pub const BUILD_NAMESPACE: &str = "build";

/// Namespace for GPU driver options.
pub const GPU_NAMESPACE: &str = "gpu";

/// Default image-builder repository cloned during a build.
pub const DEFAULT_IMAGE_REPO: &str = "https://github.com/kubernetes-sigs/image-builder.git";

/// The runtime type of an option, fixed at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OptionKind {
    /// Boolean toggle
    #[serde(rename = "bool")]
    Bool,
    /// Free-form string
    #[serde(rename = "string")]
    Str,
    /// Signed integer
    #[serde(rename = "int")]
    Int,
    /// Ordered list of strings
    #[serde(rename = "string-list")]
    List,
    /// String-to-string map
    #[serde(rename = "string-map")]
    Map,
}

impl OptionKind {
    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionKind::Bool => "bool",
            OptionKind::Str => "string",
            OptionKind::Int => "int",
            OptionKind::List => "string-list",
            OptionKind::Map => "string-map",
        }
    }
}

impl std::fmt::Display for OptionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A value matching one of the option kinds.
///
/// Absent lists and maps are represented as empty containers, never as a
/// null state. Maps use `BTreeMap` so serialized output is stable across
/// runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OptionValue {
    /// Boolean value
    Bool(bool),
    /// String value
    Str(String),
    /// Integer value
    Int(i64),
    /// List of strings
    List(Vec<String>),
    /// String-to-string map
    Map(BTreeMap<String, String>),
}

impl OptionValue {
    /// Convenience constructor for string values.
    pub fn str(s: &str) -> Self {
        OptionValue::Str(s.to_string())
    }

    /// An empty list value.
    pub fn empty_list() -> Self {
        OptionValue::List(Vec::new())
    }

    /// An empty map value.
    pub fn empty_map() -> Self {
        OptionValue::Map(BTreeMap::new())
    }

    /// The kind this value belongs to.
    pub fn kind(&self) -> OptionKind {
        match self {
            OptionValue::Bool(_) => OptionKind::Bool,
            OptionValue::Str(_) => OptionKind::Str,
            OptionValue::Int(_) => OptionKind::Int,
            OptionValue::List(_) => OptionKind::List,
            OptionValue::Map(_) => OptionKind::Map,
        }
    }

    /// Get the boolean value, if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the string value, if this is a `Str`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get the integer value, if this is an `Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            OptionValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get the list value, if this is a `List`.
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            OptionValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Get the map value, if this is a `Map`.
    pub fn as_map(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            OptionValue::Map(entries) => Some(entries),
            _ => None,
        }
    }
}

impl std::fmt::Display for OptionValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptionValue::Bool(b) => write!(f, "{}", b),
            OptionValue::Str(s) => write!(f, "{}", s),
            OptionValue::Int(i) => write!(f, "{}", i),
            OptionValue::List(items) => write!(f, "[{}]", items.join(", ")),
            OptionValue::Map(entries) => {
                let pairs: Vec<String> =
                    entries.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
                write!(f, "{{{}}}", pairs.join(", "))
            }
        }
    }
}

/// A single configurable option.
#[derive(Debug, Clone, Serialize)]
pub struct OptionField {
    /// Fully-qualified dotted key, e.g. `build.verbose`
    pub key: String,
    /// Final key segment, used as the CLI flag name
    pub flag: String,
    /// Kind, fixed at registration
    pub kind: OptionKind,
    /// Built-in default, lowest-precedence source layer
    pub default: OptionValue,
    /// Help text shown on the CLI flag
    pub help: &'static str,
}

/// The set of known options, in registration order.
///
/// Construct once at startup (usually via [`OptionRegistry::standard`])
/// and pass by reference into flag registration, resolution, and
/// validation.
#[derive(Debug, Clone, Default)]
pub struct OptionRegistry {
    fields: Vec<OptionField>,
    by_key: HashMap<String, usize>,
}

impl OptionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new option under `namespace`.
    ///
    /// Fails with [`crate::Error::DuplicateKey`] if the fully-qualified
    /// key, or the bare flag name, is already taken. Also rejects a
    /// default whose runtime type does not match `kind` - both checks
    /// happen here, at registration time, not at resolution time.
    pub fn register(
        &mut self,
        namespace: &str,
        name: &str,
        kind: OptionKind,
        default: OptionValue,
        help: &'static str,
    ) -> crate::Result<&OptionField> {
        let key = format!("{}.{}", namespace, name);
        if self.by_key.contains_key(&key) {
            return Err(crate::Error::DuplicateKey(key));
        }
        // Flags drop the namespace, so the bare name must be unique too.
        if self.fields.iter().any(|f| f.flag == name) {
            return Err(crate::Error::DuplicateKey(name.to_string()));
        }
        if default.kind() != kind {
            return Err(crate::Error::TypeMismatch {
                key,
                expected: kind,
            });
        }
        let field = OptionField {
            key: key.clone(),
            flag: name.to_string(),
            kind,
            default,
            help,
        };
        self.by_key.insert(key, self.fields.len());
        self.fields.push(field);
        Ok(self.fields.last().unwrap())
    }

    /// Look up a field by fully-qualified key.
    pub fn get(&self, key: &str) -> Option<&OptionField> {
        self.by_key.get(key).map(|&i| &self.fields[i])
    }

    /// All fields, in registration order.
    pub fn fields(&self) -> &[OptionField] {
        &self.fields
    }

    /// Number of registered fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Build the standard kubeforge registry: every build and GPU option
    /// with its built-in default and help text.
    pub fn standard() -> crate::Result<Self> {
        use OptionKind::{Bool, Int, List, Map, Str};

        let mut reg = Self::new();

        // Build options
        reg.register(BUILD_NAMESPACE, "verbose", Bool, OptionValue::Bool(false),
            "--DEPRECATED-- Enable verbose output to see the information from packer. Not turning this on will mean the process appears to hang while the image build happens")?;
        reg.register(BUILD_NAMESPACE, "build-os", Str, OptionValue::str("ubuntu-2204"),
            "--DEPRECATED-- USE THE CONFIG FILE. This is the target os to build. Valid values are currently: ubuntu-2004 and ubuntu-2204")?;
        reg.register(BUILD_NAMESPACE, "image-prefix", Str, OptionValue::str("kube"),
            "--DEPRECATED-- USE THE CONFIG FILE. This will prefix the image with the value provided. Defaults to 'kube' producing an image name of kube-yymmdd-xxxxxxxx")?;
        reg.register(BUILD_NAMESPACE, "image-repo", Str, OptionValue::str(DEFAULT_IMAGE_REPO),
            "--DEPRECATED-- USE THE CONFIG FILE. The repo from which the image builder should be deployed")?;
        reg.register(BUILD_NAMESPACE, "image-repo-branch", Str, OptionValue::str("main"),
            "--DEPRECATED-- USE THE CONFIG FILE. The branch to checkout from the cloned image repo")?;
        reg.register(BUILD_NAMESPACE, "containerd-version", Str, OptionValue::str("1.7.13"),
            "--DEPRECATED-- USE THE CONFIG FILE. The containerd version to include in the image")?;
        reg.register(BUILD_NAMESPACE, "containerd-sha256", Str,
            OptionValue::str("9be621c0206b5c20a1dea05fae12fc698e5083cc81f65c9d918c644090696d19"),
            "--DEPRECATED-- USE THE CONFIG FILE. The sha256 of containerd - required when setting containerd-version")?;
        reg.register(BUILD_NAMESPACE, "crictl-version", Str, OptionValue::str("1.25.0"),
            "--DEPRECATED-- USE THE CONFIG FILE. The crictl-tools version to add to the built image")?;
        reg.register(BUILD_NAMESPACE, "cni-version", Str, OptionValue::str("1.2.0"),
            "--DEPRECATED-- USE THE CONFIG FILE. The CNI plugins version to include in the built image")?;
        reg.register(BUILD_NAMESPACE, "cni-deb-version", Str, OptionValue::str(""),
            "--DEPRECATED-- USE THE CONFIG FILE. The CNI plugins deb package version")?;
        reg.register(BUILD_NAMESPACE, "kubernetes-version", Str, OptionValue::str("1.25.3"),
            "--DEPRECATED-- USE THE CONFIG FILE. The Kubernetes version to add to the built image")?;
        reg.register(BUILD_NAMESPACE, "kubernetes-deb-version", Str, OptionValue::str(""),
            "--DEPRECATED-- USE THE CONFIG FILE. The Kubernetes deb package version")?;
        reg.register(BUILD_NAMESPACE, "kubernetes-rpm-version", Str, OptionValue::str(""),
            "--DEPRECATED-- USE THE CONFIG FILE. The Kubernetes rpm package version")?;
        reg.register(BUILD_NAMESPACE, "extra-debs", Str, OptionValue::str(""),
            "--DEPRECATED-- USE THE CONFIG FILE. A space-separated list of any extra (Debian / Ubuntu) packages that should be installed")?;
        reg.register(BUILD_NAMESPACE, "additional-images", List, OptionValue::empty_list(),
            "--DEPRECATED-- USE THE CONFIG FILE. Add any additional container images which should be baked into the image")?;
        reg.register(BUILD_NAMESPACE, "additional-metadata", Map, OptionValue::empty_map(),
            "--DEPRECATED-- USE THE CONFIG FILE. Add any additional metadata to tag the image with")?;
        reg.register(BUILD_NAMESPACE, "add-falco", Bool, OptionValue::Bool(false),
            "--DEPRECATED-- USE THE CONFIG FILE. If enabled, will install Falco onto the image")?;
        reg.register(BUILD_NAMESPACE, "add-trivy", Bool, OptionValue::Bool(false),
            "--DEPRECATED-- USE THE CONFIG FILE. If enabled, will install Trivy onto the image")?;

        // GPU options
        reg.register(GPU_NAMESPACE, "enable-gpu-support", Bool, OptionValue::Bool(false),
            "--DEPRECATED-- USE THE CONFIG FILE. This will configure GPU support in the image")?;
        reg.register(GPU_NAMESPACE, "gpu-vendor", Str, OptionValue::str(""),
            "--DEPRECATED-- USE THE CONFIG FILE. The architecture of the GPU (currently supported: nvidia, amd)")?;
        reg.register(GPU_NAMESPACE, "gpu-model-support", Str, OptionValue::str(""),
            "--DEPRECATED-- USE THE CONFIG FILE. The supported GPU models")?;
        reg.register(GPU_NAMESPACE, "gpu-instance-support", Str, OptionValue::str(""),
            "--DEPRECATED-- USE THE CONFIG FILE. The supported GPU instance types")?;
        reg.register(GPU_NAMESPACE, "amd-driver-version", Str, OptionValue::str("6.0.2"),
            "--DEPRECATED-- USE THE CONFIG FILE. The AMD driver version")?;
        reg.register(GPU_NAMESPACE, "amd-deb-version", Str, OptionValue::str("6.0.60002-1"),
            "--DEPRECATED-- USE THE CONFIG FILE. The AMD deb version")?;
        reg.register(GPU_NAMESPACE, "amd-usecase", Str, OptionValue::str("dkms"),
            "--DEPRECATED-- USE THE CONFIG FILE. A comma-delimited string of usecases for the AMDGPU installer")?;
        reg.register(GPU_NAMESPACE, "nvidia-driver-version", Str, OptionValue::str("525.129.03"),
            "--DEPRECATED-- USE THE CONFIG FILE. The NVIDIA driver version")?;
        reg.register(GPU_NAMESPACE, "nvidia-bucket", Str, OptionValue::str(""),
            "--DEPRECATED-- USE THE CONFIG FILE. The bucket name in which the NVIDIA components are stored")?;
        reg.register(GPU_NAMESPACE, "nvidia-installer-location", Str, OptionValue::str(""),
            "--DEPRECATED-- USE THE CONFIG FILE. The NVIDIA installer location in the bucket - this must be acquired from NVIDIA and uploaded to your bucket")?;
        reg.register(GPU_NAMESPACE, "nvidia-tok-location", Str, OptionValue::str(""),
            "--DEPRECATED-- USE THE CONFIG FILE. The NVIDIA .tok file location in the bucket - this must be acquired from NVIDIA and uploaded to your bucket")?;
        reg.register(GPU_NAMESPACE, "nvidia-gridd-feature-type", Int, OptionValue::Int(-1),
            "--DEPRECATED-- USE THE CONFIG FILE. The gridd feature type - See the NVIDIA license system documentation for more information")?;

        Ok(reg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Registration Tests ====================

    #[test]
    fn test_register_builds_dotted_key() {
        let mut reg = OptionRegistry::new();
        let field = reg
            .register(BUILD_NAMESPACE, "verbose", OptionKind::Bool, OptionValue::Bool(false), "help")
            .unwrap();
        assert_eq!(field.key, "build.verbose");
        assert_eq!(field.flag, "verbose");
        assert_eq!(field.kind, OptionKind::Bool);
    }

    #[test]
    fn test_register_duplicate_key_fails() {
        let mut reg = OptionRegistry::new();
        reg.register(GPU_NAMESPACE, "gpu-vendor", OptionKind::Str, OptionValue::str(""), "help")
            .unwrap();
        let err = reg
            .register(GPU_NAMESPACE, "gpu-vendor", OptionKind::Str, OptionValue::str(""), "help")
            .unwrap_err();
        assert!(matches!(err, crate::Error::DuplicateKey(key) if key == "gpu.gpu-vendor"));
    }

    #[test]
    fn test_register_duplicate_flag_across_namespaces_fails() {
        let mut reg = OptionRegistry::new();
        reg.register(BUILD_NAMESPACE, "verbose", OptionKind::Bool, OptionValue::Bool(false), "help")
            .unwrap();
        let err = reg
            .register(GPU_NAMESPACE, "verbose", OptionKind::Bool, OptionValue::Bool(false), "help")
            .unwrap_err();
        assert!(matches!(err, crate::Error::DuplicateKey(_)));
    }

    #[test]
    fn test_register_default_must_match_kind() {
        let mut reg = OptionRegistry::new();
        let err = reg
            .register(BUILD_NAMESPACE, "verbose", OptionKind::Bool, OptionValue::Int(1), "help")
            .unwrap_err();
        assert!(matches!(
            err,
            crate::Error::TypeMismatch { key, expected: OptionKind::Bool } if key == "build.verbose"
        ));
    }

    #[test]
    fn test_fields_keep_registration_order() {
        let mut reg = OptionRegistry::new();
        reg.register(BUILD_NAMESPACE, "one", OptionKind::Str, OptionValue::str("1"), "help")
            .unwrap();
        reg.register(BUILD_NAMESPACE, "two", OptionKind::Str, OptionValue::str("2"), "help")
            .unwrap();
        reg.register(GPU_NAMESPACE, "three", OptionKind::Str, OptionValue::str("3"), "help")
            .unwrap();
        let keys: Vec<&str> = reg.fields().iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, vec!["build.one", "build.two", "gpu.three"]);
    }

    // ==================== Standard Registry Tests ====================

    #[test]
    fn test_standard_registry_registers_all_options() {
        let reg = OptionRegistry::standard().unwrap();
        assert_eq!(reg.len(), 30);
        assert!(reg.get("build.verbose").is_some());
        assert!(reg.get("build.additional-metadata").is_some());
        assert!(reg.get("gpu.nvidia-gridd-feature-type").is_some());
        assert!(reg.get("nonexistent.key").is_none());
    }

    #[test]
    fn test_standard_registry_sentinel_defaults() {
        let reg = OptionRegistry::standard().unwrap();
        let gridd = reg.get("gpu.nvidia-gridd-feature-type").unwrap();
        assert_eq!(gridd.default, OptionValue::Int(-1));
        let bucket = reg.get("gpu.nvidia-bucket").unwrap();
        assert_eq!(bucket.default, OptionValue::str(""));
        let images = reg.get("build.additional-images").unwrap();
        assert_eq!(images.default, OptionValue::empty_list());
    }

    // ==================== OptionValue Tests ====================

    #[test]
    fn test_option_value_kind() {
        assert_eq!(OptionValue::Bool(true).kind(), OptionKind::Bool);
        assert_eq!(OptionValue::str("x").kind(), OptionKind::Str);
        assert_eq!(OptionValue::Int(7).kind(), OptionKind::Int);
        assert_eq!(OptionValue::empty_list().kind(), OptionKind::List);
        assert_eq!(OptionValue::empty_map().kind(), OptionKind::Map);
    }

    #[test]
    fn test_option_value_display() {
        assert_eq!(OptionValue::Bool(true).to_string(), "true");
        assert_eq!(
            OptionValue::List(vec!["a".into(), "b".into()]).to_string(),
            "[a, b]"
        );
        let mut map = BTreeMap::new();
        map.insert("k".to_string(), "v".to_string());
        assert_eq!(OptionValue::Map(map).to_string(), "{k=v}");
    }
}
