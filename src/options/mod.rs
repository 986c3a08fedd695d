//! Layered option resolution for kubeforge.
//!
//! Options flow through three stages, in order:
//!
//! 1. **Registry** ([`registry`]) - every option is declared once with a
//!    dotted key, kind, default, and help text. The registry drives both
//!    the CLI flag surface and the config-file key space.
//! 2. **Resolution** ([`resolver`]) - each option takes its value from
//!    the highest-precedence source that supplies one: CLI flag >
//!    config file > built-in default.
//! 3. **Validation** ([`validator`]) - required-together groups are
//!    checked against the resolved set; a partial group fails the whole
//!    step before any value reaches a consumer.
//!
//! The end product is [`BuildOptions`], the immutable typed snapshot the
//! rest of the tool reads.

pub mod build;
pub mod registry;
pub mod resolver;
pub mod validator;

pub use build::BuildOptions;
pub use registry::{
    BUILD_NAMESPACE, DEFAULT_IMAGE_REPO, GPU_NAMESPACE, OptionField, OptionKind, OptionRegistry,
    OptionValue,
};
pub use resolver::{CliRaw, CliValues, ResolvedOptions, ResolvedValue, ValueSource, resolve};
pub use validator::{DependencyGroup, GroupStatus, group_status, standard_groups, validate};
