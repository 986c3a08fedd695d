//! CLI argument definitions for kubeforge.
//!
//! The command tree (`kfg build`, `kfg config show`, `kfg config check`)
//! is a regular clap derive; the per-option flags are NOT written out by
//! hand. They are generated from the option registry and attached to
//! each leaf subcommand, so the registry stays the single source of
//! truth for flag names, defaults, and help text.
//!
//! Generated flags carry no clap-side default value. A flag the user
//! did not pass is simply absent from the matches, which is how
//! [`CliValues`] ends up holding only explicitly-passed values.

use clap::parser::ValueSource as ClapValueSource;
use clap::{ArgAction, ArgMatches, CommandFactory, FromArgMatches, Parser, Subcommand};
use std::path::PathBuf;

use crate::options::{CliValues, OptionField, OptionKind, OptionRegistry};

/// Version string with build metadata from build.rs.
const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("KFG_GIT_COMMIT"),
    ", built ",
    env!("KFG_BUILD_TIMESTAMP"),
    ")"
);

/// kubeforge - build Kubernetes node images, optionally with GPU driver
/// injection.
#[derive(Parser, Debug)]
#[command(name = "kfg")]
#[command(author, version, long_version = LONG_VERSION)]
#[command(about = "A CLI tool for building Kubernetes node images", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Path to the config file. Can also be set via KFG_CONFIG.
    /// Without it, $XDG_CONFIG_HOME/kubeforge/config.toml is used when
    /// present.
    #[arg(short = 'C', long = "config", global = true, env = "KFG_CONFIG")]
    pub config_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve and validate all options, then render the build plan
    Build,

    /// Configuration inspection commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show every option with its resolved value and source layer
    Show,

    /// Run dependency validation and report per-group status
    Check,
}

/// Build the full `kfg` command with registry-generated option flags
/// attached to every leaf subcommand.
pub fn command(registry: &OptionRegistry) -> clap::Command {
    let args: Vec<clap::Arg> = registry.fields().iter().map(option_arg).collect();

    Cli::command()
        .mut_subcommand("build", |sub| sub.args(args.clone()))
        .mut_subcommand("config", |sub| {
            sub.mut_subcommand("show", |s| s.args(args.clone()))
                .mut_subcommand("check", |s| s.args(args.clone()))
        })
}

/// Parse the process arguments.
///
/// Returns the structured CLI plus the raw values of every option flag
/// the user explicitly passed. Usage errors exit the process through
/// clap, matching standard CLI behavior.
pub fn parse(registry: &OptionRegistry) -> (Cli, CliValues) {
    let matches = command(registry).get_matches();
    parse_from_matches(registry, matches)
}

fn parse_from_matches(registry: &OptionRegistry, matches: ArgMatches) -> (Cli, CliValues) {
    let cli = match Cli::from_arg_matches(&matches) {
        Ok(cli) => cli,
        Err(err) => err.exit(),
    };
    let values = leaf_matches(&matches)
        .map(|leaf| cli_values_from_matches(registry, leaf))
        .unwrap_or_default();
    (cli, values)
}

/// Generate the clap argument for one registered option.
///
/// The argument id is the fully-qualified key; the visible flag name is
/// the key's final segment.
fn option_arg(field: &OptionField) -> clap::Arg {
    let arg = clap::Arg::new(field.key.clone())
        .long(field.flag.clone())
        .help(field.help);

    match field.kind {
        // Bare `--flag` means true; `--flag=false` switches it off.
        OptionKind::Bool => arg
            .num_args(0..=1)
            .require_equals(true)
            .default_missing_value("true")
            .value_name("BOOL"),
        OptionKind::Str => arg.action(ArgAction::Set).value_name("STRING"),
        OptionKind::Int => arg.action(ArgAction::Set).value_name("INT"),
        OptionKind::List => arg.action(ArgAction::Append).value_name("ITEM"),
        OptionKind::Map => arg.action(ArgAction::Append).value_name("KEY=VALUE"),
    }
}

/// The deepest subcommand matches - where the option flags live.
fn leaf_matches(matches: &ArgMatches) -> Option<&ArgMatches> {
    match matches.subcommand() {
        Some((_, sub)) => leaf_matches(sub).or(Some(sub)),
        None => None,
    }
}

/// Collect raw values for every flag clap reports as explicitly passed
/// on the command line.
fn cli_values_from_matches(registry: &OptionRegistry, matches: &ArgMatches) -> CliValues {
    let mut values = CliValues::new();

    for field in registry.fields() {
        if matches.value_source(&field.key) != Some(ClapValueSource::CommandLine) {
            continue;
        }
        match field.kind {
            OptionKind::List | OptionKind::Map => {
                let occurrences: Vec<String> = matches
                    .get_many::<String>(&field.key)
                    .map(|vals| vals.cloned().collect())
                    .unwrap_or_default();
                values.append(&field.key, occurrences);
            }
            _ => {
                if let Some(value) = matches.get_one::<String>(&field.key) {
                    values.set(&field.key, value.clone());
                }
            }
        }
    }

    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::CliRaw;

    fn parse_args(args: &[&str]) -> (Cli, CliValues) {
        let registry = OptionRegistry::standard().unwrap();
        let matches = command(&registry)
            .try_get_matches_from(args)
            .expect("args should parse");
        let cli = Cli::from_arg_matches(&matches).unwrap();
        let values = leaf_matches(&matches)
            .map(|leaf| cli_values_from_matches(&registry, leaf))
            .unwrap_or_default();
        (cli, values)
    }

    // ==================== Command Shape Tests ====================

    #[test]
    fn test_command_is_well_formed() {
        let registry = OptionRegistry::standard().unwrap();
        command(&registry).debug_assert();
    }

    #[test]
    fn test_every_field_has_a_flag_on_build() {
        let registry = OptionRegistry::standard().unwrap();
        let cmd = command(&registry);
        let build = cmd
            .get_subcommands()
            .find(|c| c.get_name() == "build")
            .unwrap();
        for field in registry.fields() {
            assert!(
                build.get_arguments().any(|a| a.get_id().as_str() == field.key),
                "missing flag for {}",
                field.key
            );
        }
    }

    // ==================== Explicit-Flag Capture Tests ====================

    #[test]
    fn test_untouched_flags_are_not_captured() {
        let (_cli, values) = parse_args(&["kfg", "build"]);
        assert!(values.is_empty());
    }

    #[test]
    fn test_passed_flags_are_captured_by_key() {
        let (_cli, values) = parse_args(&[
            "kfg",
            "build",
            "--kubernetes-version",
            "1.29.2",
            "--verbose",
        ]);
        assert!(matches!(
            values.get("build.kubernetes-version"),
            Some(CliRaw::Single(v)) if v == "1.29.2"
        ));
        assert!(matches!(
            values.get("build.verbose"),
            Some(CliRaw::Single(v)) if v == "true"
        ));
        assert!(values.get("build.build-os").is_none());
    }

    #[test]
    fn test_bool_flag_accepts_explicit_false() {
        let (_cli, values) = parse_args(&["kfg", "build", "--verbose=false"]);
        assert!(matches!(
            values.get("build.verbose"),
            Some(CliRaw::Single(v)) if v == "false"
        ));
    }

    #[test]
    fn test_repeatable_flags_collect_occurrences() {
        let (_cli, values) = parse_args(&[
            "kfg",
            "build",
            "--additional-images",
            "a,b",
            "--additional-images",
            "c",
        ]);
        assert!(matches!(
            values.get("build.additional-images"),
            Some(CliRaw::Many(items)) if items == &["a,b".to_string(), "c".to_string()]
        ));
    }

    #[test]
    fn test_flags_work_on_config_subcommands() {
        let (cli, values) = parse_args(&["kfg", "config", "check", "--nvidia-bucket", "b"]);
        assert!(matches!(
            cli.command,
            Commands::Config { command: ConfigCommands::Check }
        ));
        assert!(matches!(
            values.get("gpu.nvidia-bucket"),
            Some(CliRaw::Single(v)) if v == "b"
        ));
    }

    #[test]
    fn test_global_flags_parse() {
        let (cli, _values) = parse_args(&["kfg", "-H", "-C", "/tmp/kfg.toml", "build"]);
        assert!(cli.human_readable);
        assert_eq!(cli.config_path, Some(PathBuf::from("/tmp/kfg.toml")));
    }
}
