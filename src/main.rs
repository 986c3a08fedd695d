//! Kubeforge CLI - build Kubernetes node images with optional GPU
//! driver injection.

use std::process;

use kubeforge::cli::{self, Cli, Commands, ConfigCommands};
use kubeforge::commands;
use kubeforge::config::FileConfig;
use kubeforge::options::{
    BuildOptions, CliValues, OptionRegistry, ResolvedOptions, resolve, standard_groups,
};

fn main() {
    // Registry construction only fails on a duplicate or mistyped
    // registration - a programming error, but still reported through
    // the normal exit path.
    let registry = match OptionRegistry::standard() {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let (cli, cli_values) = cli::parse(&registry);
    let human = cli.human_readable;

    if let Err(e) = run_command(&registry, &cli, &cli_values) {
        if human {
            eprintln!("Error: {}", e);
        } else {
            eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
        }
        process::exit(1);
    }
}

fn run_command(
    registry: &OptionRegistry,
    cli: &Cli,
    cli_values: &CliValues,
) -> kubeforge::Result<()> {
    let human = cli.human_readable;
    let file = FileConfig::discover(cli.config_path.as_deref())?;
    let groups = standard_groups();

    match &cli.command {
        Commands::Build => {
            let resolved = ResolvedOptions::load(registry, &file, cli_values, &groups)?;
            let options = BuildOptions::from_resolved(&resolved)?;
            let plan = commands::build_plan(&options);
            commands::emit(&plan, human)
        }
        Commands::Config { command } => match command {
            ConfigCommands::Show => {
                // Pre-validation dump: a broken config must still be
                // inspectable.
                let resolved = resolve(registry, &file, cli_values)?;
                let report = commands::show_report(&resolved, file.path());
                commands::emit(&report, human)
            }
            ConfigCommands::Check => {
                let resolved = resolve(registry, &file, cli_values)?;
                let report = commands::check_report(&resolved, registry, &groups)?;
                commands::emit(&report, human)
            }
        },
    }
}
