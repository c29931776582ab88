use clap::Parser;
use diffwatch::Settings;
use diffwatch::cli::commands::{init, testgen, watch};
use diffwatch::cli::{Cli, Commands};
use diffwatch::logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // For non-init commands, warn when the workspace was never initialized
    if cli.config.is_none() && !matches!(cli.command, Commands::Init { .. }) {
        if let Err(warning) = Settings::check_init() {
            eprintln!("Warning: {warning}");
            eprintln!("Using default configuration for now.");
        }
    }

    let config = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}");
        Settings::default()
    });

    logging::init_with_config(&config.logging);

    match cli.command {
        Commands::Init { force } => init::run_init(force),

        Commands::Config => init::run_config(&config),

        Commands::Watch {
            workspace,
            project,
            login,
        } => {
            watch::run(
                watch::WatchArgs {
                    workspace,
                    project,
                    login,
                },
                config,
            )
            .await;
        }

        Commands::Testgen {
            diff,
            project_root,
            skip_validate,
        } => {
            testgen::run(
                testgen::TestgenArgs {
                    diff,
                    project_root,
                    skip_validate,
                },
                config,
            )
            .await;
        }
    }
}
