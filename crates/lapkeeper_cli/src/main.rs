//! `lapkeeper` command line front-end.
//!
//! Usage:
//!   lapkeeper scan [ROOT] [--dry-run] [--no-prompt]
//!   lapkeeper undo [ROOT] [--yes]
//!   lapkeeper cleanup [ROOT] [--yes]
//!   lapkeeper bench show|set|remove|tolerance|advise
//!   lapkeeper car set|list
//!   lapkeeper config show

mod cli;
mod commands;
mod prompt;

use anyhow::Context as _;
use clap::Parser;
use tracing::debug;

use lapkeeper_core::config::ConfigManager;
use lapkeeper_core::logging::{init_tracing, init_tracing_with_file};

use cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = ConfigManager::new(&cli.config);
    config
        .load_or_create()
        .with_context(|| format!("failed to load settings from {}", cli.config.display()))?;

    let logging = &config.settings().logging;
    let _guard = if logging.file_logging {
        Some(
            init_tracing_with_file(logging.level, config.logs_folder())
                .with_context(|| format!("failed to open {}", config.logs_folder().display()))?,
        )
    } else {
        init_tracing(logging.level);
        None
    };
    debug!("lapkeeper {} using {}", lapkeeper_core::version(), config.path().display());

    match &cli.command {
        Commands::Scan {
            root,
            dry_run,
            no_prompt,
        } => commands::handle_scan(&config, cli.json, root.as_deref(), *dry_run, *no_prompt),
        Commands::Undo { root, yes } => commands::handle_undo(&config, cli.json, root.as_deref(), *yes),
        Commands::Cleanup { root, yes } => {
            commands::handle_cleanup(&config, cli.json, root.as_deref(), *yes)
        }
        Commands::Bench { command } => commands::handle_bench(&config, cli.json, command),
        Commands::Car { command } => commands::handle_car(&config, cli.json, command),
        Commands::Config { command } => commands::handle_config(&config, cli.json, command),
    }
}
