use std::path::PathBuf;

use clap::{Parser, Subcommand};

use lapkeeper_core::models::Category;

pub const DEFAULT_CONFIG_PATH: &str = ".config/settings.toml";

#[derive(Parser, Debug)]
#[command(name = "lapkeeper", version, about = "Curate personal-best laps from MoTeC telemetry")]
pub struct Cli {
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    pub json: bool,
    #[arg(
        long,
        global = true,
        env = "LAPKEEPER_CONFIG",
        default_value = DEFAULT_CONFIG_PATH,
        help = "Settings file (created with defaults when missing)"
    )]
    pub config: PathBuf,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Classify laps, pick personal bests and copy them into a new output set.
    Scan {
        /// Telemetry directory. Defaults to `paths.telemetry_root`.
        root: Option<PathBuf>,
        #[arg(long, help = "Report what would be copied without touching files")]
        dry_run: bool,
        #[arg(long, help = "Skip sources with unknown cars or tracks instead of asking")]
        no_prompt: bool,
    },
    /// Delete the newest output set.
    Undo {
        root: Option<PathBuf>,
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Delete telemetry files in the root directory. Output sets are never touched.
    Cleanup {
        root: Option<PathBuf>,
        #[arg(long, short = 'y')]
        yes: bool,
    },
    Bench {
        #[command(subcommand)]
        command: BenchCommands,
    },
    Car {
        #[command(subcommand)]
        command: CarCommands,
    },
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum BenchCommands {
    /// List benchmarks, optionally for one category.
    Show { category: Option<Category> },
    /// Set dry and wet times (`M:SS.mmm` or seconds).
    Set {
        category: Category,
        track: String,
        dry: String,
        wet: String,
    },
    Remove { category: Category, track: String },
    /// Set a category's tolerance, e.g. `0.07`.
    Tolerance { category: Category, value: f64 },
    /// Recommend a tolerance and list overlapping tracks.
    Advise { category: Category },
}

#[derive(Subcommand, Debug)]
pub enum CarCommands {
    Set { car: String, category: Category },
    List,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    Show,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_tree_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_scan_flags() {
        let cli = Cli::parse_from(["lapkeeper", "scan", "/data", "--dry-run", "--no-prompt"]);
        match cli.command {
            Commands::Scan {
                root,
                dry_run,
                no_prompt,
            } => {
                assert_eq!(root, Some(PathBuf::from("/data")));
                assert!(dry_run);
                assert!(no_prompt);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parses_category_arguments() {
        let cli = Cli::parse_from(["lapkeeper", "--json", "bench", "set", "GT3", "Monza", "1:47.5", "125"]);
        assert!(cli.json);
        match cli.command {
            Commands::Bench {
                command: BenchCommands::Set { category, track, .. },
            } => {
                assert_eq!(category, Category::Gt3);
                assert_eq!(track, "Monza");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_category() {
        assert!(Cli::try_parse_from(["lapkeeper", "car", "set", "x", "f1"]).is_err());
    }
}
