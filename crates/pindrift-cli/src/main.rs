use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;

mod commands;

/// Requirement manifest drift checker.
///
/// Evaluates version constraints in a requirements manifest and verifies
/// they stay inside the advisory range each line tracks with a
/// `# <tag>.filter: >=low, <high` comment.
///
/// EXAMPLES:
///     pindrift check requirements.txt
///     pindrift check requirements.txt --candidate sphinx=1.5.5 --json
///     pindrift satisfies "sphinx>=1.3, <1.6" 1.5.5
///
/// ENVIRONMENT VARIABLES:
///     PINDRIFT_FORMAT               text or json
///     PINDRIFT_FAIL_ON_DRIFT        Set to '0' to accept drifted manifests
///     PINDRIFT_PARALLEL_THRESHOLD   Line count at which lines are checked in parallel
///     RUST_LOG                      Log filter (overrides -v)
#[derive(Parser)]
#[command(name = "pindrift")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a requirements manifest
    ///
    /// Prints one entry per requirement line and a summary. Exits with an
    /// error when the manifest needs review (drifted or malformed entries)
    /// unless the configured policy allows it.
    ///
    /// EXAMPLES:
    ///     pindrift check requirements.txt
    ///     pindrift check docs/requirements.txt -c sphinx=1.5.5
    ///     pindrift check requirements.txt --json > report.json
    #[command(visible_alias = "c")]
    Check {
        /// Path to the manifest file
        manifest: PathBuf,
        /// Candidate version to test, as name=version (repeatable)
        #[arg(long = "candidate", short = 'c', value_name = "NAME=VERSION")]
        candidates: Vec<String>,
        /// Output the report as JSON
        #[arg(long)]
        json: bool,
        /// Path to a configuration file (default: nearest pindrift.toml)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Always exit successfully, even when review is needed
        #[arg(long)]
        no_fail: bool,
    },

    /// Test one requirement line against one version
    ///
    /// EXAMPLES:
    ///     pindrift satisfies "numpy~=1.5.1" 1.5.9
    ///     pindrift satisfies "sphinx==1.5.5  # sphinx.filter: >=1.3, <1.6" 1.5.5
    Satisfies {
        /// Requirement line, optionally with an annotation comment
        requirement: String,
        /// Candidate version
        #[arg(value_name = "VERSION")]
        candidate: String,
        /// Output the evaluation as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    ///
    /// EXAMPLES:
    ///     pindrift completions bash > ~/.local/share/bash-completion/completions/pindrift
    ///     pindrift completions zsh > ~/.zfunc/_pindrift
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Check {
            manifest,
            candidates,
            json,
            config,
            no_fail,
        } => {
            let options = commands::check::CheckOptions {
                manifest,
                candidates,
                json,
                config,
                no_fail,
            };
            commands::check::run(&options)?;
        }
        Commands::Satisfies {
            requirement,
            candidate,
            json,
        } => {
            commands::satisfies::run(&requirement, &candidate, json)?;
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut io::stdout());
        }
    }

    Ok(())
}
