//! Starsweep CLI - export your GitHub stars to CSV and unstar the rows you
//! flag.

mod commands;
mod config;
mod progress;
mod shutdown;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use console::Term;
use starsweep::ForgeError;
use tracing_subscriber::EnvFilter;

use crate::commands::RunStatus;
use crate::commands::harvest::HarvestArgs;
use crate::commands::limits::OutputFormat;
use crate::commands::revoke::RevokeArgs;

/// Exit status for a run that saved its work but stopped early.
const EXIT_PARTIAL: u8 = 2;
/// Exit status for configuration problems (sysexits EX_CONFIG).
const EXIT_CONFIG: u8 = 78;

#[derive(Parser)]
#[command(name = "starsweep")]
#[command(version)]
#[command(about = "Export your starred repositories to CSV and unstar the ones you flag")]
#[command(
    long_about = "Starsweep pages through the repositories you have starred on GitHub and \
writes them to a CSV file with a disposition column. Edit the file, mark rows \
`revoke`, then run `starsweep revoke` to remove those stars."
)]
#[command(after_long_help = r#"EXAMPLES
    Export all stars with their descriptions:
        $ starsweep harvest -o stars.csv

    Use README text instead, starting from page 4 of an earlier run:
        $ starsweep harvest --detail readme --start-page 4 --append

    Unstar every row marked revoke:
        $ starsweep revoke -i stars.csv

    Preview, treating the first 40 rows as done:
        $ starsweep revoke --resume-from 40 --dry-run

CONFIGURATION
    Starsweep reads configuration from:
      1. ~/.config/starsweep/config.toml (or $XDG_CONFIG_HOME/starsweep/config.toml)
      2. ./starsweep.toml
      3. Environment variables (STARSWEEP_ prefix, e.g. STARSWEEP_HARVEST__PER_PAGE)
      4. .env file in current directory

ENVIRONMENT VARIABLES
    STARSWEEP_GITHUB_TOKEN    GitHub personal access token (GITHUB_TOKEN also works)
    STARSWEEP_STORE__PATH     CSV file used when -o/-i is not given

EXIT STATUS
    0 success, 1 error, 2 partial run (work saved), 78 configuration error
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch your starred repositories into a CSV file
    Harvest(HarvestArgs),
    /// Unstar every row marked `revoke` and record the result
    Revoke(RevokeArgs),
    /// Show current rate limit status
    Limits {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
}

fn init_tracing() {
    // Progress bars own the terminal; structured logs are for pipes and CI.
    if Term::stdout().is_term() {
        return;
    }

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("starsweep=info,starsweep_cli=info"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}

fn report_error(message: &str) {
    if Term::stderr().is_term() {
        eprintln!("Error: {}", message);
    } else {
        tracing::error!("{}", message);
    }
}

async fn run(cli: Cli, config: config::Config) -> ExitCode {
    let client = match commands::forge_client(&config) {
        Ok(client) => client,
        Err(ForgeError::Config(message)) => {
            report_error(&message);
            return ExitCode::from(EXIT_CONFIG);
        }
        Err(e) => {
            report_error(&e.to_string());
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Harvest(args) => {
            let stop = shutdown::install_stop_flag();
            commands::harvest::handle_harvest(args, &config, &client, stop).await
        }
        Commands::Revoke(args) => {
            let stop = shutdown::install_stop_flag();
            commands::revoke::handle_revoke(args, &config, &client, stop).await
        }
        Commands::Limits { output } => commands::limits::handle_limits(output, &client)
            .await
            .map(|()| RunStatus::Complete),
    };

    match result {
        Ok(RunStatus::Complete) => ExitCode::SUCCESS,
        Ok(RunStatus::Partial) => ExitCode::from(EXIT_PARTIAL),
        Err(e) => {
            report_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    let config = match config::Config::load() {
        Ok(config) => config,
        Err(e) => {
            report_error(&format!("Invalid configuration: {}", e));
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    run(cli, config).await
}
