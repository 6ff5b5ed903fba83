//! stackpilot - submit and land Graphite stacks on GitHub
//!
//! CLI binary. Submit commands print one JSON object to stdout; everything
//! else goes to stderr.

use clap::{Parser, Subcommand};
use stackpilot::land::LandOptions;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

use cli::SubmitCommand;

/// Exit code for an interrupted run, distinct from operational failure
const EXIT_INTERRUPTED: u8 = 130;

#[derive(Parser)]
#[command(name = "stackpilot")]
#[command(about = "Submit and land stacked PRs with Graphite and GitHub")]
#[command(version)]
struct Cli {
    /// Path inside the repository (defaults to current directory)
    #[arg(short, long, global = true)]
    path: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Commit stray changes, check conflicts, and squash the branch
    PreAnalysis,

    /// Amend with a commit message, submit, and update the PR
    PostAnalysis {
        /// Commit message; the first line becomes the PR title
        #[arg(long)]
        commit_message: String,
    },

    /// Prepare and submit without a message, and write the branch diff
    Preflight {
        /// Identifier naming the diff file
        #[arg(long)]
        session_id: String,
    },

    /// Set the PR title and body and amend the local commit to match
    Finalize {
        /// PR to update
        #[arg(long)]
        pr_number: u64,
        /// PR title
        #[arg(long)]
        pr_title: String,
        /// PR body
        #[arg(long)]
        pr_body: String,
    },

    /// Prepare, generate a commit message, and submit in one run
    Submit,

    /// Land every PR between trunk and the current branch, bottom first
    LandStack {
        /// Only update branches that are part of the landing plan
        #[arg(long)]
        down: bool,

        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,

        /// Show the plan without merging anything
        #[arg(long)]
        dry_run: bool,

        /// Show retry attempts and debug logs
        #[arg(short, long)]
        verbose: bool,
    },
}

/// Log to stderr; `RUST_LOG` wins over the verbosity default
fn init_tracing(verbose: bool) {
    let default = if verbose { "stackpilot=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    let path = cli.path.unwrap_or_else(|| PathBuf::from("."));

    let command = match cli.command {
        Commands::PreAnalysis => SubmitCommand::PreAnalysis,
        Commands::PostAnalysis { commit_message } => {
            SubmitCommand::PostAnalysis { commit_message }
        }
        Commands::Preflight { session_id } => SubmitCommand::Preflight { session_id },
        Commands::Finalize {
            pr_number,
            pr_title,
            pr_body,
        } => SubmitCommand::Finalize {
            pr_number,
            pr_title,
            pr_body,
        },
        Commands::Submit => SubmitCommand::Submit,
        Commands::LandStack {
            down,
            force,
            dry_run,
            verbose,
        } => {
            let options = LandOptions {
                down,
                force,
                dry_run,
                verbose,
            };
            return Ok(cli::run_land(&path, options).await?);
        }
    };
    Ok(cli::run_submit(&path, command).await)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let verbose = matches!(cli.command, Commands::LandStack { verbose: true, .. });
    init_tracing(verbose);

    tokio::select! {
        result = run(cli) => match result {
            Ok(true) => ExitCode::SUCCESS,
            Ok(false) => ExitCode::FAILURE,
            Err(e) => {
                anstream::eprintln!("error: {e:#}");
                ExitCode::FAILURE
            }
        },
        _ = tokio::signal::ctrl_c() => {
            anstream::eprintln!("interrupted");
            ExitCode::from(EXIT_INTERRUPTED)
        }
    }
}
