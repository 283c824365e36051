//! Arrowhead CLI - offline tools for order dumps.
//!
//! # Usage
//!
//! ```bash
//! # Check submission payloads against the order contract
//! ah-cli validate payloads.json
//!
//! # Normalize stored records exactly as the dashboard reads them
//! ah-cli normalize orders.json
//!
//! # Fail if any record had to be dropped
//! ah-cli normalize orders.json --strict
//!
//! # Status counts and the pick queue
//! ah-cli stats orders.json
//! ```
//!
//! Every command reads a JSON array (or a single object) and writes JSON to
//! stdout. Diagnostics go to the log on stderr.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "ah-cli")]
#[command(author, version, about = "Arrowhead order tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate order submission payloads
    Validate {
        /// JSON file with one payload or an array of payloads
        file: PathBuf,
    },
    /// Normalize stored order records
    Normalize {
        /// JSON file with one record or an array of records
        file: PathBuf,

        /// Exit with an error if any record is omitted
        #[arg(long)]
        strict: bool,
    },
    /// Show status counts and the pick queue
    Stats {
        /// JSON file with stored order records
        file: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "arrowhead_cli=info,arrowhead_core=warn".into()),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Validate { file } => commands::validate::run(&file),
        Commands::Normalize { file, strict } => commands::normalize::run(&file, strict),
        Commands::Stats { file } => commands::stats::run(&file),
    }
}
