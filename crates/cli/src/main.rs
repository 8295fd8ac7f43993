//! dossier CLI
//!
//! Compresses case-file documents into ZIP or 7z archives, locally when the
//! selection is small enough and through the compression server otherwise.

mod commands;
mod dropzone;
mod error;
mod history;
mod progress;

use crate::error::{ErrorKind, Result};
use clap::{Parser, Subcommand};
use dossier_config::Config;
use exn::ResultExt;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt};

/// Exit status after the user interrupted a compression.
const EXIT_CANCELLED: u8 = 130;

/// dossier: archive case-file documents.
#[derive(Parser, Debug)]
#[command(name = "dossier", version, about)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON).
    #[arg(long, short, env = "DOSSIER_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compress local files and directories.
    Compress(commands::compress::CompressArgs),
    /// Have the server archive the documents of a case file.
    Expediente(commands::expediente::ExpedienteArgs),
    /// List previous compressions.
    History(commands::history::HistoryArgs),
    /// Show the configured limits.
    Limits,
}

#[tokio::main]
async fn main() -> ExitCode {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) if err.is_cancelled() => {
            eprintln!("Compression cancelled.");
            ExitCode::from(EXIT_CANCELLED)
        },
        Err(err) => {
            eprintln!("error: {}", *err);
            tracing::debug!(error = ?err, "Command failed");
            ExitCode::FAILURE
        },
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    match cli.command {
        Command::Compress(args) => commands::compress::run(config, args).await,
        Command::Expediente(args) => commands::expediente::run(config, args).await,
        Command::History(args) => commands::history::run(&config, args).await,
        Command::Limits => {
            commands::limits::run(&config);
            Ok(())
        },
    }
}
