// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// DocSee command-line scanner.
//
// Entry point. Initialises logging, loads configuration, and runs the chosen
// subcommand.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use docsee_core::ScanConfig;
use docsee_core::config::CONFIG_FILE;
use docsee_core::error::{DocseeError, Result};

/// Scan documents from still images or a stream of frames.
#[derive(Parser, Debug)]
#[command(name = "docsee", version)]
#[command(about = "Document boundary detection, rectification and text extraction")]
struct Cli {
    /// Configuration file (JSON). Defaults apply when it is missing.
    #[arg(short, long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Detect, rectify and extract text from still images.
    Scan {
        /// Image files, one page each.
        #[arg(required = true)]
        images: Vec<PathBuf>,

        #[command(flatten)]
        output: commands::OutputArgs,
    },
    /// Run live capture over a directory of frames, sorted by name.
    Live {
        frames_dir: PathBuf,

        /// Stop after this many frames without a capture.
        #[arg(long, default_value_t = 600)]
        max_frames: usize,

        #[command(flatten)]
        output: commands::OutputArgs,
    },
    /// Print the effective configuration as JSON.
    Config,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let result = run(cli).await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "DocSee failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = ScanConfig::load_or_default(&cli.config).map_err(|e| {
        DocseeError::Config(format!("cannot use {}: {e}", cli.config.display()))
    })?;

    tracing::info!(config = %cli.config.display(), "DocSee starting");

    match cli.command {
        Command::Scan { images, output } => commands::scan(&config, &images, &output).await,
        Command::Live {
            frames_dir,
            max_frames,
            output,
        } => commands::live(&config, &frames_dir, max_frames, &output).await,
        Command::Config => commands::print_config(&config),
    }
}
