//! # shield CLI entry point
//!
//! Parses command-line arguments, loads the engine configuration and
//! dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use shield_cli::key::{run_check_key, CheckKeyArgs};
use shield_cli::mask::{run_mask, MaskArgs};
use shield_cli::tokenize::{run_tokenize, TokenizeArgs};
use shield_mask::EngineConfig;

/// SHIELD: deterministic masking for financial record snapshots.
///
/// Replaces names, addresses, account and note numbers, SSNs, amounts,
/// rates, dates and descriptions with realistic substitutes while keeping
/// joins between tables intact.
#[derive(Parser, Debug)]
#[command(name = "shield", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the engine configuration file (YAML or JSON).
    #[arg(long, global = true, env = "SHIELD_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Mask a columnar JSON dataset.
    Mask(MaskArgs),

    /// Mask a single value with a deterministic policy.
    Tokenize(TokenizeArgs),

    /// Load the configured key and print its fingerprint.
    CheckKey(CheckKeyArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "shield CLI starting");

    let result = load_config(cli.config.as_ref()).and_then(|config| match &cli.command {
        Commands::Mask(args) => run_mask(args, &config),
        Commands::Tokenize(args) => run_tokenize(args, &config),
        Commands::CheckKey(args) => run_check_key(args, &config),
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<EngineConfig> {
    match path {
        Some(path) => {
            let config = EngineConfig::load(path)
                .with_context(|| format!("loading configuration {}", path.display()))?;
            tracing::debug!(path = %path.display(), "configuration loaded");
            Ok(config)
        }
        None => Ok(EngineConfig::default()),
    }
}
