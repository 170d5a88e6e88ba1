//! # check-key Subcommand
//!
//! Loads the configured key and prints its fingerprint, so operators can
//! confirm two environments share a key without ever displaying it.

use anyhow::{Context, Result};
use clap::Args;

use shield_mask::EngineConfig;

/// Arguments for `shield check-key`.
#[derive(Args, Debug)]
pub struct CheckKeyArgs {}

/// Execute the check-key subcommand.
pub fn run_check_key(_args: &CheckKeyArgs, config: &EngineConfig) -> Result<u8> {
    let provider = config.key.provider();
    let key = provider
        .load()
        .with_context(|| format!("loading key from {}", provider.provider_name()))?;
    tracing::info!(provider = provider.provider_name(), "key loaded");
    println!("provider:    {}", provider.provider_name());
    println!("fingerprint: {}", key.fingerprint());
    Ok(0)
}
