//! # tokenize Subcommand
//!
//! Masks a single value under the configured key and policy. Support staff
//! use it to find a customer's record in a masked snapshot: tokenize the
//! real account number, then search for the result.
//!
//! Only deterministic policies are accepted; a perturbed amount or shifted
//! date would not match anything.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;

use shield_core::FieldClassification;
use shield_mask::EngineConfig;

/// Arguments for `shield tokenize`.
#[derive(Args, Debug)]
pub struct TokenizeArgs {
    /// Classification of the value, e.g. `account_identifier` or `ssn`.
    #[arg(long, short)]
    pub classification: FieldClassification,

    /// The raw value.
    #[arg(value_name = "VALUE")]
    pub value: String,
}

/// Execute the tokenize subcommand.
pub fn run_tokenize(args: &TokenizeArgs, config: &EngineConfig) -> Result<u8> {
    println!("{}", tokenize_value(args, config)?);
    Ok(0)
}

fn tokenize_value(args: &TokenizeArgs, config: &EngineConfig) -> Result<String> {
    let key = config.key.load().context("loading key")?;
    let ctx = config.build_context(Arc::new(key))?;
    let policy = ctx.registry().get(args.classification)?;
    if !policy.strategy().is_deterministic() {
        bail!(
            "{} uses the {} strategy, which is not deterministic",
            args.classification,
            policy.strategy().name()
        );
    }
    let masked = ctx
        .mask_field(args.classification, &args.value)
        .with_context(|| format!("tokenizing {} value", args.classification))?;
    Ok(masked)
}
