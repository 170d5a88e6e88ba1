//! # shield-cli — Command-Line Interface for the SHIELD Masking Engine
//!
//! Provides the `shield` binary, which masks table snapshots exported as
//! columnar JSON and offers the key and lookup tooling operators need
//! around a masking run.
//!
//! ## Subcommands
//!
//! - `shield mask`: Label, mask and write a dataset in one all-or-nothing run.
//! - `shield tokenize`: Mask one value for support lookups.
//! - `shield check-key`: Load the key and print its fingerprint.
//!
//! ```bash
//! SHIELD_PSEUDO_KEY=... shield mask -i snapshot.json -o masked.json --workers 8
//! shield tokenize --classification account_identifier 1234567890
//! shield --config shield.yaml check-key
//! ```
//!
//! ## Crate Policy
//!
//! - Argument parsing lives in the binary; handlers take parsed arguments
//!   and an [`EngineConfig`](shield_mask::EngineConfig).
//! - Masking logic lives in `shield-mask`; this crate only moves data in
//!   and out of files.
//! - Nothing is printed or logged that contains a raw field value.

pub mod catalog;
pub mod dataset;
pub mod key;
pub mod mask;
pub mod tokenize;
