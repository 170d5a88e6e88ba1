//! # shield-core — Foundational Types for the SHIELD Masking Engine
//!
//! This crate is the leaf of the workspace DAG. It defines the types every
//! other crate speaks: what a field *is* (its classification), what a
//! snapshot looks like (record sets of tables, rows and cells), how amounts
//! are represented exactly, and how failures are reported.
//!
//! ## Key Design Principles
//!
//! 1. **Closed classification enum.** `FieldClassification` is the single
//!    definition of field semantics. Policy dispatch matches on it
//!    exhaustively, so adding a classification without a policy is caught at
//!    compile time or at context construction, never at masking time.
//!
//! 2. **Exact decimals.** `ScaledDecimal` keeps an integer mantissa and a
//!    scale. Monetary and rate masking never round-trips through binary
//!    floating point for the stored value.
//!
//! 3. **Errors never carry raw values.** Every `MaskingError` variant
//!    describes the *shape* of a problem (classification, location, digit
//!    counts). Raw field contents must not reach logs through error text.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `shield-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod classification;
pub mod decimal;
pub mod error;
pub mod record;

// Re-export primary types for ergonomic imports.
pub use classification::{FieldClassification, FIELD_CLASSIFICATION_COUNT};
pub use decimal::{DecimalError, ScaledDecimal, MAX_SCALE};
pub use error::{FieldLocation, MaskingError};
pub use record::{Cell, RecordSet, Row, Table};
