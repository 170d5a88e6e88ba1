//! # shield-mask — The Masking Engine
//!
//! Turns classified record sets into masked record sets:
//!
//! - **Policies** map each [`FieldClassification`](shield_core::FieldClassification)
//!   to exactly one masking strategy. The standard registry covers all of
//!   them; configuration may override individual entries.
//! - **MaskingContext** carries one run's key, registry, vocabulary, noise
//!   source and identity cache. There is no global state.
//! - **IdentityCache** guarantees that a raw value maps to one masked value
//!   for the whole run, across tables and worker threads.
//! - **Generators** tokenize identifiers, substitute names and addresses,
//!   perturb amounts and rates within bounds, shift dates, generalize
//!   descriptions and scrub SSNs embedded in free text.
//! - **MaskingOrchestrator** masks whole record sets on a fixed worker pool
//!   and fails the batch on the first bad field.
//! - **MappingTable** exports and restores the identity cache so a later
//!   run under the same key reproduces earlier substitutions.
//!
//! ## Security Invariant
//!
//! Raw field values never appear in logs, error messages or the run report.
//! The only artifact that holds raw values is an exported mapping table,
//! which callers must treat as sensitive.
//!
//! ## Crate Policy
//!
//! - Depends on `shield-core` and `shield-crypto` internally.
//! - No `unsafe` code.
//! - No `.unwrap()` outside tests.

pub mod category;
pub mod config;
pub mod context;
pub mod date_shift;
pub mod identity;
pub mod masker;
pub mod noise;
pub mod orchestrator;
pub mod perturb;
pub mod policy;
pub mod replay;
pub mod report;
pub mod scrub;

pub use category::{CategoryRule, CategoryVocabulary};
pub use config::{ConfigError, EngineConfig, KeySource};
pub use context::MaskingContext;
pub use date_shift::{detect, shift_date, DateShiftError, DetectedDate, DEFAULT_DATE_SENTINELS};
pub use identity::{CollisionPolicy, IdentityCache};
pub use noise::NoiseSource;
pub use orchestrator::{MaskingOrchestrator, MaskingOutcome};
pub use perturb::{perturb_amount, perturb_rate};
pub use policy::{IdentityKind, MaskingPolicy, MaskingStrategy, PolicyRegistry, MAX_SHIFT_DAYS};
pub use replay::{MappingEntry, MappingTable, MAPPING_TABLE_VERSION};
pub use report::{RunReport, TableReport};
pub use scrub::EmbeddedScrubber;
