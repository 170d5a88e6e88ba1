//! # shield-crypto — Keyed Primitives
//!
//! Provides the cryptographic building blocks of the masking engine:
//!
//! - **SecretKey**: process-wide key material held in zeroizing memory,
//!   never printed, identified in logs only by a keyed fingerprint.
//! - **KeyProvider** backends: environment variable, key file, and an
//!   in-memory provider for tests. A missing key is always an explicit
//!   [`MaskingError::MissingKey`](shield_core::MaskingError::MissingKey).
//! - **HMAC-SHA256 PRF**: keyed digests, counter-and-rehash digit streams,
//!   and seeds for identity generation and keyed noise.
//! - **Tokenizer**: format-preserving tokenization of identifiers, and shape
//!   tokens for short alphanumeric codes.
//!
//! ## Crate Policy
//!
//! - Depends only on `shield-core` internally.
//! - Key bytes are reachable only inside this crate.
//! - No mocking of cryptographic operations in tests; every test runs real
//!   HMAC-SHA256.

pub mod key_provider;
pub mod prf;
pub mod secret;
pub mod tokenizer;

pub use key_provider::{
    EnvKeyProvider, FileKeyProvider, KeyEncoding, KeyProvider, StaticKeyProvider, DEFAULT_KEY_VAR,
};
pub use prf::{
    derive_seed, framed_sha256, keyed_digest, DigitStream, SeedDomain, DECIMAL_RADIX, LETTER_RADIX,
};
pub use secret::{SecretKey, MIN_KEY_LEN};
pub use tokenizer::{
    keyed_reference, shape_token, tokenize, tokenize_with_salt, FormatTemplate, TokenizeError,
};
