//! # Secret Key
//!
//! The single secret behind every irreversible mapping the engine produces.
//!
//! ## Security Invariants
//!
//! - Key bytes live in [`Zeroizing`] memory and are wiped on drop.
//! - `Debug` prints the fingerprint, never the bytes or their length.
//! - Absent or empty material is [`MaskingError::MissingKey`]; there is no
//!   default key. Short keys and the well-known placeholder values are
//!   [`MaskingError::RejectedKey`], because a guessable key makes every
//!   masked identifier brute-forceable.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::Zeroizing;

use shield_core::MaskingError;

pub(crate) type HmacSha256 = Hmac<Sha256>;

/// Minimum accepted key length in bytes.
pub const MIN_KEY_LEN: usize = 16;

/// Placeholder values that ship in sample configs and must never be used.
const PLACEHOLDER_KEYS: &[&str] = &[
    "CHANGE-ME-IN-ENV",
    "CHANGE-ME",
    "changeme",
    "change-me-please",
    "your-long-random-secret",
];

const FINGERPRINT_LABEL: &[u8] = b"shield/key-fingerprint";

/// Key material for keyed tokenization and seed derivation.
#[derive(Clone)]
pub struct SecretKey {
    bytes: Zeroizing<Vec<u8>>,
}

impl SecretKey {
    /// Wrap raw key bytes.
    ///
    /// # Errors
    ///
    /// `MissingKey` if `bytes` is empty, `RejectedKey` if it is shorter than
    /// [`MIN_KEY_LEN`] or equals a known placeholder.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self, MaskingError> {
        let bytes = Zeroizing::new(bytes.into());
        if bytes.is_empty() {
            return Err(MaskingError::MissingKey("key material is empty".to_string()));
        }
        if PLACEHOLDER_KEYS
            .iter()
            .any(|p| p.as_bytes().eq_ignore_ascii_case(&bytes))
        {
            return Err(MaskingError::RejectedKey(
                "key material is a published placeholder value".to_string(),
            ));
        }
        if bytes.len() < MIN_KEY_LEN {
            return Err(MaskingError::RejectedKey(format!(
                "key material must be at least {MIN_KEY_LEN} bytes"
            )));
        }
        Ok(Self { bytes })
    }

    /// Decode a hex-encoded key.
    pub fn from_hex(encoded: &str) -> Result<Self, MaskingError> {
        let trimmed = encoded.trim();
        if trimmed.is_empty() {
            return Err(MaskingError::MissingKey("key material is empty".to_string()));
        }
        let bytes = Zeroizing::new(
            hex::decode(trimmed)
                .map_err(|_| MaskingError::RejectedKey("key is not valid hex".to_string()))?,
        );
        Self::from_bytes(bytes.to_vec())
    }

    /// Short, non-reversible identifier for this key, safe to log and to
    /// record next to exported mapping tables.
    pub fn fingerprint(&self) -> String {
        match self.mac() {
            Ok(mut mac) => {
                mac.update(FINGERPRINT_LABEL);
                hex::encode(&mac.finalize().into_bytes()[..8])
            }
            // Unreachable for HMAC, which accepts keys of any length.
            Err(_) => String::from("unavailable"),
        }
    }

    /// A fresh HMAC-SHA256 instance keyed with this secret.
    pub(crate) fn mac(&self) -> Result<HmacSha256, MaskingError> {
        HmacSha256::new_from_slice(&self.bytes)
            .map_err(|e| MaskingError::RejectedKey(format!("HMAC rejected key: {e}")))
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretKey")
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}
