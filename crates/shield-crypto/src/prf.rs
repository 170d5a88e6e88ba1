//! # Keyed PRF — HMAC-SHA256 Digests, Digit Streams and Seeds
//!
//! Every keyed value the engine produces flows through this module.
//!
//! ## Framing
//!
//! Inputs are length-prefixed (`u64` big-endian) before they enter the MAC,
//! so `("ab", "c")` and `("a", "bc")` never hash alike. The salt is always
//! the first framed part.
//!
//! ## Digit Streams
//!
//! [`DigitStream`] expands one keyed input into an unbounded sequence of
//! digits in a small radix: block *i* is `HMAC(key, salt ‖ input ‖ radix ‖ i)`.
//! Bytes at or above the largest multiple of the radix are skipped, so every
//! emitted digit is exactly uniform (for decimal, bytes ≥ 250).

use hmac::Mac;
use sha2::{Digest, Sha256};

use shield_core::{FieldClassification, MaskingError};

use crate::secret::{HmacSha256, SecretKey};

/// Radix of decimal digit streams.
pub const DECIMAL_RADIX: u8 = 10;

/// Radix of letter streams, one per ASCII letter.
pub const LETTER_RADIX: u8 = 26;

/// Separate seed namespaces so identity generation and keyed noise never
/// share randomness for the same raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeedDomain {
    /// Realistic name/address substitution.
    Identity,
    /// Keyed perturbation of amounts, rates and dates.
    Noise,
}

impl SeedDomain {
    fn label(&self) -> &'static [u8] {
        match self {
            Self::Identity => b"shield/seed/identity",
            Self::Noise => b"shield/seed/noise",
        }
    }
}

fn frame(mac: &mut HmacSha256, part: &[u8]) {
    mac.update(&(part.len() as u64).to_be_bytes());
    mac.update(part);
}

/// HMAC-SHA256 over the framed salt and parts.
pub fn keyed_digest(key: &SecretKey, salt: &[u8], parts: &[&[u8]]) -> Result<[u8; 32], MaskingError> {
    let mut mac = key.mac()?;
    frame(&mut mac, salt);
    for part in parts {
        frame(&mut mac, part);
    }
    let hash = mac.finalize().into_bytes();
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hash);
    Ok(bytes)
}

/// 32-byte seed for a deterministic generator, derived from the key, the
/// seed domain, the classification and the raw value.
pub fn derive_seed(
    key: &SecretKey,
    domain: SeedDomain,
    classification: FieldClassification,
    raw: &str,
) -> Result<[u8; 32], MaskingError> {
    keyed_digest(key, domain.label(), &[classification.salt(), raw.as_bytes()])
}

/// Unkeyed SHA-256 over framed parts, for seeds that must be reproducible
/// from a caller-supplied number rather than the secret key.
pub fn framed_sha256(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update((part.len() as u64).to_be_bytes());
        hasher.update(part);
    }
    let hash = hasher.finalize();
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hash);
    bytes
}

/// Unbounded, deterministic stream of uniform digits in a fixed radix.
pub struct DigitStream {
    base: HmacSha256,
    counter: u64,
    block: [u8; 32],
    pos: usize,
    radix: u8,
    bound: u16,
}

impl DigitStream {
    /// Start a decimal stream for `input` under `salt`.
    pub fn new(key: &SecretKey, salt: &[u8], input: &[u8]) -> Result<Self, MaskingError> {
        Self::with_radix(key, salt, input, DECIMAL_RADIX)
    }

    /// Start a stream of digits in `0..radix` (a radix below 2 is raised to
    /// 2). The radix is part of the MAC input, so streams of different
    /// radices never share blocks.
    pub fn with_radix(
        key: &SecretKey,
        salt: &[u8],
        input: &[u8],
        radix: u8,
    ) -> Result<Self, MaskingError> {
        let radix = radix.max(2);
        let mut base = key.mac()?;
        frame(&mut base, salt);
        frame(&mut base, input);
        frame(&mut base, &[radix]);
        Ok(Self {
            base,
            counter: 0,
            block: [0u8; 32],
            pos: 32,
            radix,
            bound: 256 - 256 % u16::from(radix),
        })
    }

    fn refill(&mut self) {
        let mut mac = self.base.clone();
        mac.update(&self.counter.to_be_bytes());
        self.block.copy_from_slice(&mac.finalize().into_bytes());
        self.counter = self.counter.wrapping_add(1);
        self.pos = 0;
    }
}

impl Iterator for DigitStream {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        loop {
            if self.pos == self.block.len() {
                self.refill();
            }
            let byte = self.block[self.pos];
            self.pos += 1;
            if u16::from(byte) < self.bound {
                return Some(byte % self.radix);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(text: &str) -> SecretKey {
        SecretKey::from_bytes(text.as_bytes().to_vec()).expect("test key")
    }

    #[test]
    fn keyed_digest_is_deterministic() {
        let k = key("prf-test-key-0123456789abcdef");
        let a = keyed_digest(&k, b"salt", &[b"1234"]).unwrap();
        let b = keyed_digest(&k, b"salt", &[b"1234"]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn framing_separates_part_boundaries() {
        let k = key("prf-test-key-0123456789abcdef");
        let a = keyed_digest(&k, b"salt", &[b"ab", b"c"]).unwrap();
        let b = keyed_digest(&k, b"salt", &[b"a", b"bc"]).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn keyed_digest_depends_on_key_and_salt() {
        let k1 = key("prf-test-key-0123456789abcdef");
        let k2 = key("prf-other-key-0123456789abcdef");
        let base = keyed_digest(&k1, b"salt", &[b"1234"]).unwrap();
        assert_ne!(base, keyed_digest(&k2, b"salt", &[b"1234"]).unwrap());
        assert_ne!(base, keyed_digest(&k1, b"other", &[b"1234"]).unwrap());
    }

    #[test]
    fn seed_domains_are_separated() {
        let k = key("prf-test-key-0123456789abcdef");
        let identity = derive_seed(&k, SeedDomain::Identity, FieldClassification::Name, "JANE DOE").unwrap();
        let noise = derive_seed(&k, SeedDomain::Noise, FieldClassification::Name, "JANE DOE").unwrap();
        assert_ne!(identity, noise);
    }

    #[test]
    fn digit_stream_is_deterministic_and_in_range() {
        let k = key("prf-test-key-0123456789abcdef");
        let a: Vec<u8> = DigitStream::new(&k, b"salt", b"1234").unwrap().take(200).collect();
        let b: Vec<u8> = DigitStream::new(&k, b"salt", b"1234").unwrap().take(200).collect();
        assert_eq!(a, b);
        assert!(a.iter().all(|d| *d < 10));
    }

    #[test]
    fn digit_stream_spans_multiple_blocks() {
        let k = key("prf-test-key-0123456789abcdef");
        let digits: Vec<u8> = DigitStream::new(&k, b"salt", b"x").unwrap().take(1000).collect();
        assert_eq!(digits.len(), 1000);
        // 1000 digits need at least 32 blocks; identical consecutive blocks
        // would show up as a repeated 30-digit window.
        assert_ne!(digits[..30], digits[32..62]);
    }

    #[test]
    fn digit_stream_is_roughly_uniform() {
        let k = key("prf-test-key-0123456789abcdef");
        let mut counts = [0usize; 10];
        for d in DigitStream::new(&k, b"salt", b"uniformity").unwrap().take(20_000) {
            counts[d as usize] += 1;
        }
        // Expected 2000 each; sigma ~42.
        for (digit, count) in counts.iter().enumerate() {
            assert!((1750..=2250).contains(count), "digit {digit} appeared {count} times");
        }
    }

    #[test]
    fn letter_stream_covers_the_alphabet() {
        let k = key("prf-test-key-0123456789abcdef");
        let mut counts = [0usize; 26];
        for d in DigitStream::with_radix(&k, b"salt", b"letters", LETTER_RADIX).unwrap().take(26_000) {
            counts[d as usize] += 1;
        }
        for (letter, count) in counts.iter().enumerate() {
            assert!((800..=1200).contains(count), "letter {letter} appeared {count} times");
        }
    }

    #[test]
    fn radix_separates_streams() {
        let k = key("prf-test-key-0123456789abcdef");
        let decimal: Vec<u8> = DigitStream::new(&k, b"salt", b"x").unwrap().take(64).collect();
        let letters: Vec<u8> = DigitStream::with_radix(&k, b"salt", b"x", LETTER_RADIX)
            .unwrap()
            .take(64)
            .map(|d| d % DECIMAL_RADIX)
            .collect();
        assert_ne!(decimal, letters);
    }

    #[test]
    fn framed_sha256_is_order_sensitive() {
        assert_ne!(framed_sha256(&[b"a", b"b"]), framed_sha256(&[b"b", b"a"]));
        assert_eq!(framed_sha256(&[b"a", b"b"]), framed_sha256(&[b"a", b"b"]));
    }
}
