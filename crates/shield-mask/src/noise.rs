//! # Noise Source
//!
//! Supplies the random generator behind amount perturbation, rate
//! perturbation and date shifting. The generator is built per field, so the
//! output of one field never depends on how many fields a worker masked
//! before it.
//!
//! | Mode | Seed | Reproducible |
//! |------|------|--------------|
//! | `entropy` | OS entropy | no |
//! | `seeded` | `SHA-256(seed ‖ table ‖ row ‖ column ‖ classification ‖ raw)` | yes, for the same seed and layout |
//! | `keyed` | keyed seed of `(classification, raw)` | yes, for the same key; equal raw values mask equally |

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use shield_core::{FieldClassification, FieldLocation, MaskingError};
use shield_crypto::{derive_seed, framed_sha256, SecretKey, SeedDomain};

/// Where bounded noise comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum NoiseSource {
    /// Fresh OS-seeded generator per field.
    #[default]
    Entropy,
    /// Generator seeded from a caller-supplied number and the field position.
    Seeded {
        /// Run seed.
        seed: u64,
    },
    /// Generator seeded from the secret key and the raw value.
    Keyed,
}

impl NoiseSource {
    /// True if repeated runs can reproduce the output.
    pub fn is_reproducible(&self) -> bool {
        !matches!(self, Self::Entropy)
    }

    /// Mode name for logs.
    pub fn mode_name(&self) -> &'static str {
        match self {
            Self::Entropy => "entropy",
            Self::Seeded { .. } => "seeded",
            Self::Keyed => "keyed",
        }
    }

    /// Generator for one field.
    pub(crate) fn rng_for(
        &self,
        key: &SecretKey,
        location: &FieldLocation,
        classification: FieldClassification,
        raw: &str,
    ) -> Result<StdRng, MaskingError> {
        match self {
            Self::Entropy => Ok(StdRng::from_entropy()),
            Self::Seeded { seed } => {
                let row = location.row as u64;
                Ok(StdRng::from_seed(framed_sha256(&[
                    &seed.to_be_bytes(),
                    location.table.as_bytes(),
                    &row.to_be_bytes(),
                    location.column.as_bytes(),
                    classification.as_str().as_bytes(),
                    raw.as_bytes(),
                ])))
            }
            Self::Keyed => Ok(StdRng::from_seed(derive_seed(
                key,
                SeedDomain::Noise,
                classification,
                raw,
            )?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn key() -> SecretKey {
        SecretKey::from_bytes(b"noise-test-key-0123456789".to_vec()).unwrap()
    }

    fn draw(source: NoiseSource, location: &FieldLocation, raw: &str) -> u64 {
        source
            .rng_for(&key(), location, FieldClassification::MonetaryAmount, raw)
            .unwrap()
            .gen()
    }

    #[test]
    fn seeded_depends_on_position() {
        let source = NoiseSource::Seeded { seed: 7 };
        let a = FieldLocation::new("t", 0, "Amount");
        let b = FieldLocation::new("t", 1, "Amount");
        assert_eq!(draw(source, &a, "10.00"), draw(source, &a, "10.00"));
        assert_ne!(draw(source, &a, "10.00"), draw(source, &b, "10.00"));
        assert_ne!(
            draw(source, &a, "10.00"),
            draw(NoiseSource::Seeded { seed: 8 }, &a, "10.00")
        );
    }

    #[test]
    fn keyed_ignores_position() {
        let a = FieldLocation::new("t", 0, "Amount");
        let b = FieldLocation::new("u", 9, "Total_Due");
        assert_eq!(draw(NoiseSource::Keyed, &a, "10.00"), draw(NoiseSource::Keyed, &b, "10.00"));
        assert_ne!(draw(NoiseSource::Keyed, &a, "10.00"), draw(NoiseSource::Keyed, &a, "10.01"));
    }

    #[test]
    fn yaml_forms() {
        let s: NoiseSource = serde_yaml::from_str("mode: seeded\nseed: 12345").unwrap();
        assert_eq!(s, NoiseSource::Seeded { seed: 12345 });
        let s: NoiseSource = serde_yaml::from_str("mode: keyed").unwrap();
        assert_eq!(s, NoiseSource::Keyed);
        assert_eq!(NoiseSource::default(), NoiseSource::Entropy);
        assert!(!NoiseSource::Entropy.is_reproducible());
        assert_eq!(NoiseSource::Keyed.mode_name(), "keyed");
    }
}
