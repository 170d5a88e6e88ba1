//! # Field Masking Dispatch
//!
//! `MaskingContext::mask_field` looks up the policy for a classification and
//! delegates to the matching generator. Deterministic strategies go through
//! the identity cache, so a raw value recurring anywhere in the run returns
//! the stored result instead of being generated again.
//!
//! ## Blank Values
//!
//! Whitespace-only values carry nothing to disclose and are returned as-is,
//! except under `tokenize` and `keyed_reference`, which reject empty input.
//!
//! ## Embedded SSNs
//!
//! An SSN found inside free text is masked by the registry's `Ssn` policy
//! and shares its cache entry, so it always equals the SSN column's value no
//! matter which cell is masked first.

use shield_core::{FieldClassification, FieldLocation, MaskingError, ScaledDecimal};
use shield_crypto::{keyed_reference, shape_token, tokenize};

use crate::context::MaskingContext;
use crate::date_shift::shift_date;
use crate::identity::generate;
use crate::perturb::{perturb_amount, perturb_rate};
use crate::policy::{IdentityKind, MaskingStrategy};

impl MaskingContext {
    /// Mask one value outside any record set.
    pub fn mask_field(
        &self,
        classification: FieldClassification,
        raw: &str,
    ) -> Result<String, MaskingError> {
        self.mask_field_at(classification, raw, &FieldLocation::detached())
    }

    /// Mask one value at a known position. The position only feeds the
    /// `seeded` noise mode.
    pub fn mask_field_at(
        &self,
        classification: FieldClassification,
        raw: &str,
        location: &FieldLocation,
    ) -> Result<String, MaskingError> {
        let c = classification;
        let strategy = self.registry.get(c)?.strategy();
        let requires_value = matches!(
            strategy,
            MaskingStrategy::Tokenize { .. } | MaskingStrategy::KeyedReference { .. }
        );
        if !requires_value && raw.trim().is_empty() {
            return Ok(raw.to_string());
        }

        match strategy {
            MaskingStrategy::Tokenize { .. } | MaskingStrategy::KeyedReference { .. } => {
                self.keyed_identifier(c, raw, strategy)
            }
            MaskingStrategy::ShapeToken { name_fallback } => {
                if *name_fallback && !raw.chars().any(|ch| ch.is_ascii_digit()) {
                    self.cache
                        .resolve(c, raw, || generate(&self.key, IdentityKind::Name, c, raw, false))
                } else {
                    self.cache.resolve(c, raw, || shape_token(&self.key, c, raw))
                }
            }
            MaskingStrategy::IdentitySubstitute { kind, fit_width } => self
                .cache
                .resolve(c, raw, || generate(&self.key, *kind, c, raw, *fit_width)),
            MaskingStrategy::PerturbAmount { max_percent } => {
                let value = parse_decimal(c, raw)?;
                let mut rng = self.noise.rng_for(&self.key, location, c, raw)?;
                perturb_amount(value, *max_percent, &mut rng)
                    .map(|v| v.to_string())
                    .map_err(|e| MaskingError::invalid_input(c, e.to_string()))
            }
            MaskingStrategy::PerturbRate {
                max_absolute,
                min_scale,
            } => {
                let value = parse_decimal(c, raw)?;
                let mut rng = self.noise.rng_for(&self.key, location, c, raw)?;
                perturb_rate(value, *max_absolute, *min_scale, &mut rng)
                    .map(|v| v.to_string())
                    .map_err(|e| MaskingError::invalid_input(c, e.to_string()))
            }
            MaskingStrategy::ShiftDate { max_days } => {
                if self.is_date_sentinel(raw) {
                    return Ok(raw.to_string());
                }
                let mut rng = self.noise.rng_for(&self.key, location, c, raw)?;
                let date = raw.trim();
                let shifted = shift_date(date, *max_days, &mut rng)
                    .map_err(|e| MaskingError::invalid_input(c, e.to_string()))?;
                // Fixed-width columns keep their padding on both sides.
                let lead = raw.len() - raw.trim_start().len();
                let tail = raw.trim_end().len();
                Ok(format!("{}{shifted}{}", &raw[..lead], &raw[tail..]))
            }
            MaskingStrategy::GeneralizeCategory => Ok(self.vocabulary.generalize(raw).to_string()),
            MaskingStrategy::ScrubEmbedded => {
                self.scrubber.scrub(raw, |found| self.embedded_ssn(found))
            }
            MaskingStrategy::Passthrough => Ok(raw.to_string()),
        }
    }

    /// Token for an SSN found inside free text, produced by the `Ssn`
    /// policy so it matches SSN columns.
    fn embedded_ssn(&self, found: &str) -> Result<String, MaskingError> {
        let ssn = FieldClassification::Ssn;
        match self.registry.embedded_ssn_strategy() {
            Some(strategy) => self.keyed_identifier(ssn, found, strategy),
            None => Err(MaskingError::invalid_policy(
                ssn,
                "embedded SSNs need a tokenize or keyed_reference policy",
            )),
        }
    }

    /// Unique keyed token for an identifier under `tokenize` or
    /// `keyed_reference`.
    fn keyed_identifier(
        &self,
        c: FieldClassification,
        raw: &str,
        strategy: &MaskingStrategy,
    ) -> Result<String, MaskingError> {
        match strategy {
            MaskingStrategy::Tokenize { preserve_last_n } => {
                self.cache.resolve_unique(c, raw, self.collision, || {
                    tokenize(&self.key, c, raw, *preserve_last_n)
                })
            }
            MaskingStrategy::KeyedReference { length } => {
                self.cache.resolve_unique(c, raw, self.collision, || {
                    keyed_reference(&self.key, c, raw, *length)
                })
            }
            other => Err(MaskingError::invalid_policy(
                c,
                format!("{} is not a keyed identifier strategy", other.name()),
            )),
        }
    }
}

fn parse_decimal(c: FieldClassification, raw: &str) -> Result<ScaledDecimal, MaskingError> {
    raw.trim()
        .parse::<ScaledDecimal>()
        .map_err(|e| MaskingError::invalid_input(c, e.to_string()))
}
