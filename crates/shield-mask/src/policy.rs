//! # Field Masking Policy Registry
//!
//! Maps every [`FieldClassification`] to exactly one [`MaskingPolicy`]. The
//! registry is built once, validated, and then shared read-only by every
//! worker of a run.
//!
//! ## Standard Policies
//!
//! | Classification | Strategy |
//! |----------------|----------|
//! | Name, Address | identity substitute |
//! | AccountIdentifier, Ssn, NoteNumber, CustomerId | tokenize, keep last 4 |
//! | ReferenceNumber | keyed reference, 8 hex chars |
//! | OfficerCode | shape token, names for codes without digits |
//! | BranchCode | shape token |
//! | MonetaryAmount | perturb ±10 % |
//! | InterestRate | perturb ±0.5 absolute, 2 decimals |
//! | TransactionDate | shift ±30 days |
//! | Description | generalize to category |
//! | FreeText | scrub embedded SSNs with the Ssn policy |
//! | Passthrough | pass through |
//!
//! ## Security Invariant
//!
//! A sensitive classification can never be registered as pass-through. An
//! incomplete registry is rejected by [`PolicyRegistry::ensure_complete`]
//! before any record is masked.
//!
//! SSNs embedded in free text are masked by the `Ssn` policy itself and
//! share its cache entries, so that policy must be a keyed identifier
//! strategy whenever any classification scrubs embedded SSNs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use shield_core::{FieldClassification, MaskingError, MAX_SCALE};
use shield_crypto::tokenizer::MAX_REFERENCE_LEN;

/// Largest accepted date shift, in days.
pub const MAX_SHIFT_DAYS: u32 = 3650;

/// Which kind of realistic identity to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityKind {
    /// Person, company or county name.
    Name,
    /// Street, unit or city/state/ZIP line.
    Address,
}

/// Masking strategy together with its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum MaskingStrategy {
    /// Format-preserving keyed tokenization.
    Tokenize {
        /// Trailing digits copied from the raw value.
        #[serde(default = "default_preserve_last_n")]
        preserve_last_n: usize,
    },
    /// Fixed-length uppercase hex derived from the keyed MAC.
    KeyedReference {
        /// Output length in hex characters.
        #[serde(default = "default_reference_length")]
        length: usize,
    },
    /// Realistic fake name or address, cached per raw value.
    IdentitySubstitute {
        /// Name or address generator.
        kind: IdentityKind,
        /// Pad or truncate to the raw value's character width.
        #[serde(default)]
        fit_width: bool,
    },
    /// Relative noise on a decimal amount.
    PerturbAmount {
        /// Maximum relative change in percent, `0 <= p < 100`.
        #[serde(default = "default_max_percent")]
        max_percent: f64,
    },
    /// Absolute noise on a decimal rate.
    PerturbRate {
        /// Maximum absolute change, in rate units.
        #[serde(default = "default_max_absolute")]
        max_absolute: f64,
        /// Minimum number of decimals in the output.
        #[serde(default = "default_min_scale")]
        min_scale: u32,
    },
    /// Uniform day offset on a calendar date.
    ShiftDate {
        /// Maximum shift in either direction.
        #[serde(default = "default_max_days")]
        max_days: u32,
    },
    /// Replace a description with its category label.
    GeneralizeCategory,
    /// Replace every ASCII letter and digit of a short code with a keyed
    /// one of the same kind.
    ShapeToken {
        /// Values with no digit are names and get a realistic person name.
        #[serde(default)]
        name_fallback: bool,
    },
    /// Mask SSN-like substrings inside free text with the `Ssn` policy.
    ScrubEmbedded,
    /// Emit the raw value unchanged.
    Passthrough,
}

fn default_preserve_last_n() -> usize {
    4
}

fn default_reference_length() -> usize {
    8
}

fn default_max_percent() -> f64 {
    10.0
}

fn default_max_absolute() -> f64 {
    0.5
}

fn default_min_scale() -> u32 {
    2
}

fn default_max_days() -> u32 {
    30
}

impl MaskingStrategy {
    /// Short name for logs and reports.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tokenize { .. } => "tokenize",
            Self::KeyedReference { .. } => "keyed_reference",
            Self::IdentitySubstitute { .. } => "identity_substitute",
            Self::PerturbAmount { .. } => "perturb_amount",
            Self::PerturbRate { .. } => "perturb_rate",
            Self::ShiftDate { .. } => "shift_date",
            Self::GeneralizeCategory => "generalize_category",
            Self::ShapeToken { .. } => "shape_token",
            Self::ScrubEmbedded => "scrub_embedded",
            Self::Passthrough => "passthrough",
        }
    }

    /// True if the strategy maps one raw value to one output within a run
    /// regardless of the noise mode.
    pub fn is_deterministic(&self) -> bool {
        !matches!(
            self,
            Self::PerturbAmount { .. } | Self::PerturbRate { .. } | Self::ShiftDate { .. }
        )
    }
}

/// An immutable, validated `(classification, strategy)` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskingPolicy {
    classification: FieldClassification,
    strategy: MaskingStrategy,
}

impl MaskingPolicy {
    /// Validate and build a policy.
    ///
    /// # Errors
    ///
    /// `InvalidPolicy` when a parameter is out of bounds or a sensitive
    /// classification is configured as pass-through.
    pub fn new(
        classification: FieldClassification,
        strategy: MaskingStrategy,
    ) -> Result<Self, MaskingError> {
        validate(classification, &strategy)?;
        Ok(Self {
            classification,
            strategy,
        })
    }

    /// The classification this policy applies to.
    pub fn classification(&self) -> FieldClassification {
        self.classification
    }

    /// The strategy and its parameters.
    pub fn strategy(&self) -> &MaskingStrategy {
        &self.strategy
    }
}

fn validate(c: FieldClassification, strategy: &MaskingStrategy) -> Result<(), MaskingError> {
    match strategy {
        MaskingStrategy::Passthrough if c.is_sensitive() => Err(MaskingError::invalid_policy(
            c,
            "sensitive classifications cannot pass through",
        )),
        MaskingStrategy::KeyedReference { length } if *length == 0 || *length > MAX_REFERENCE_LEN => {
            Err(MaskingError::invalid_policy(
                c,
                format!("length must be within 1..={MAX_REFERENCE_LEN}"),
            ))
        }
        MaskingStrategy::PerturbAmount { max_percent }
            if !max_percent.is_finite() || *max_percent < 0.0 || *max_percent >= 100.0 =>
        {
            Err(MaskingError::invalid_policy(
                c,
                "max_percent must be within [0, 100)",
            ))
        }
        MaskingStrategy::PerturbRate { max_absolute, .. }
            if !max_absolute.is_finite() || *max_absolute < 0.0 =>
        {
            Err(MaskingError::invalid_policy(
                c,
                "max_absolute must be finite and non-negative",
            ))
        }
        MaskingStrategy::PerturbRate { min_scale, .. } if *min_scale > MAX_SCALE => Err(
            MaskingError::invalid_policy(c, format!("min_scale must be at most {MAX_SCALE}")),
        ),
        MaskingStrategy::ShiftDate { max_days } if *max_days > MAX_SHIFT_DAYS => Err(
            MaskingError::invalid_policy(c, format!("max_days must be at most {MAX_SHIFT_DAYS}")),
        ),
        _ => Ok(()),
    }
}

/// Registry of one policy per classification.
#[derive(Debug, Clone, Default)]
pub struct PolicyRegistry {
    policies: BTreeMap<FieldClassification, MaskingPolicy>,
}

impl PolicyRegistry {
    /// A registry with no policies. Must be filled before use.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The standard policy set for financial statements.
    pub fn standard() -> Self {
        use FieldClassification as C;
        use MaskingStrategy as S;

        let entries = [
            (C::Name, S::IdentitySubstitute { kind: IdentityKind::Name, fit_width: false }),
            (C::Address, S::IdentitySubstitute { kind: IdentityKind::Address, fit_width: false }),
            (C::AccountIdentifier, S::Tokenize { preserve_last_n: 4 }),
            (C::Ssn, S::Tokenize { preserve_last_n: 4 }),
            (C::NoteNumber, S::Tokenize { preserve_last_n: 4 }),
            (C::CustomerId, S::Tokenize { preserve_last_n: 4 }),
            (C::ReferenceNumber, S::KeyedReference { length: 8 }),
            (C::OfficerCode, S::ShapeToken { name_fallback: true }),
            (C::BranchCode, S::ShapeToken { name_fallback: false }),
            (C::MonetaryAmount, S::PerturbAmount { max_percent: 10.0 }),
            (C::InterestRate, S::PerturbRate { max_absolute: 0.5, min_scale: 2 }),
            (C::TransactionDate, S::ShiftDate { max_days: 30 }),
            (C::Description, S::GeneralizeCategory),
            (C::FreeText, S::ScrubEmbedded),
            (C::Passthrough, S::Passthrough),
        ];
        let policies = entries
            .into_iter()
            .map(|(classification, strategy)| {
                (
                    classification,
                    MaskingPolicy {
                        classification,
                        strategy,
                    },
                )
            })
            .collect();
        Self { policies }
    }

    /// Register or replace the policy for a classification.
    pub fn register(
        &mut self,
        classification: FieldClassification,
        strategy: MaskingStrategy,
    ) -> Result<(), MaskingError> {
        let policy = MaskingPolicy::new(classification, strategy)?;
        self.policies.insert(classification, policy);
        Ok(())
    }

    /// Builder-style [`PolicyRegistry::register`].
    pub fn with(
        mut self,
        classification: FieldClassification,
        strategy: MaskingStrategy,
    ) -> Result<Self, MaskingError> {
        self.register(classification, strategy)?;
        Ok(self)
    }

    /// The policy for a classification.
    ///
    /// # Errors
    ///
    /// `UnsupportedField` if none is registered.
    pub fn get(&self, classification: FieldClassification) -> Result<&MaskingPolicy, MaskingError> {
        self.policies
            .get(&classification)
            .ok_or(MaskingError::UnsupportedField(classification))
    }

    /// Fail with `UnsupportedField` for the first classification that has
    /// no policy, or `InvalidPolicy` when free-text scrubbing is registered
    /// but the `Ssn` policy is not `tokenize` or `keyed_reference`.
    pub fn ensure_complete(&self) -> Result<(), MaskingError> {
        if let Some(missing) = FieldClassification::all()
            .iter()
            .find(|c| !self.policies.contains_key(c))
        {
            return Err(MaskingError::UnsupportedField(*missing));
        }
        let scrubs = self
            .policies
            .values()
            .any(|p| p.strategy == MaskingStrategy::ScrubEmbedded);
        let ssn = self.get(FieldClassification::Ssn)?;
        if scrubs && self.embedded_ssn_strategy().is_none() {
            return Err(MaskingError::invalid_policy(
                ssn.classification,
                format!(
                    "embedded SSNs need a tokenize or keyed_reference policy, found {}",
                    ssn.strategy.name()
                ),
            ));
        }
        Ok(())
    }

    /// The `Ssn` strategy used for SSNs found inside free text, if it is a
    /// keyed identifier strategy.
    pub fn embedded_ssn_strategy(&self) -> Option<&MaskingStrategy> {
        let strategy = self.policies.get(&FieldClassification::Ssn)?.strategy();
        matches!(
            strategy,
            MaskingStrategy::Tokenize { .. } | MaskingStrategy::KeyedReference { .. }
        )
        .then_some(strategy)
    }

    /// Registered policies in classification order.
    pub fn iter(&self) -> impl Iterator<Item = &MaskingPolicy> {
        self.policies.values()
    }

    /// Number of registered policies.
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    /// True if no policy is registered.
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}
