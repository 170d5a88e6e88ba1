//! # Field Classification — Single Source of Truth
//!
//! Defines the `FieldClassification` enum: the semantic label the Extractor
//! or Store assigns to every column before it reaches the engine. The engine
//! never infers a classification from the data.
//!
//! ## Security Invariant
//!
//! A closed enum with exhaustive `match` means an unclassified field cannot
//! fall through to a pass-through default. Each classification also owns a
//! fixed domain-separation salt, so an SSN and an account number with equal
//! digit strings never tokenize to the same value.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::MaskingError;

/// Semantic classification of a field value.
///
/// | Classification | Typical columns |
/// |----------------|-----------------|
/// | Name | customer, county and account names |
/// | Address | street, city/state/zip, property lines |
/// | AccountIdentifier | account numbers |
/// | Ssn | social security numbers |
/// | NoteNumber | loan note numbers |
/// | CustomerId | customer IDs and customer numbers |
/// | ReferenceNumber | transaction reference numbers |
/// | OfficerCode | loan officer codes or names |
/// | BranchCode | branch numbers and codes |
/// | MonetaryAmount | balances, payments, fees |
/// | InterestRate | current / previous rates |
/// | TransactionDate | statement, posting, due dates |
/// | Description | transaction descriptions |
/// | FreeText | comments that may embed identifiers |
/// | Passthrough | non-sensitive fields |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldClassification {
    /// Person, company or county name.
    Name,
    /// Postal address, any line shape.
    Address,
    /// Account number.
    AccountIdentifier,
    /// Social security number.
    Ssn,
    /// Loan note number.
    NoteNumber,
    /// Customer ID or customer number.
    CustomerId,
    /// Reference number.
    ReferenceNumber,
    /// Loan officer code such as `ABC123`, or the officer's name.
    OfficerCode,
    /// Branch number or code.
    BranchCode,
    /// Monetary amount in canonical decimal form.
    MonetaryAmount,
    /// Interest rate in canonical decimal form.
    InterestRate,
    /// Calendar date.
    TransactionDate,
    /// Free-text transaction description.
    Description,
    /// Free text that may embed SSN-like numbers.
    FreeText,
    /// Non-sensitive value.
    Passthrough,
}

/// Total number of classifications. Used for completeness assertions.
pub const FIELD_CLASSIFICATION_COUNT: usize = 15;

impl FieldClassification {
    /// Returns every classification in canonical order.
    pub fn all() -> &'static [FieldClassification] {
        &[
            Self::Name,
            Self::Address,
            Self::AccountIdentifier,
            Self::Ssn,
            Self::NoteNumber,
            Self::CustomerId,
            Self::ReferenceNumber,
            Self::OfficerCode,
            Self::BranchCode,
            Self::MonetaryAmount,
            Self::InterestRate,
            Self::TransactionDate,
            Self::Description,
            Self::FreeText,
            Self::Passthrough,
        ]
    }

    /// Returns the snake_case identifier, matching the serde form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Address => "address",
            Self::AccountIdentifier => "account_identifier",
            Self::Ssn => "ssn",
            Self::NoteNumber => "note_number",
            Self::CustomerId => "customer_id",
            Self::ReferenceNumber => "reference_number",
            Self::OfficerCode => "officer_code",
            Self::BranchCode => "branch_code",
            Self::MonetaryAmount => "monetary_amount",
            Self::InterestRate => "interest_rate",
            Self::TransactionDate => "transaction_date",
            Self::Description => "description",
            Self::FreeText => "free_text",
            Self::Passthrough => "passthrough",
        }
    }

    /// Domain-separation salt mixed into every keyed hash for this
    /// classification.
    ///
    /// These constants are part of the masking output contract: changing one
    /// changes every masked value of that classification.
    pub fn salt(&self) -> &'static [u8] {
        match self {
            Self::Name => b"shield/v1/name",
            Self::Address => b"shield/v1/address",
            Self::AccountIdentifier => b"shield/v1/account_identifier",
            Self::Ssn => b"shield/v1/ssn",
            Self::NoteNumber => b"shield/v1/note_number",
            Self::CustomerId => b"shield/v1/customer_id",
            Self::ReferenceNumber => b"shield/v1/reference_number",
            Self::OfficerCode => b"shield/v1/officer_code",
            Self::BranchCode => b"shield/v1/branch_code",
            Self::MonetaryAmount => b"shield/v1/monetary_amount",
            Self::InterestRate => b"shield/v1/interest_rate",
            Self::TransactionDate => b"shield/v1/transaction_date",
            Self::Description => b"shield/v1/description",
            Self::FreeText => b"shield/v1/free_text",
            Self::Passthrough => b"shield/v1/passthrough",
        }
    }

    /// True for classifications whose values identify a person or account
    /// and therefore must never be configured as pass-through.
    pub fn is_sensitive(&self) -> bool {
        matches!(
            self,
            Self::Name
                | Self::Address
                | Self::AccountIdentifier
                | Self::Ssn
                | Self::NoteNumber
                | Self::CustomerId
                | Self::ReferenceNumber
                | Self::OfficerCode
                | Self::BranchCode
        )
    }

    /// True for join-key classifications whose masked values must stay
    /// unique per raw value within a run.
    pub fn is_identifier(&self) -> bool {
        matches!(
            self,
            Self::AccountIdentifier
                | Self::Ssn
                | Self::NoteNumber
                | Self::CustomerId
                | Self::ReferenceNumber
        )
    }
}

impl std::fmt::Display for FieldClassification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldClassification {
    type Err = MaskingError;

    /// Parse a classification from its snake_case identifier.
    ///
    /// Accepts exactly the identifiers produced by
    /// [`FieldClassification::as_str()`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| MaskingError::UnknownClassification(s.to_string()))
    }
}
