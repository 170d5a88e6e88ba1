//! # Error Types — Structured Masking Error Hierarchy
//!
//! All errors use `thiserror` for derive-based `Display` and `Error`
//! implementations.
//!
//! ## Design
//!
//! - Every failure is fatal for the batch. The engine performs no retries
//!   and produces no partial output.
//! - Error text describes classification, location and shape only. Raw
//!   values and key material never appear in a message.
//! - Orchestrated failures are wrapped in [`MaskingError::AtField`] so the
//!   caller learns which table, row and column aborted the run.

use thiserror::Error;

use crate::classification::FieldClassification;

/// Top-level error type for the masking engine.
#[derive(Error, Debug)]
pub enum MaskingError {
    /// Secret key absent or empty.
    #[error("secret key unavailable: {0}")]
    MissingKey(String),

    /// Secret key present but unusable (too short, placeholder, malformed).
    #[error("secret key rejected: {0}")]
    RejectedKey(String),

    /// A replay mapping table was produced under a different key.
    #[error("mapping table was produced under key {found}, active key is {expected}")]
    KeyMismatch {
        /// Fingerprint of the active key.
        expected: String,
        /// Fingerprint recorded in the mapping table.
        found: String,
    },

    /// A raw value is malformed for its classification.
    #[error("invalid input for {classification}: {reason}")]
    InvalidInput {
        /// Classification of the rejected field.
        classification: FieldClassification,
        /// Shape-only description of the problem.
        reason: String,
    },

    /// No masking policy is registered for the classification.
    #[error("no masking policy registered for {0}")]
    UnsupportedField(FieldClassification),

    /// A classification label could not be parsed.
    #[error("unknown field classification {0:?}")]
    UnknownClassification(String),

    /// A policy's parameters are out of bounds or unsafe.
    #[error("invalid masking policy for {classification}: {reason}")]
    InvalidPolicy {
        /// Classification the policy was registered for.
        classification: FieldClassification,
        /// Why the policy was rejected.
        reason: String,
    },

    /// Two different masked values were recorded for one raw identity.
    #[error("inconsistent cache entry for {classification}: {detail}")]
    ConcurrencyViolation {
        /// Classification of the conflicting entry.
        classification: FieldClassification,
        /// Shape-only description of the conflict.
        detail: String,
    },

    /// Two distinct raw identifiers produced the same masked value.
    #[error("token collision for {classification}: two distinct raw values share one masked value")]
    TokenCollision {
        /// Classification of the colliding identifiers.
        classification: FieldClassification,
    },

    /// A failure at a specific field of a record set.
    #[error("{location}: {source}")]
    AtField {
        /// Where the failure happened.
        location: FieldLocation,
        /// The underlying failure.
        #[source]
        source: Box<MaskingError>,
    },
}

impl MaskingError {
    /// Shorthand for [`MaskingError::InvalidInput`].
    pub fn invalid_input(classification: FieldClassification, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            classification,
            reason: reason.into(),
        }
    }

    /// Shorthand for [`MaskingError::InvalidPolicy`].
    pub fn invalid_policy(classification: FieldClassification, reason: impl Into<String>) -> Self {
        Self::InvalidPolicy {
            classification,
            reason: reason.into(),
        }
    }

    /// Attach a record-set location. Already-located errors are returned
    /// unchanged.
    pub fn at(self, location: FieldLocation) -> Self {
        match self {
            Self::AtField { .. } => self,
            other => Self::AtField {
                location,
                source: Box::new(other),
            },
        }
    }

    /// The underlying error with any location wrapper removed.
    pub fn root(&self) -> &MaskingError {
        match self {
            Self::AtField { source, .. } => source.root(),
            other => other,
        }
    }

    /// The location of the failure, if the error came from a record set.
    pub fn location(&self) -> Option<&FieldLocation> {
        match self {
            Self::AtField { location, .. } => Some(location),
            _ => None,
        }
    }
}

/// Position of a field inside a record set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldLocation {
    /// Table name.
    pub table: String,
    /// Zero-based row index within the table.
    pub row: usize,
    /// Column name.
    pub column: String,
}

impl FieldLocation {
    /// Build a location from its parts.
    pub fn new(table: impl Into<String>, row: usize, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            row,
            column: column.into(),
        }
    }

    /// A location for a field masked outside any record set.
    pub fn detached() -> Self {
        Self::default()
    }
}

impl std::fmt::Display for FieldLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}].{}", self.table, self.row, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_display_names_classification() {
        let err = MaskingError::invalid_input(FieldClassification::Ssn, "value is empty");
        let msg = format!("{err}");
        assert!(msg.contains("ssn"));
        assert!(msg.contains("value is empty"));
    }

    #[test]
    fn at_wraps_once() {
        let loc = FieldLocation::new("loan_bill_header", 3, "Account_Number");
        let err = MaskingError::UnsupportedField(FieldClassification::Name)
            .at(loc.clone())
            .at(FieldLocation::new("other", 0, "x"));
        assert_eq!(err.location(), Some(&loc));
        assert!(matches!(
            err.root(),
            MaskingError::UnsupportedField(FieldClassification::Name)
        ));
        assert_eq!(
            format!("{err}"),
            "loan_bill_header[3].Account_Number: no masking policy registered for name"
        );
    }

    #[test]
    fn root_of_unlocated_error_is_itself() {
        let err = MaskingError::MissingKey("SHIELD_PSEUDO_KEY not set".to_string());
        assert!(matches!(err.root(), MaskingError::MissingKey(_)));
        assert!(err.location().is_none());
    }

    #[test]
    fn source_chain_is_exposed() {
        use std::error::Error as _;
        let err = MaskingError::TokenCollision {
            classification: FieldClassification::AccountIdentifier,
        }
        .at(FieldLocation::new("t", 0, "c"));
        let source = err.source().expect("AtField has a source");
        assert!(format!("{source}").contains("account_identifier"));
    }

    #[test]
    fn key_mismatch_display_shows_both_fingerprints() {
        let err = MaskingError::KeyMismatch {
            expected: "aaaa".to_string(),
            found: "bbbb".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("aaaa") && msg.contains("bbbb"));
    }

    #[test]
    fn detached_location_is_default() {
        assert_eq!(FieldLocation::detached(), FieldLocation::default());
        assert_eq!(format!("{}", FieldLocation::detached()), "[0].");
    }
}
