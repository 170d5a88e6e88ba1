//! # Keyed Tokenizer — Format-Preserving Identifier Masking
//!
//! Replaces the digits of an identifier with keyed pseudorandom digits while
//! keeping its shape:
//!
//! ```text
//! raw      123-45-6789
//! template DDD-DD-DDDD
//! digits   123456789  ──HMAC stream──▶ 58210 + 6789
//! masked   582-10-6789
//! ```
//!
//! ## Security Invariant
//!
//! The output is a pure function of `(key, salt, digits)`. Only the digit
//! sequence feeds the MAC, so `"123-45-6789"` and `"123456789"` share their
//! digits after masking. The replaced prefix never equals the raw prefix;
//! the stream is drawn again when it does.

use thiserror::Error;

use shield_core::{FieldClassification, MaskingError};

use crate::prf::{keyed_digest, DigitStream, LETTER_RADIX};
use crate::secret::SecretKey;

/// Upper bound on prefix redraws. Each redraw repeats the raw prefix with
/// probability at most 1/10, so the bound is never reached in practice.
const MAX_PREFIX_DRAWS: usize = 32;

/// Longest keyed reference, in hex characters (one SHA-256 output).
pub const MAX_REFERENCE_LEN: usize = 64;

/// Salt-level tokenizer failure, before a classification is attached.
#[derive(Error, Debug)]
pub enum TokenizeError {
    /// The raw value is the empty string.
    #[error("value is empty")]
    Empty,

    /// Fewer digits than the preserved suffix plus one.
    #[error("value has {digits} digits, cannot preserve the last {preserve}")]
    TooFewDigits {
        /// ASCII digits in the raw value.
        digits: usize,
        /// Requested preserved suffix length.
        preserve: usize,
    },

    /// Every draw reproduced the raw prefix.
    #[error("digit stream did not yield a distinct prefix")]
    Exhausted,

    /// Key could not be used for HMAC.
    #[error(transparent)]
    Key(#[from] MaskingError),
}

impl TokenizeError {
    fn classify(self, classification: FieldClassification) -> MaskingError {
        match self {
            Self::Key(inner) => inner,
            other => MaskingError::invalid_input(classification, other.to_string()),
        }
    }
}

/// The separator layout of a raw identifier.
///
/// Every ASCII digit becomes a slot; every other character is kept as a
/// literal at its position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatTemplate {
    slots: Vec<Option<char>>,
    digits: Vec<u8>,
}

impl FormatTemplate {
    /// Split `raw` into its layout and digit sequence.
    pub fn parse(raw: &str) -> Self {
        let mut slots = Vec::with_capacity(raw.len());
        let mut digits = Vec::new();
        for ch in raw.chars() {
            if ch.is_ascii_digit() {
                slots.push(None);
                digits.push(ch as u8 - b'0');
            } else {
                slots.push(Some(ch));
            }
        }
        Self { slots, digits }
    }

    /// Digits of the raw value, most significant first.
    pub fn digits(&self) -> &[u8] {
        &self.digits
    }

    /// Number of digit slots.
    pub fn digit_count(&self) -> usize {
        self.digits.len()
    }

    /// Fill the digit slots with `digits` in order. Slots beyond the end of
    /// `digits` are dropped.
    pub fn render(&self, digits: &[u8]) -> String {
        let mut next = digits.iter();
        self.slots
            .iter()
            .filter_map(|slot| match slot {
                Some(literal) => Some(*literal),
                None => next.next().map(|d| char::from(b'0' + d)),
            })
            .collect()
    }
}

/// Tokenize `raw` under an explicit salt.
///
/// The first `digit_count - preserve_last_n` digits are drawn from the keyed
/// [`DigitStream`] over the raw digits; the last `preserve_last_n` digits are
/// copied through.
pub fn tokenize_with_salt(
    key: &SecretKey,
    salt: &[u8],
    raw: &str,
    preserve_last_n: usize,
) -> Result<String, TokenizeError> {
    if raw.is_empty() {
        return Err(TokenizeError::Empty);
    }
    let template = FormatTemplate::parse(raw);
    let digits = template.digits();
    if preserve_last_n >= digits.len() {
        return Err(TokenizeError::TooFewDigits {
            digits: digits.len(),
            preserve: preserve_last_n,
        });
    }

    let replaced = digits.len() - preserve_last_n;
    let input: Vec<u8> = digits.iter().map(|d| b'0' + d).collect();
    let mut stream = DigitStream::new(key, salt, &input)?;

    let mut prefix: Vec<u8> = Vec::with_capacity(digits.len());
    let mut draws = 0;
    loop {
        if draws == MAX_PREFIX_DRAWS {
            return Err(TokenizeError::Exhausted);
        }
        prefix.clear();
        prefix.extend(stream.by_ref().take(replaced));
        draws += 1;
        if prefix[..] != digits[..replaced] {
            break;
        }
    }
    prefix.extend_from_slice(&digits[replaced..]);
    Ok(template.render(&prefix))
}

/// Tokenize an identifier of the given classification.
///
/// # Errors
///
/// `InvalidInput` for an empty value, or when `preserve_last_n` is not
/// smaller than the number of digits in `raw`.
pub fn tokenize(
    key: &SecretKey,
    classification: FieldClassification,
    raw: &str,
    preserve_last_n: usize,
) -> Result<String, MaskingError> {
    tokenize_with_salt(key, classification.salt(), raw, preserve_last_n)
        .map_err(|e| e.classify(classification))
}

/// Replace every ASCII letter and digit of a short code with a keyed letter
/// or digit, keeping case and every other character in place.
///
/// `ABC123` becomes three letters and three digits, `042` three digits. The
/// keyed input is the upper-cased value, so case variants of one code share
/// their replacement letters. The output never equals the raw value.
///
/// # Errors
///
/// `InvalidInput` for an empty value or one with no ASCII letter or digit.
pub fn shape_token(
    key: &SecretKey,
    classification: FieldClassification,
    raw: &str,
) -> Result<String, MaskingError> {
    if raw.is_empty() {
        return Err(MaskingError::invalid_input(classification, "value is empty"));
    }
    if !raw.chars().any(|c| c.is_ascii_alphanumeric()) {
        return Err(MaskingError::invalid_input(
            classification,
            "value has no letters or digits",
        ));
    }
    let folded = raw.to_ascii_uppercase();
    let salt = classification.salt();
    let mut digits = DigitStream::new(key, salt, folded.as_bytes())?;
    let mut letters = DigitStream::with_radix(key, salt, folded.as_bytes(), LETTER_RADIX)?;

    for _ in 0..MAX_PREFIX_DRAWS {
        let masked: String = raw
            .chars()
            .map(|ch| match ch {
                '0'..='9' => digits.next().map_or(ch, |d| char::from(b'0' + d)),
                'A'..='Z' => letters.next().map_or(ch, |d| char::from(b'A' + d)),
                'a'..='z' => letters.next().map_or(ch, |d| char::from(b'a' + d)),
                other => other,
            })
            .collect();
        if !masked.eq_ignore_ascii_case(raw) {
            return Ok(masked);
        }
    }
    Err(TokenizeError::Exhausted.classify(classification))
}

/// Fixed-length uppercase hex reference derived from the keyed MAC of `raw`.
///
/// For values with no digit structure worth keeping, such as transaction
/// reference numbers.
pub fn keyed_reference(
    key: &SecretKey,
    classification: FieldClassification,
    raw: &str,
    length: usize,
) -> Result<String, MaskingError> {
    if raw.is_empty() {
        return Err(MaskingError::invalid_input(classification, "value is empty"));
    }
    if length == 0 || length > MAX_REFERENCE_LEN {
        return Err(MaskingError::invalid_policy(
            classification,
            format!("reference length must be within 1..={MAX_REFERENCE_LEN}, got {length}"),
        ));
    }
    let digest = keyed_digest(key, classification.salt(), &[b"reference", raw.as_bytes()])?;
    let mut encoded = hex::encode_upper(digest);
    encoded.truncate(length);
    Ok(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn key() -> SecretKey {
        SecretKey::from_bytes(b"tokenizer-test-key-0123456789".to_vec()).unwrap()
    }

    fn other_key() -> SecretKey {
        SecretKey::from_bytes(b"tokenizer-other-key-987654321".to_vec()).unwrap()
    }

    fn separators(s: &str) -> Vec<(usize, char)> {
        s.chars().enumerate().filter(|(_, c)| !c.is_ascii_digit()).collect()
    }

    // -- FormatTemplate --------------------------------------------------

    #[test]
    fn template_splits_digits_and_literals() {
        let t = FormatTemplate::parse("12-3 4");
        assert_eq!(t.digits(), &[1, 2, 3, 4]);
        assert_eq!(t.digit_count(), 4);
        assert_eq!(t.render(&[9, 8, 7, 6]), "98-7 6");
    }

    #[test]
    fn template_keeps_non_ascii_literals() {
        let t = FormatTemplate::parse("№12");
        assert_eq!(t.render(&[3, 4]), "№34");
    }

    // -- tokenize ----------------------------------------------------------

    #[test]
    fn ssn_scenario() {
        let k = key();
        let masked = tokenize(&k, FieldClassification::Ssn, "123-45-6789", 4).unwrap();
        assert_eq!(masked.len(), 11);
        assert_eq!(separators(&masked), vec![(3, '-'), (6, '-')]);
        assert!(masked.ends_with("6789"));
        let prefix: String = masked.chars().filter(|c| c.is_ascii_digit()).take(5).collect();
        assert_ne!(prefix, "12345");
        assert_eq!(masked, tokenize(&k, FieldClassification::Ssn, "123-45-6789", 4).unwrap());
    }

    #[test]
    fn separators_do_not_affect_digits() {
        let k = key();
        let dashed = tokenize(&k, FieldClassification::Ssn, "123-45-6789", 4).unwrap();
        let plain = tokenize(&k, FieldClassification::Ssn, "123456789", 4).unwrap();
        assert_eq!(dashed.replace('-', ""), plain);
    }

    #[test]
    fn classification_separates_domains() {
        let k = key();
        let account = tokenize(&k, FieldClassification::AccountIdentifier, "123456789", 4).unwrap();
        let ssn = tokenize(&k, FieldClassification::Ssn, "123456789", 4).unwrap();
        assert_ne!(account, ssn);
    }

    #[test]
    fn key_change_changes_tokens() {
        let a = tokenize(&key(), FieldClassification::AccountIdentifier, "1234567890", 4).unwrap();
        let b = tokenize(&other_key(), FieldClassification::AccountIdentifier, "1234567890", 4).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn empty_value_is_invalid() {
        match tokenize(&key(), FieldClassification::Ssn, "", 4) {
            Err(MaskingError::InvalidInput { classification, .. }) => {
                assert_eq!(classification, FieldClassification::Ssn)
            }
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn preserve_must_leave_a_digit() {
        let k = key();
        assert!(matches!(
            tokenize(&k, FieldClassification::NoteNumber, "1234", 4),
            Err(MaskingError::InvalidInput { .. })
        ));
        assert!(matches!(
            tokenize(&k, FieldClassification::NoteNumber, "ABC-DEF", 0),
            Err(MaskingError::InvalidInput { .. })
        ));
        assert!(tokenize(&k, FieldClassification::NoteNumber, "12345", 4).is_ok());
    }

    #[test]
    fn error_text_omits_raw_value() {
        let err = tokenize(&key(), FieldClassification::Ssn, "12-34", 4).unwrap_err();
        assert!(!format!("{err}").contains("12-34"));
    }

    #[test]
    fn single_replaced_digit_always_differs() {
        let k = key();
        for raw in 10_000..10_200u32 {
            let raw = raw.to_string();
            let masked = tokenize(&k, FieldClassification::NoteNumber, &raw, 4).unwrap();
            assert_ne!(masked[..1], raw[..1], "raw {raw}");
            assert_eq!(masked[1..], raw[1..]);
        }
    }

    #[test]
    fn preserve_zero_replaces_all_digits() {
        let masked = tokenize(&key(), FieldClassification::CustomerId, "C-000123", 0).unwrap();
        assert!(masked.starts_with("C-"));
        assert_eq!(masked.len(), 8);
        assert_ne!(masked, "C-000123");
    }

    // -- keyed_reference -------------------------------------------------

    #[test]
    fn keyed_reference_shape() {
        let k = key();
        let r = keyed_reference(&k, FieldClassification::ReferenceNumber, "REF-0042", 8).unwrap();
        assert_eq!(r.len(), 8);
        assert!(r.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
        assert_eq!(r, keyed_reference(&k, FieldClassification::ReferenceNumber, "REF-0042", 8).unwrap());
        let full = keyed_reference(&k, FieldClassification::ReferenceNumber, "REF-0042", 64).unwrap();
        assert!(full.starts_with(&r));
    }

    #[test]
    fn keyed_reference_bounds() {
        let k = key();
        assert!(matches!(
            keyed_reference(&k, FieldClassification::ReferenceNumber, "x", 0),
            Err(MaskingError::InvalidPolicy { .. })
        ));
        assert!(matches!(
            keyed_reference(&k, FieldClassification::ReferenceNumber, "x", 65),
            Err(MaskingError::InvalidPolicy { .. })
        ));
        assert!(matches!(
            keyed_reference(&k, FieldClassification::ReferenceNumber, "", 8),
            Err(MaskingError::InvalidInput { .. })
        ));
    }

    // -- shape_token -----------------------------------------------------

    fn shape(s: &str) -> String {
        s.chars()
            .map(|c| match c {
                '0'..='9' => '9',
                'A'..='Z' => 'A',
                'a'..='z' => 'a',
                other => other,
            })
            .collect()
    }

    #[test]
    fn officer_code_keeps_its_shape() {
        let k = key();
        let masked = shape_token(&k, FieldClassification::OfficerCode, "ABC123").unwrap();
        assert_eq!(shape(&masked), "AAA999");
        assert_ne!(masked, "ABC123");
        assert_eq!(masked, shape_token(&k, FieldClassification::OfficerCode, "ABC123").unwrap());
    }

    #[test]
    fn shape_token_keeps_case_and_literals() {
        let k = key();
        let masked = shape_token(&k, FieldClassification::BranchCode, "Br-07 x").unwrap();
        assert_eq!(shape(&masked), "Aa-99 a");
        let upper = shape_token(&k, FieldClassification::BranchCode, "BR-07 X").unwrap();
        assert!(masked.eq_ignore_ascii_case(&upper));
    }

    #[test]
    fn shape_token_differs_by_classification_and_key() {
        let a = shape_token(&key(), FieldClassification::BranchCode, "0042").unwrap();
        let b = shape_token(&key(), FieldClassification::OfficerCode, "0042").unwrap();
        let c = shape_token(&other_key(), FieldClassification::BranchCode, "0042").unwrap();
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn shape_token_rejects_values_without_symbols() {
        let k = key();
        for raw in ["", "--", " / "] {
            assert!(matches!(
                shape_token(&k, FieldClassification::BranchCode, raw),
                Err(MaskingError::InvalidInput { .. })
            ));
        }
    }

    #[test]
    fn single_digit_branch_always_changes() {
        let k = key();
        for d in 0..10u8 {
            let raw = char::from(b'0' + d).to_string();
            let masked = shape_token(&k, FieldClassification::BranchCode, &raw).unwrap();
            assert_eq!(masked.len(), 1);
            assert_ne!(masked, raw);
        }
    }

    // -- properties ------------------------------------------------------

    proptest! {
        #[test]
        fn tokenize_preserves_format(raw in "[0-9]{5,12}([- ][0-9]{1,6}){0,3}") {
            let k = key();
            let masked = tokenize(&k, FieldClassification::AccountIdentifier, &raw, 4).unwrap();
            prop_assert_eq!(masked.chars().count(), raw.chars().count());
            prop_assert_eq!(separators(&masked), separators(&raw));
            let raw_digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
            let masked_digits: String = masked.chars().filter(|c| c.is_ascii_digit()).collect();
            prop_assert_eq!(&masked_digits[masked_digits.len() - 4..], &raw_digits[raw_digits.len() - 4..]);
            prop_assert_ne!(&masked_digits[..masked_digits.len() - 4], &raw_digits[..raw_digits.len() - 4]);
        }

        #[test]
        fn tokenize_is_deterministic(raw in "[0-9]{6,16}") {
            let k = key();
            let a = tokenize(&k, FieldClassification::AccountIdentifier, &raw, 4).unwrap();
            let b = tokenize(&k, FieldClassification::AccountIdentifier, &raw, 4).unwrap();
            prop_assert_eq!(a, b);
        }
    }
}
