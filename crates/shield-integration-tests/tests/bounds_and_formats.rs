//! # Bounds and Format Preservation
//!
//! Masked values must keep the shape of their source (length, separators,
//! preserved suffix, date layout, decimal scale) and stay within the
//! configured perturbation bounds.

use std::sync::Arc;

use chrono::NaiveDate;
use shield_core::{FieldClassification as C, MaskingError, RecordSet, Row, Table};
use shield_crypto::SecretKey;
use shield_mask::{MaskingContext, MaskingOrchestrator, MaskingStrategy, PolicyRegistry};

fn context() -> MaskingContext {
    let key = SecretKey::from_bytes(b"integration-bounds-key-0123456789".to_vec()).unwrap();
    MaskingContext::new(Arc::new(key), Arc::new(PolicyRegistry::standard())).unwrap()
}

#[test]
fn ssn_scenario() {
    let ctx = context();
    let masked = ctx.mask_field(C::Ssn, "123-45-6789").unwrap();
    let bytes = masked.as_bytes();
    assert_eq!(masked.len(), 11);
    assert_eq!(bytes[3], b'-');
    assert_eq!(bytes[6], b'-');
    assert!(masked.ends_with("6789"));
    assert_ne!(&masked[..6], "123-45");
    assert!(masked
        .chars()
        .enumerate()
        .all(|(i, c)| if i == 3 || i == 6 { c == '-' } else { c.is_ascii_digit() }));
    assert_eq!(ctx.mask_field(C::Ssn, "123-45-6789").unwrap(), masked);
}

#[test]
fn amounts_stay_within_ten_percent() {
    let ctx = context();
    for raw in ["1234.56", "0.99", "-250.00", "1000000.00", "7"] {
        let value: f64 = raw.parse().unwrap();
        let scale = raw.split('.').nth(1).map_or(0, str::len);
        for _ in 0..500 {
            let masked = ctx.mask_field(C::MonetaryAmount, raw).unwrap();
            assert_eq!(masked.split('.').nth(1).map_or(0, str::len), scale, "{masked}");
            let out: f64 = masked.parse().unwrap();
            assert!(
                (out - value).abs() <= value.abs() * 0.1 + 1e-9,
                "{raw} -> {masked}"
            );
            assert_eq!(out < 0.0, value < 0.0, "{raw} -> {masked}");
        }
    }
}

#[test]
fn rates_stay_within_half_a_point() {
    let ctx = context();
    for _ in 0..500 {
        let out: f64 = ctx.mask_field(C::InterestRate, "4.125").unwrap().parse().unwrap();
        assert!((out - 4.125).abs() <= 0.5 + 1e-9, "{out}");
        let low: f64 = ctx.mask_field(C::InterestRate, "0.10").unwrap().parse().unwrap();
        assert!(low >= 0.0, "{low}");
    }
}

#[test]
fn dates_stay_within_thirty_days_and_keep_layout() {
    let ctx = context();
    let cases = [
        ("03/15/2024", "%m/%d/%Y"),
        ("03/15/24", "%m/%d/%y"),
        ("2024-03-15", "%Y-%m-%d"),
        ("Mar 15, 2024", "%b %d, %Y"),
    ];
    for (raw, layout) in cases {
        let original = NaiveDate::parse_from_str(raw, layout).unwrap();
        for _ in 0..200 {
            let masked = ctx.mask_field(C::TransactionDate, raw).unwrap();
            let shifted = NaiveDate::parse_from_str(&masked, layout)
                .unwrap_or_else(|e| panic!("{masked} not in {layout}: {e}"));
            assert!((shifted - original).num_days().abs() <= 30, "{raw} -> {masked}");
            assert_eq!(masked.len(), raw.len());
        }
    }
    assert_eq!(ctx.mask_field(C::TransactionDate, "00/00/00").unwrap(), "00/00/00");
}

#[test]
fn embedded_ssns_match_ssn_columns() {
    let input = RecordSet::new()
        .with_table(Table::new("customers").with_row(
            Row::new()
                .with("SSN", C::Ssn, "123-45-6789")
                .with("Notes", C::FreeText, "Called re SSN 123-45-6789; also 987654321."),
        ))
        .with_table(Table::new("other").with_row(Row::new().with("SSN", C::Ssn, "987654321")));

    let ctx = context();
    let output = MaskingOrchestrator::new()
        .mask_record_set(&input, &ctx)
        .unwrap()
        .records;

    let ssn_a = output.tables[0].rows[0].value("SSN").unwrap();
    let ssn_b = output.tables[1].rows[0].value("SSN").unwrap();
    let notes = output.tables[0].rows[0].value("Notes").unwrap();
    assert_eq!(notes, format!("Called re SSN {ssn_a}; also {ssn_b}."));
    assert!(!notes.contains("123-45-6789"));
}

#[test]
fn free_text_before_ssn_column_keeps_the_ssn_suffix() {
    let registry = PolicyRegistry::standard()
        .with(C::Ssn, MaskingStrategy::Tokenize { preserve_last_n: 4 })
        .unwrap();
    let key = SecretKey::from_bytes(b"integration-bounds-key-0123456789".to_vec()).unwrap();
    let ctx = MaskingContext::new(Arc::new(key), Arc::new(registry)).unwrap();
    let input = RecordSet::new().with_table(
        Table::new("customer_notes").with_row(
            Row::new()
                .with("Comment", C::FreeText, "SSN 123-45-6789")
                .with("SSN", C::Ssn, "123-45-6789"),
        ),
    );
    let output = MaskingOrchestrator::new()
        .mask_record_set(&input, &ctx)
        .unwrap()
        .records;
    let row = &output.tables[0].rows[0];
    let ssn = row.value("SSN").unwrap();
    assert!(ssn.ends_with("-6789"), "{ssn}");
    assert_eq!(row.value("Comment").unwrap(), format!("SSN {ssn}"));
}

#[test]
fn officer_codes_keep_their_shape() {
    let ctx = context();
    let masked = ctx.mask_field(C::OfficerCode, "ABC123").unwrap();
    assert_ne!(masked, "ABC123");
    assert!(masked[..3].bytes().all(|b| b.is_ascii_uppercase()), "{masked}");
    assert!(masked[3..].bytes().all(|b| b.is_ascii_digit()), "{masked}");
}

#[test]
fn padded_dates_keep_their_width() {
    let ctx = context();
    for raw in ["03/15/2024  ", "  2024-03-15"] {
        let masked = ctx.mask_field(C::TransactionDate, raw).unwrap();
        assert_eq!(masked.len(), raw.len(), "{raw:?} -> {masked:?}");
        assert_eq!(masked.starts_with(' '), raw.starts_with(' '));
        assert_eq!(masked.ends_with(' '), raw.ends_with(' '));
    }
}

#[test]
fn unsafe_policies_are_rejected_at_registration() {
    for c in [C::Ssn, C::AccountIdentifier, C::Name, C::Address, C::BranchCode] {
        assert!(matches!(
            PolicyRegistry::standard().with(c, MaskingStrategy::Passthrough),
            Err(MaskingError::InvalidPolicy { .. })
        ));
    }
    assert!(PolicyRegistry::standard()
        .with(C::TransactionDate, MaskingStrategy::ShiftDate { max_days: 4_000 })
        .is_err());

    // Free-text scrubbing masks with the Ssn policy, which must be keyed.
    let registry = PolicyRegistry::standard()
        .with(C::Ssn, MaskingStrategy::ShiftDate { max_days: 1 })
        .unwrap();
    let key = SecretKey::from_bytes(b"integration-bounds-key-0123456789".to_vec()).unwrap();
    assert!(matches!(
        MaskingContext::new(Arc::new(key), Arc::new(registry)),
        Err(MaskingError::InvalidPolicy { .. })
    ));
}

#[test]
fn failures_name_the_field_but_not_the_value() {
    let input = RecordSet::new().with_table(
        Table::new("loan_bill_summary")
            .with_row(Row::new().with("Current_Balance", C::MonetaryAmount, "12.00"))
            .with_row(Row::new().with("Current_Balance", C::MonetaryAmount, "12,00 EUR")),
    );
    let err = MaskingOrchestrator::new()
        .with_workers(2)
        .mask_record_set(&input, &context())
        .unwrap_err();
    let text = err.to_string();
    assert!(text.contains("loan_bill_summary"), "{text}");
    assert!(text.contains("Current_Balance"), "{text}");
    assert!(!text.contains("12,00"), "{text}");
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn any_amount_stays_in_band(cents in -10_000_000_000i64..10_000_000_000i64) {
            let ctx = context();
            let raw = format!("{}{}.{:02}", if cents < 0 { "-" } else { "" }, cents.abs() / 100, cents.abs() % 100);
            let masked = ctx.mask_field(C::MonetaryAmount, &raw).unwrap();
            let (whole, frac) = masked.split_once('.').unwrap();
            prop_assert_eq!(frac.len(), 2);
            let sign = if whole.starts_with('-') { -1 } else { 1 };
            let out = sign * (whole.trim_start_matches('-').parse::<i64>().unwrap() * 100 + frac.parse::<i64>().unwrap());
            prop_assert!((out - cents).abs() <= cents.abs() / 10);
        }

        #[test]
        fn any_account_keeps_shape(digits in "[0-9]{5,16}") {
            let ctx = context();
            let masked = ctx.mask_field(C::AccountIdentifier, &digits).unwrap();
            prop_assert_eq!(masked.len(), digits.len());
            prop_assert_eq!(&masked[digits.len() - 4..], &digits[digits.len() - 4..]);
            prop_assert_ne!(&masked[..digits.len() - 4], &digits[..digits.len() - 4]);
        }
    }
}
