//! # Dataset Pipeline
//!
//! End-to-end flow used by the `shield mask` command: a columnar dataset
//! labelled by the standard catalog, masked across several statement
//! tables, and written back in the same layout.

use std::collections::BTreeMap;
use std::sync::Arc;

use shield_cli::catalog::ColumnCatalog;
use shield_cli::dataset::Dataset;
use shield_crypto::SecretKey;
use shield_mask::{MaskingContext, MaskingOrchestrator, PolicyRegistry};

const SNAPSHOT: &str = r#"{
  "tables": [
    {
      "name": "loan_bill_header",
      "columns": ["Account_Number", "Note_Number", "Customer_Name_1", "Customer_Name_2",
                  "Address_Street", "Address_CityStateZip", "SSN", "Branch_Number", "Statement_Date"],
      "rows": [
        ["1234567890", "1000200301", "JANE Q DOE", "JOHN DOE", "123 MAIN ST", "SPRINGFIELD, IL 62701",
         "123-45-6789", "042", "03/15/2024"],
        ["9999999999", "1000200302", "ACME HOLDINGS LLC", null, "9 ELM AVE APT 4", "DENVER, CO 80202-1234",
         "987-65-4321", "042", "00/00/00"]
      ]
    },
    {
      "name": "loan_bill_history",
      "columns": ["Account_Number", "Hist_Note", "Trans_Date", "Amount", "Description"],
      "rows": [
        ["1234567890", "1000200301", "03/01/2024", "250.00", "PAYMENT RECEIVED"],
        ["1234567890", "1000200301", "03/05/2024", "35.00", "LATE FEE"],
        ["9999999999", "1000200302", "03/07/2024", "1000.00", "WIRE TRANSFER IN"]
      ]
    },
    {
      "name": "adviceOfRateChange",
      "columns": ["Account_Number", "Previous_Rate", "Current_Rate", "Date_of_RateChange"],
      "rows": [["9999999999", "6.25", "6.50", "2024-04-01"]]
    }
  ]
}"#;

fn context() -> MaskingContext {
    let key = SecretKey::from_bytes(b"integration-pipeline-key-01234567".to_vec()).unwrap();
    MaskingContext::new(Arc::new(key), Arc::new(PolicyRegistry::standard())).unwrap()
}

#[test]
fn snapshot_masks_end_to_end() {
    let dataset = Dataset::from_json_str(SNAPSHOT, "<snapshot>").unwrap();
    let records = dataset.to_record_set(&ColumnCatalog::standard()).unwrap();
    let outcome = MaskingOrchestrator::new()
        .with_workers(3)
        .mask_record_set(&records, &context())
        .unwrap();
    let masked = dataset.with_values_from(&outcome.records);

    assert_eq!(masked.tables.len(), dataset.tables.len());
    for (src, out) in dataset.tables.iter().zip(&masked.tables) {
        assert_eq!(src.name, out.name);
        assert_eq!(src.columns, out.columns);
        assert_eq!(src.rows.len(), out.rows.len());
    }

    // Account numbers join across all three tables.
    let mut accounts = BTreeMap::new();
    for (src, out) in dataset.tables.iter().zip(&masked.tables) {
        for (a, b) in src.rows.iter().zip(&out.rows) {
            let raw = a[0].clone().unwrap();
            let tok = b[0].clone().unwrap();
            assert_ne!(raw, tok);
            assert_eq!(accounts.entry(raw).or_insert_with(|| tok.clone()), &tok);
        }
    }
    assert_eq!(accounts.len(), 2);

    let header = &masked.tables[0];
    // NULL and sentinel values survive.
    assert_eq!(header.rows[1][3], None);
    assert_eq!(header.rows[1][8].as_deref(), Some("00/00/00"));
    // Branch numbers are replaced digit for digit, consistently.
    let branch = header.rows[0][7].as_deref().unwrap();
    assert_ne!(branch, "042");
    assert!(branch.len() == 3 && branch.bytes().all(|b| b.is_ascii_digit()), "{branch}");
    assert_eq!(header.rows[1][7].as_deref(), Some(branch));
    // Sensitive text is gone.
    let text = masked.to_json_string().unwrap();
    for secret in ["JANE Q DOE", "123-45-6789", "ACME HOLDINGS", "1234567890"] {
        assert!(!text.contains(secret), "{secret} leaked");
    }
    assert_ne!(header.rows[0][4].as_deref(), Some("123 MAIN ST"));
    // ZIP+4 and SSN keep their shape.
    let city_line = header.rows[1][5].as_deref().unwrap();
    let (_, plus4) = city_line.rsplit_once('-').unwrap();
    assert!(plus4.len() == 4 && plus4.bytes().all(|b| b.is_ascii_digit()), "{city_line}");
    assert!(header.rows[0][6].as_deref().unwrap().ends_with("-6789"));

    let history = &masked.tables[1];
    let descriptions: Vec<_> = history.rows.iter().map(|r| r[4].as_deref().unwrap()).collect();
    assert_eq!(descriptions, ["Payment Transaction", "Fee Assessment", "Fund Transfer"]);

    assert_eq!(outcome.report.total_rows(), 6);
    assert_eq!(outcome.report.total_nulls(), 1);
}
