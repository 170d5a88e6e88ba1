//! # Column Catalog
//!
//! Maps dataset column names to field classifications. The engine never
//! guesses: a column the catalog does not label is an error, so a newly
//! added sensitive column cannot slip through unmasked.
//!
//! The standard catalog covers the loan and revolving-credit statement
//! tables the masking pipeline was built for. A catalog file extends or
//! replaces it:
//!
//! ```yaml
//! include_standard: true
//! columns:
//!   Record_Type: passthrough
//!   Borrower_Memo: free_text
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use shield_core::FieldClassification;

/// Catalog lookup and loading errors.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// A dataset column has no classification.
    #[error("column {column:?} in table {table:?} has no classification; add it to the catalog")]
    UnlabelledColumn {
        /// Table containing the column.
        table: String,
        /// Column name.
        column: String,
    },

    /// The catalog file could not be read.
    #[error("cannot read catalog {path}: {source}")]
    Io {
        /// File path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The catalog file is malformed.
    #[error("cannot parse catalog {path}: {reason}")]
    Parse {
        /// File path.
        path: String,
        /// Parser message.
        reason: String,
    },
}

/// Column name to classification mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnCatalog {
    columns: BTreeMap<String, FieldClassification>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    #[serde(default = "default_include_standard")]
    include_standard: bool,
    #[serde(default)]
    columns: BTreeMap<String, FieldClassification>,
}

fn default_include_standard() -> bool {
    true
}

const STANDARD_COLUMNS: &[(FieldClassification, &[&str])] = &[
    (
        FieldClassification::Name,
        &[
            "Customer_Name_1",
            "Customer_Name_2",
            "Customer_Name_3",
            "Customer_Name_4",
            "Customer_Name_5",
            "County_Name",
            "Acct_Name",
        ],
    ),
    (
        FieldClassification::Address,
        &["Address_Street", "Address_CityStateZip", "County_Address", "Property_At"],
    ),
    (FieldClassification::AccountIdentifier, &["Account_Number", "Account"]),
    (FieldClassification::NoteNumber, &["Note_Number", "Note", "Hist_Note"]),
    (FieldClassification::CustomerId, &["Customer_ID", "Customer_Number"]),
    (FieldClassification::Ssn, &["SSN", "Social_Security_Number", "Customer_SSN"]),
    (FieldClassification::ReferenceNumber, &["Ref_No"]),
    (FieldClassification::OfficerCode, &["Officer"]),
    (FieldClassification::BranchCode, &["Branch_Number", "Branch"]),
    (
        FieldClassification::MonetaryAmount,
        &[
            "Current_Balance",
            "Amount_Due",
            "Amount",
            "Principal",
            "Interest",
            "LateFees_Others",
            "Escrow",
            "Insurance",
            "YTD_Interest_Paid",
            "YTD_Escrow_Interest_Paid",
            "YTD_Unapplied_Funds",
            "YTD_Escrow_Balance",
            "YTD_Taxes_Disbursed",
            "New_Statement_Balance",
            "Fees_Charged_Unpaid_top",
            "Past_Due_Amount_top",
            "Minimum_Payment_Due_top",
            "Available_Credit",
            "Fees_Charged_Unpaid",
            "Current_Amount_Due",
            "Past_Due_Amount",
            "Minimum_Payment_Due",
            "Period_Fees_Total",
            "Period_Interest_Total",
            "YTD_Fees",
            "YTD_Interest",
            "Total_Interest_Charges_Paid_YTD",
            "Previous_Statement_Balance",
            "Advances_Debits",
            "Payments_Credits",
            "Interest_Charge",
            "Other_Charges",
            "Current_Statement_Balance",
            "Advances_Debits_or_IntCharge",
            "Balance_Subject_to_IntRate",
            "Late_Fees",
            "Total_Due",
        ],
    ),
    (
        FieldClassification::TransactionDate,
        &[
            "Statement_Date",
            "Payment_Due_Date",
            "Header_Date",
            "Posting_Date",
            "Effective_Date",
            "Maturity_Date",
            "Trans_Date",
            "Post_Date",
            "Notice_Date",
            "Issue_Date",
            "Due_Date",
            "Date_of_RateChange",
        ],
    ),
    (FieldClassification::InterestRate, &["Interest_Rate", "Previous_Rate", "Current_Rate"]),
    (
        FieldClassification::Description,
        &["Description", "Transaction_Description", "Notice_Comment"],
    ),
];

impl ColumnCatalog {
    /// A catalog with no columns.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The statement-table column lists.
    pub fn standard() -> Self {
        let columns = STANDARD_COLUMNS
            .iter()
            .flat_map(|(c, names)| names.iter().map(move |n| (n.to_string(), *c)))
            .collect();
        Self { columns }
    }

    /// Read a catalog file.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path).map_err(|e| CatalogError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_yaml_str(&text, &path.display().to_string())
    }

    /// Parse a catalog document. `origin` names it in errors.
    pub fn from_yaml_str(text: &str, origin: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_yaml::from_str(text).map_err(|e| CatalogError::Parse {
            path: origin.to_string(),
            reason: e.to_string(),
        })?;
        let mut catalog = if file.include_standard {
            Self::standard()
        } else {
            Self::empty()
        };
        catalog.columns.extend(file.columns);
        Ok(catalog)
    }

    /// Label a column, replacing any previous label.
    pub fn with(mut self, column: impl Into<String>, classification: FieldClassification) -> Self {
        self.columns.insert(column.into(), classification);
        self
    }

    /// Classification of `column` in `table`.
    pub fn classify(&self, table: &str, column: &str) -> Result<FieldClassification, CatalogError> {
        self.columns
            .get(column)
            .copied()
            .ok_or_else(|| CatalogError::UnlabelledColumn {
                table: table.to_string(),
                column: column.to_string(),
            })
    }

    /// Number of labelled columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// True if no column is labelled.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
