//! # Columnar Dataset Files
//!
//! The CLI's interchange format for table snapshots:
//!
//! ```json
//! { "tables": [ { "name": "loan_bill_header",
//!                 "columns": ["Account_Number", "SSN"],
//!                 "rows": [["1234567890", "123-45-6789"], ["5555000011", null]] } ] }
//! ```
//!
//! Values are strings or `null`. Column order is explicit and preserved.
//!
//! ## Security Invariant
//!
//! Dataset files hold raw values, so parse errors report only the line and
//! column of the problem, never the parser's message (which can quote the
//! offending value).

use std::path::Path;

use serde::{Deserialize, Serialize};

use shield_core::{Cell, RecordSet, Row, Table};

use crate::catalog::{CatalogError, ColumnCatalog};

/// Dataset loading and conversion errors.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// The file could not be read or written.
    #[error("cannot access {path}: {source}")]
    Io {
        /// File path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not a valid dataset document.
    #[error("malformed dataset {path}: {category} error at line {line}, column {column}")]
    Parse {
        /// File path.
        path: String,
        /// serde_json error category.
        category: String,
        /// One-based line.
        line: usize,
        /// One-based column.
        column: usize,
    },

    /// A row's width differs from the table's column list.
    #[error("table {table:?} row {row} has {found} values, expected {expected}")]
    RowWidth {
        /// Table name.
        table: String,
        /// Zero-based row index.
        row: usize,
        /// Number of columns declared.
        expected: usize,
        /// Number of values present.
        found: usize,
    },

    /// A column could not be classified.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// The dataset could not be serialized.
    #[error("cannot serialize dataset: {0}")]
    Serialize(String),
}

/// A set of columnar tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Dataset {
    /// Tables in file order.
    pub tables: Vec<DatasetTable>,
}

/// One columnar table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatasetTable {
    /// Table name.
    pub name: String,
    /// Column names in order.
    pub columns: Vec<String>,
    /// Row values, one entry per column.
    pub rows: Vec<Vec<Option<String>>>,
}

impl Dataset {
    /// Read a dataset file.
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let text = std::fs::read_to_string(path).map_err(|e| DatasetError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_json_str(&text, &path.display().to_string())
    }

    /// Parse a dataset document. `origin` names it in errors.
    pub fn from_json_str(text: &str, origin: &str) -> Result<Self, DatasetError> {
        serde_json::from_str(text).map_err(|e| DatasetError::Parse {
            path: origin.to_string(),
            category: format!("{:?}", e.classify()).to_lowercase(),
            line: e.line(),
            column: e.column(),
        })
    }

    /// Serialize as pretty JSON.
    pub fn to_json_string(&self) -> Result<String, DatasetError> {
        serde_json::to_string_pretty(self).map_err(|e| DatasetError::Serialize(e.to_string()))
    }

    /// Attach classifications from `catalog`. Every column must be labelled.
    pub fn to_record_set(&self, catalog: &ColumnCatalog) -> Result<RecordSet, DatasetError> {
        let mut records = RecordSet::new();
        for table in &self.tables {
            let classifications = table
                .columns
                .iter()
                .map(|column| catalog.classify(&table.name, column))
                .collect::<Result<Vec<_>, _>>()?;

            let mut out = Table::new(table.name.clone());
            for (index, values) in table.rows.iter().enumerate() {
                if values.len() != table.columns.len() {
                    return Err(DatasetError::RowWidth {
                        table: table.name.clone(),
                        row: index,
                        expected: table.columns.len(),
                        found: values.len(),
                    });
                }
                let cells = table
                    .columns
                    .iter()
                    .zip(&classifications)
                    .zip(values)
                    .map(|((column, classification), value)| Cell {
                        column: column.clone(),
                        classification: *classification,
                        value: value.clone(),
                    })
                    .collect();
                out.push_row(Row { cells });
            }
            records.push_table(out);
        }
        Ok(records)
    }

    /// This dataset's layout filled with the values of `records`, which
    /// must have been built from it by [`Dataset::to_record_set`].
    pub fn with_values_from(&self, records: &RecordSet) -> Self {
        let tables = self
            .tables
            .iter()
            .zip(&records.tables)
            .map(|(layout, table)| DatasetTable {
                name: layout.name.clone(),
                columns: layout.columns.clone(),
                rows: table
                    .rows
                    .iter()
                    .map(|r| r.cells.iter().map(|c| c.value.clone()).collect())
                    .collect(),
            })
            .collect();
        Self { tables }
    }

    /// Row count across tables.
    pub fn row_count(&self) -> usize {
        self.tables.iter().map(|t| t.rows.len()).sum()
    }
}
