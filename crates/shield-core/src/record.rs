//! # Record Sets — The Engine's Input and Output Shape
//!
//! A record set is an ordered sequence of tables, each an ordered sequence of
//! rows, each an ordered sequence of classified cells. The engine returns the
//! same shape with every value replaced by its masked counterpart.
//!
//! Order is explicit (vectors, not maps) so the masked snapshot lines up with
//! the source snapshot row for row and column for column.

use serde::{Deserialize, Serialize};

use crate::classification::FieldClassification;

/// An ordered collection of tables masked as one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSet {
    /// Tables in processing order.
    pub tables: Vec<Table>,
}

/// A named, ordered sequence of rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Table name, e.g. `loan_bill_header`.
    pub name: String,
    /// Rows in source order.
    pub rows: Vec<Row>,
}

/// One record: an ordered sequence of cells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    /// Cells in column order.
    pub cells: Vec<Cell>,
}

/// A single classified field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// Column name.
    pub column: String,
    /// Semantic classification assigned by the caller.
    pub classification: FieldClassification,
    /// Field value; `None` is a SQL NULL and is preserved as-is.
    pub value: Option<String>,
}

impl RecordSet {
    /// An empty record set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a table.
    pub fn push_table(&mut self, table: Table) {
        self.tables.push(table);
    }

    /// Builder-style [`RecordSet::push_table`].
    pub fn with_table(mut self, table: Table) -> Self {
        self.tables.push(table);
        self
    }

    /// Look up a table by name.
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Total rows across all tables.
    pub fn row_count(&self) -> usize {
        self.tables.iter().map(|t| t.rows.len()).sum()
    }

    /// Total cells across all tables.
    pub fn cell_count(&self) -> usize {
        self.tables
            .iter()
            .flat_map(|t| t.rows.iter())
            .map(|r| r.cells.len())
            .sum()
    }
}

impl Table {
    /// An empty table.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    /// Append a row.
    pub fn push_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Builder-style [`Table::push_row`].
    pub fn with_row(mut self, row: Row) -> Self {
        self.rows.push(row);
        self
    }

    /// Non-null values of one column, in row order.
    pub fn column_values<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.rows.iter().filter_map(move |r| r.value(column))
    }
}

impl Row {
    /// An empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: append a non-null cell.
    pub fn with(
        mut self,
        column: impl Into<String>,
        classification: FieldClassification,
        value: impl Into<String>,
    ) -> Self {
        self.cells.push(Cell {
            column: column.into(),
            classification,
            value: Some(value.into()),
        });
        self
    }

    /// Builder: append a NULL cell.
    pub fn with_null(mut self, column: impl Into<String>, classification: FieldClassification) -> Self {
        self.cells.push(Cell {
            column: column.into(),
            classification,
            value: None,
        });
        self
    }

    /// Look up a cell by column name.
    pub fn get(&self, column: &str) -> Option<&Cell> {
        self.cells.iter().find(|c| c.column == column)
    }

    /// The non-null value of a column.
    pub fn value(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(|c| c.value.as_deref())
    }
}
