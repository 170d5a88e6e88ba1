//! Run report: what a masking run touched, without any field values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shield_core::FieldClassification;

/// Per-table counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableReport {
    /// Table name.
    pub name: String,
    /// Rows masked.
    pub rows: usize,
    /// Cells visited, NULL included.
    pub cells: usize,
    /// NULL cells preserved.
    pub nulls: usize,
}

/// Summary of one masking run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Run identifier, also present in every log line of the run.
    pub run_id: Uuid,
    /// Fingerprint of the key in use.
    pub key_fingerprint: String,
    /// Noise mode name.
    pub noise_mode: String,
    /// Worker threads used.
    pub workers: usize,
    /// Tables in processing order.
    pub tables: Vec<TableReport>,
    /// Non-NULL cells masked per classification.
    pub masked_by_classification: BTreeMap<FieldClassification, usize>,
    /// Mappings held by the identity cache at the end of the run.
    pub identity_cache_entries: usize,
    /// Collisions tolerated under the `warn` policy.
    pub collisions: usize,
    /// Wall-clock duration.
    pub elapsed_ms: u64,
}

impl RunReport {
    /// Rows across all tables.
    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|t| t.rows).sum()
    }

    /// Cells across all tables.
    pub fn total_cells(&self) -> usize {
        self.tables.iter().map(|t| t.cells).sum()
    }

    /// NULL cells across all tables.
    pub fn total_nulls(&self) -> usize {
        self.tables.iter().map(|t| t.nulls).sum()
    }
}
