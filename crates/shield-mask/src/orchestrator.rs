//! # Record-Set Orchestrator
//!
//! Masks every cell of a record set, optionally spread over a fixed number
//! of worker threads. All workers share one [`MaskingContext`], so a raw
//! value appearing in several tables resolves through the same identity
//! cache entry whichever worker reaches it first.
//!
//! ## Failure Semantics
//!
//! The run is all-or-nothing. Rows are numbered in table-then-row order and
//! the lowest failing position is tracked with an atomic minimum; workers
//! skip rows past it. The error returned is always the earliest failure in
//! that order, wrapped with its table, row and column, regardless of worker
//! count or scheduling. No partial record set is ever returned.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use shield_core::{Cell, FieldClassification, FieldLocation, MaskingError, RecordSet, Row, Table};

use crate::context::MaskingContext;
use crate::report::{RunReport, TableReport};

/// Masked record set plus its run report.
#[derive(Debug, Clone)]
pub struct MaskingOutcome {
    /// Same shape as the input, every non-NULL value masked.
    pub records: RecordSet,
    /// Counts and identifiers for the run.
    pub report: RunReport,
}

/// Drives a [`MaskingContext`] over whole record sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskingOrchestrator {
    workers: usize,
}

impl Default for MaskingOrchestrator {
    fn default() -> Self {
        Self { workers: 1 }
    }
}

type Counts = BTreeMap<FieldClassification, usize>;

enum ChunkResult {
    Done { rows: Vec<Row>, counts: Counts },
    Failed { position: usize, error: MaskingError },
    /// Stopped early because an earlier row already failed.
    Abandoned,
}

impl MaskingOrchestrator {
    /// A single-threaded orchestrator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the worker count. Zero is treated as one.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Configured worker count.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Mask every table of `input` under `ctx`.
    ///
    /// # Errors
    ///
    /// The earliest failing cell's error, wrapped in
    /// [`MaskingError::AtField`].
    pub fn mask_record_set(
        &self,
        input: &RecordSet,
        ctx: &MaskingContext,
    ) -> Result<MaskingOutcome, MaskingError> {
        let started = Instant::now();
        let positions: Vec<(usize, usize)> = input
            .tables
            .iter()
            .enumerate()
            .flat_map(|(t, table)| (0..table.rows.len()).map(move |r| (t, r)))
            .collect();

        tracing::info!(
            run_id = %ctx.run_id(),
            tables = input.tables.len(),
            rows = positions.len(),
            workers = self.workers,
            noise = ctx.noise().mode_name(),
            "masking run started"
        );

        let chunk_len = positions.len().div_ceil(self.workers).max(1);
        let first_failure = AtomicUsize::new(usize::MAX);

        let results: Vec<ChunkResult> = if positions.len() <= chunk_len {
            vec![mask_chunk(input, ctx, &positions, 0, &first_failure)]
        } else {
            std::thread::scope(|scope| {
                let handles: Vec<_> = positions
                    .chunks(chunk_len)
                    .enumerate()
                    .map(|(i, chunk)| {
                        let first_failure = &first_failure;
                        scope.spawn(move || {
                            mask_chunk(input, ctx, chunk, i * chunk_len, first_failure)
                        })
                    })
                    .collect();
                handles
                    .into_iter()
                    .map(|h| h.join().unwrap_or_else(|p| std::panic::resume_unwind(p)))
                    .collect()
            })
        };

        let mut masked_rows = Vec::with_capacity(positions.len());
        let mut masked_by_classification = Counts::new();
        let mut failure: Option<(usize, MaskingError)> = None;
        for result in results {
            match result {
                ChunkResult::Done { rows, counts } => {
                    masked_rows.extend(rows);
                    for (c, n) in counts {
                        *masked_by_classification.entry(c).or_default() += n;
                    }
                }
                ChunkResult::Failed { position, error } => {
                    if failure.as_ref().map_or(true, |(p, _)| position < *p) {
                        failure = Some((position, error));
                    }
                }
                ChunkResult::Abandoned => {}
            }
        }
        if let Some((_, err)) = failure {
            tracing::error!(
                run_id = %ctx.run_id(),
                location = %err.location().map(ToString::to_string).unwrap_or_default(),
                "masking run aborted"
            );
            return Err(err);
        }

        let mut rows = masked_rows.into_iter();
        let mut tables = Vec::with_capacity(input.tables.len());
        let mut table_reports = Vec::with_capacity(input.tables.len());
        for table in &input.tables {
            tables.push(Table {
                name: table.name.clone(),
                rows: rows.by_ref().take(table.rows.len()).collect(),
            });
            table_reports.push(table_report(table));
        }

        let report = RunReport {
            run_id: ctx.run_id(),
            key_fingerprint: ctx.key_fingerprint().to_string(),
            noise_mode: ctx.noise().mode_name().to_string(),
            workers: self.workers,
            tables: table_reports,
            masked_by_classification,
            identity_cache_entries: ctx.cache().len(),
            collisions: ctx.cache().collisions(),
            elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        };
        tracing::info!(
            run_id = %report.run_id,
            rows = report.total_rows(),
            cells = report.total_cells(),
            nulls = report.total_nulls(),
            identity_cache_entries = report.identity_cache_entries,
            collisions = report.collisions,
            elapsed_ms = report.elapsed_ms,
            "masking run finished"
        );

        Ok(MaskingOutcome {
            records: RecordSet { tables },
            report,
        })
    }
}

/// Mask a contiguous run of rows. `offset` is the global position of the
/// chunk's first row.
fn mask_chunk(
    input: &RecordSet,
    ctx: &MaskingContext,
    chunk: &[(usize, usize)],
    offset: usize,
    first_failure: &AtomicUsize,
) -> ChunkResult {
    let mut rows = Vec::with_capacity(chunk.len());
    let mut counts = Counts::new();
    for (i, &(t, r)) in chunk.iter().enumerate() {
        let position = offset + i;
        if position > first_failure.load(Ordering::Acquire) {
            return ChunkResult::Abandoned;
        }
        let table = &input.tables[t];
        match mask_row(&table.name, r, &table.rows[r], ctx, &mut counts) {
            Ok(row) => rows.push(row),
            Err(error) => {
                first_failure.fetch_min(position, Ordering::AcqRel);
                return ChunkResult::Failed { position, error };
            }
        }
    }
    ChunkResult::Done { rows, counts }
}

fn mask_row(
    table: &str,
    index: usize,
    row: &Row,
    ctx: &MaskingContext,
    counts: &mut Counts,
) -> Result<Row, MaskingError> {
    let mut cells = Vec::with_capacity(row.cells.len());
    for cell in &row.cells {
        let value = match cell.value.as_deref() {
            None => None,
            Some(raw) => {
                let location = FieldLocation::new(table, index, cell.column.as_str());
                let masked = ctx
                    .mask_field_at(cell.classification, raw, &location)
                    .map_err(|e| e.at(location))?;
                *counts.entry(cell.classification).or_default() += 1;
                Some(masked)
            }
        };
        cells.push(Cell {
            column: cell.column.clone(),
            classification: cell.classification,
            value,
        });
    }
    Ok(Row { cells })
}

fn table_report(table: &Table) -> TableReport {
    let cells = table.rows.iter().map(|r| r.cells.len()).sum();
    let nulls = table
        .rows
        .iter()
        .flat_map(|r| r.cells.iter())
        .filter(|c| c.value.is_none())
        .count();
    TableReport {
        name: table.name.clone(),
        rows: table.rows.len(),
        cells,
        nulls,
    }
}
