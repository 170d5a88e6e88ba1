//! # mask Subcommand
//!
//! Reads a columnar dataset, labels its columns through the catalog, masks
//! it in one run and writes the masked dataset.
//!
//! Every output file is staged in a temporary file next to its target and
//! renamed into place only after the run succeeds and all of them are
//! written, the masked dataset last. Staged files are created readable by
//! the owner only. A failed run leaves no output and no mapping table
//! behind.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tempfile::NamedTempFile;

use shield_mask::{EngineConfig, MappingTable, NoiseSource, RunReport};

use crate::catalog::ColumnCatalog;
use crate::dataset::Dataset;

/// Arguments for `shield mask`.
#[derive(Args, Debug)]
pub struct MaskArgs {
    /// Dataset to mask.
    #[arg(long, short, value_name = "DATASET_JSON")]
    pub input: PathBuf,

    /// Where to write the masked dataset.
    #[arg(long, short, value_name = "MASKED_JSON")]
    pub output: PathBuf,

    /// Column catalog extending or replacing the standard one.
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Export the identity cache after the run. The file holds raw values.
    #[arg(long)]
    pub mapping_out: Option<PathBuf>,

    /// Restore the identity cache from an earlier run's mapping table.
    #[arg(long)]
    pub replay: Option<PathBuf>,

    /// Use seeded noise with this seed, overriding the configuration.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Worker threads, overriding the configuration.
    #[arg(long)]
    pub workers: Option<usize>,

    /// Write the run report as JSON.
    #[arg(long)]
    pub report: Option<PathBuf>,
}

/// Execute the mask subcommand.
pub fn run_mask(args: &MaskArgs, config: &EngineConfig) -> Result<u8> {
    let report = mask_dataset(args, config)?;
    println!(
        "masked {} rows ({} cells, {} NULL) across {} tables in {} ms; run {}",
        report.total_rows(),
        report.total_cells(),
        report.total_nulls(),
        report.tables.len(),
        report.elapsed_ms,
        report.run_id
    );
    Ok(0)
}

fn mask_dataset(args: &MaskArgs, config: &EngineConfig) -> Result<RunReport> {
    let mut config = config.clone();
    if let Some(seed) = args.seed {
        config.noise = NoiseSource::Seeded { seed };
    }
    if let Some(workers) = args.workers {
        config.workers = workers.max(1);
    }

    let catalog = match &args.catalog {
        Some(path) => ColumnCatalog::load(path)?,
        None => ColumnCatalog::standard(),
    };
    let dataset = Dataset::load(&args.input)?;
    let records = dataset.to_record_set(&catalog)?;
    tracing::debug!(
        input = %args.input.display(),
        tables = dataset.tables.len(),
        rows = dataset.row_count(),
        "dataset loaded"
    );

    let key = config.key.load().context("loading key")?;
    let mut ctx = config.build_context(Arc::new(key))?;
    if let Some(path) = &args.replay {
        let table = MappingTable::load(path)?;
        ctx = ctx
            .with_mapping_table(&table)
            .with_context(|| format!("restoring mapping table {}", path.display()))?;
    }

    let outcome = config
        .orchestrator()
        .mask_record_set(&records, &ctx)
        .context("masking run failed; no output written")?;

    let mut staged = StagedOutputs::default();
    if let Some(path) = &args.report {
        let json = serde_json::to_string_pretty(&outcome.report)?;
        staged.stage(path, json.as_bytes())?;
    }
    if let Some(path) = &args.mapping_out {
        let json = ctx.mapping_table().to_json().context("serializing mapping table")?;
        staged.stage(path, json.as_bytes())?;
    }
    let masked = dataset.with_values_from(&outcome.records);
    staged.stage(&args.output, masked.to_json_string()?.as_bytes())?;
    staged.commit()?;

    if let Some(path) = &args.mapping_out {
        tracing::warn!(
            path = %path.display(),
            entries = ctx.cache().len(),
            "mapping table written; it contains raw values and must be protected like the source data"
        );
    }
    Ok(outcome.report)
}

/// Output files written to temporary siblings, renamed into place in
/// staging order by [`StagedOutputs::commit`]. Dropping uncommitted files
/// deletes them.
#[derive(Default)]
struct StagedOutputs {
    files: Vec<(NamedTempFile, PathBuf)>,
}

impl StagedOutputs {
    fn stage(&mut self, path: &Path, contents: &[u8]) -> Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = NamedTempFile::new_in(dir)
            .with_context(|| format!("staging {}", path.display()))?;
        file.write_all(contents)
            .and_then(|()| file.flush())
            .with_context(|| format!("writing {}", path.display()))?;
        self.files.push((file, path.to_path_buf()));
        Ok(())
    }

    fn commit(self) -> Result<()> {
        for (file, path) in self.files {
            file.persist(&path)
                .map_err(|e| e.error)
                .with_context(|| format!("renaming into {}", path.display()))?;
        }
        Ok(())
    }
}
