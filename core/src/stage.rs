//! Stage trait and contract.
//!
//! RULE: Every stage implements PipelineStage.
//! The engine calls run() on each registered stage in registration
//! order, exactly once per run.
//! Execution order is fixed and documented in engine.rs.

use crate::{
    config::{EtlConfig, MissingColumnPolicy},
    error::{EtlError, EtlResult},
    rng::StageRng,
    table::Table,
};
use std::path::PathBuf;

/// The contract every stage must fulfill.
pub trait PipelineStage {
    /// Unique stable name for this stage.
    fn name(&self) -> &'static str;

    /// Execute the stage: read the declared input file(s) from the
    /// working directory as a fresh snapshot, transform in memory,
    /// write the output file(s).
    ///
    /// - `config`: the run configuration (workdir, counts, policies)
    /// - `rng`:    this stage's deterministic RNG stream
    fn run(&self, config: &EtlConfig, rng: &mut StageRng) -> EtlResult<StageReport>;
}

/// What a stage produced, for the engine log and the runner summary.
#[derive(Debug, Clone)]
pub struct StageReport {
    pub rows_out: usize,
    pub artifacts: Vec<PathBuf>,
}

impl StageReport {
    pub fn new(rows_out: usize, artifacts: Vec<PathBuf>) -> Self {
        Self { rows_out, artifacts }
    }
}

/// Look up a configured column under the stage's missing-column
/// policy: Skip yields None (logged), Fail is a SchemaMismatch.
pub fn resolve_column(
    table: &Table,
    column: &str,
    policy: MissingColumnPolicy,
) -> EtlResult<Option<usize>> {
    match table.column_index(column) {
        Some(i) => Ok(Some(i)),
        None => match policy {
            MissingColumnPolicy::Skip => {
                log::debug!("column '{column}' absent from {}, skipped", table.name());
                Ok(None)
            }
            MissingColumnPolicy::Fail => Err(EtlError::SchemaMismatch {
                table: table.name().to_string(),
                column: column.to_string(),
            }),
        },
    }
}
