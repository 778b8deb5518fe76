//! The pipeline engine — runs the six stages start to finish.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. generate     — synthesize customers + transactions (.npy)
//!   2. integrate    — transactions ⋈ customers → CSV
//!   3. consolidate  — join country (xlsx) and payment method (html)
//!   4. clean        — sentinel/median null fill, IQR capping
//!   5. wrangle      — dedup, type coercion, derived columns
//!   6. report       — grouped summary, pivot/melt, exports
//!
//! RULES:
//!   - Stages execute in registration order, exactly once per run.
//!   - Each stage reads only files written by earlier stages (or the
//!     two external collaborators); no in-memory state crosses a
//!     stage boundary.
//!   - All randomness flows through the RngBank.
//!   - Each stage's output file is a checkpoint: a single stage can be
//!     re-run on its own as long as its inputs exist on disk.

use crate::{
    clean_stage::CleanStage,
    config::EtlConfig,
    consolidate_stage::ConsolidateStage,
    error::{EtlError, EtlResult},
    generate_stage::GenerateStage,
    integrate_stage::IntegrateStage,
    report_stage::ReportStage,
    rng::{RngBank, StageSlot},
    stage::{PipelineStage, StageReport},
    wrangle_stage::WrangleStage,
};

pub struct EtlEngine {
    config:   EtlConfig,
    rng_bank: RngBank,
    stages:   Vec<(StageSlot, Box<dyn PipelineStage>)>,
}

impl EtlEngine {
    pub fn new(config: EtlConfig) -> Self {
        let rng_bank = RngBank::new(config.seed);
        Self {
            config,
            rng_bank,
            stages: Vec::new(),
        }
    }

    /// Build a fully wired engine with all stages registered.
    /// Call this instead of new() + manual register() calls.
    pub fn build(config: EtlConfig) -> Self {
        let mut engine = EtlEngine::new(config);

        // EXECUTION ORDER — fixed, documented, never reordered.
        engine.register(StageSlot::Generate, Box::new(GenerateStage));
        engine.register(StageSlot::Integrate, Box::new(IntegrateStage));
        engine.register(StageSlot::Consolidate, Box::new(ConsolidateStage));
        engine.register(StageSlot::Clean, Box::new(CleanStage));
        engine.register(StageSlot::Wrangle, Box::new(WrangleStage));
        engine.register(StageSlot::Report, Box::new(ReportStage));
        engine
    }

    /// Register a stage. Call in the documented execution order.
    pub fn register(&mut self, slot: StageSlot, stage: Box<dyn PipelineStage>) {
        self.stages.push((slot, stage));
    }

    pub fn config(&self) -> &EtlConfig {
        &self.config
    }

    /// Run every registered stage in order. The first failure aborts
    /// the pipeline — there is no partial-failure recovery.
    pub fn run_all(&self) -> EtlResult<Vec<(&'static str, StageReport)>> {
        let mut reports = Vec::with_capacity(self.stages.len());
        for (slot, stage) in &self.stages {
            let report = self.run_registered(*slot, stage.as_ref())?;
            reports.push((stage.name(), report));
        }
        Ok(reports)
    }

    /// Run a single stage by slot. Operator resume path: valid whenever
    /// the stage's input files exist on disk.
    pub fn run_stage(&self, slot: StageSlot) -> EtlResult<StageReport> {
        let stage = self
            .stages
            .iter()
            .find(|(s, _)| *s == slot)
            .map(|(_, stage)| stage.as_ref())
            .ok_or_else(|| EtlError::StageNotFound {
                name: slot.name().to_string(),
            })?;
        self.run_registered(slot, stage)
    }

    fn run_registered(
        &self,
        slot: StageSlot,
        stage: &dyn PipelineStage,
    ) -> EtlResult<StageReport> {
        let mut rng = self.rng_bank.for_stage(slot);
        let report = stage.run(&self.config, &mut rng)?;
        log::info!(
            "stage={} rows_out={} artifacts={}",
            stage.name(),
            report.rows_out,
            report
                .artifacts
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(",")
        );
        Ok(report)
    }
}
