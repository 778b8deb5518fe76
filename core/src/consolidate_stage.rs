//! Stage 3: multi-source consolidation.
//!
//! Joins the integrated dataset with two external collaborators: a
//! spreadsheet of customer countries and an HTML page carrying a
//! payment-method table. Join order is fixed — country first, then
//! payment method. A source missing the customer_id key fails fast;
//! a source missing value columns simply contributes nulls.

use crate::{
    config::{self, EtlConfig},
    error::EtlResult,
    io::{self, csv_file, html, xlsx},
    rng::StageRng,
    stage::{PipelineStage, StageReport},
};

pub struct ConsolidateStage;

impl PipelineStage for ConsolidateStage {
    fn name(&self) -> &'static str {
        "consolidate"
    }

    fn run(&self, config: &EtlConfig, _rng: &mut StageRng) -> EtlResult<StageReport> {
        let base_path = config.path(config::INTEGRATED_CSV);
        let country_path = config.path(config::COUNTRY_XLSX);
        let payment_path = config.path(config::PAYMENT_HTML);
        io::require_input(self.name(), &base_path)?;
        io::require_input(self.name(), &country_path)?;
        io::require_input(self.name(), &payment_path)?;

        let base = csv_file::read_table(&base_path, "integrated")?;
        let countries = xlsx::read_first_sheet(&country_path, "customer_country")?;
        let payments = html::read_first_table(&payment_path, "customer_payment_method")?;

        let consolidated = base
            .left_join(&countries, "customer_id")?
            .left_join(&payments, "customer_id")?;

        let out = config.path(config::CONSOLIDATED_CSV);
        csv_file::write_table(&out, &consolidated)?;
        Ok(StageReport::new(consolidated.len(), vec![out]))
    }
}
