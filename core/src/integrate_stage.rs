//! Stage 2: join transactions to customers.
//!
//! Reads the two raw arrays back as named tables and left-joins
//! transactions to customers on customer_id. Every transaction row
//! appears exactly once; customer attributes null-fill when missing
//! (none expected at this stage).

use crate::{
    config::{self, EtlConfig},
    error::{EtlError, EtlResult},
    io::{self, csv_file, npy},
    rng::StageRng,
    schema::{DataType, Field, Schema},
    stage::{PipelineStage, StageReport},
    table::{Table, Value},
};
use std::path::Path;

const CUSTOMER_COLUMNS: [&str; 3] = ["customer_id", "age", "tenure_months"];
const TRANSACTION_COLUMNS: [&str; 5] = [
    "transaction_id",
    "customer_id",
    "quantity",
    "unit_price",
    "total",
];

pub struct IntegrateStage;

impl PipelineStage for IntegrateStage {
    fn name(&self) -> &'static str {
        "integrate"
    }

    fn run(&self, config: &EtlConfig, _rng: &mut StageRng) -> EtlResult<StageReport> {
        let customers_path = config.path(config::CUSTOMERS_NPY);
        let transactions_path = config.path(config::TRANSACTIONS_NPY);
        io::require_input(self.name(), &customers_path)?;
        io::require_input(self.name(), &transactions_path)?;

        let customers = table_from_npy(&customers_path, "customers", &CUSTOMER_COLUMNS)?;
        let transactions =
            table_from_npy(&transactions_path, "transactions", &TRANSACTION_COLUMNS)?;

        let integrated = transactions.left_join(&customers, "customer_id")?;

        let out = config.path(config::INTEGRATED_CSV);
        csv_file::write_table(&out, &integrated)?;
        Ok(StageReport::new(integrated.len(), vec![out]))
    }
}

/// Name the columns of a raw matrix. Width is validated against the
/// declared column list — a mismatched file is a format error.
fn table_from_npy(path: &Path, name: &str, columns: &[&str]) -> EtlResult<Table> {
    let matrix = npy::read_i64_matrix(path)?;
    if let Some(row) = matrix.first() {
        if row.len() != columns.len() {
            return Err(EtlError::Npy {
                path: path.to_path_buf(),
                reason: format!("expected {} columns, found {}", columns.len(), row.len()),
            });
        }
    }
    let fields = columns
        .iter()
        .map(|c| Field::new(*c, DataType::Int))
        .collect();
    let mut table = Table::new(name, Schema::new(fields));
    for row in matrix {
        table.push_row(row.into_iter().map(Value::Int).collect());
    }
    Ok(table)
}
