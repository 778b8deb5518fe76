//! Stage 1: synthetic data generation.
//!
//! Builds the customer and transaction tables from pseudo-random
//! distributions and persists both as raw numeric arrays. Draws are
//! column-at-a-time in a fixed order — reordering them changes every
//! value downstream of a given seed.

use crate::{
    config::{self, EtlConfig},
    error::EtlResult,
    io::npy,
    rng::StageRng,
    schema::{DataType, Field, Schema},
    stage::{PipelineStage, StageReport},
    table::{Table, Value},
    types::CustomerId,
};

pub const CUSTOMER_ID_BASE: i64 = 10_000;

const AGE_MIN: i64 = 18;
const AGE_MAX_EXCLUSIVE: i64 = 71;
const TENURE_MAX_EXCLUSIVE: i64 = 61;
const QUANTITY_MIN: i64 = 1;
const QUANTITY_MAX_EXCLUSIVE: i64 = 13;
const UNIT_PRICE_GAMMA_SHAPE: f64 = 2.0;
const UNIT_PRICE_GAMMA_SCALE: f64 = 10_000.0;
const UNIT_PRICE_MIN: i64 = 500;
const UNIT_PRICE_MAX: i64 = 150_000;

pub struct GenerateStage;

impl GenerateStage {
    /// Build both tables in memory. Exposed separately from run() so
    /// tests can inspect generated data without touching the disk.
    pub fn generate(config: &EtlConfig, rng: &mut StageRng) -> (Table, Table) {
        let n = config.customer_count;
        let customer_ids: Vec<CustomerId> = (0..n as i64).map(|i| CUSTOMER_ID_BASE + i).collect();
        let ages: Vec<i64> = (0..n)
            .map(|_| rng.int_in_range(AGE_MIN, AGE_MAX_EXCLUSIVE))
            .collect();
        let tenures: Vec<i64> = (0..n)
            .map(|_| rng.int_in_range(0, TENURE_MAX_EXCLUSIVE))
            .collect();

        let mut customers = Table::new(
            "customers",
            Schema::new(vec![
                Field::new("customer_id", DataType::Int),
                Field::new("age", DataType::Int),
                Field::new("tenure_months", DataType::Int),
            ]),
        );
        for i in 0..n {
            customers.push_row(vec![
                Value::Int(customer_ids[i]),
                Value::Int(ages[i]),
                Value::Int(tenures[i]),
            ]);
        }

        let m = config.transaction_count;
        // Customers are sampled with replacement — repeat buyers are
        // expected, and some customers never transact.
        let picks: Vec<i64> = (0..m)
            .map(|_| customer_ids[rng.next_u64_below(n as u64) as usize])
            .collect();
        let quantities: Vec<i64> = (0..m)
            .map(|_| rng.int_in_range(QUANTITY_MIN, QUANTITY_MAX_EXCLUSIVE))
            .collect();
        let unit_prices: Vec<i64> = (0..m)
            .map(|_| {
                let raw = rng.gamma(UNIT_PRICE_GAMMA_SHAPE, UNIT_PRICE_GAMMA_SCALE);
                raw.clamp(UNIT_PRICE_MIN as f64, UNIT_PRICE_MAX as f64) as i64
            })
            .collect();

        let mut transactions = Table::new(
            "transactions",
            Schema::new(vec![
                Field::new("transaction_id", DataType::Int),
                Field::new("customer_id", DataType::Int),
                Field::new("quantity", DataType::Int),
                Field::new("unit_price", DataType::Int),
                Field::new("total", DataType::Int),
            ]),
        );
        for i in 0..m {
            // total is derived from the clamped, truncated unit price.
            let total = quantities[i] * unit_prices[i];
            transactions.push_row(vec![
                Value::Int(i as i64 + 1),
                Value::Int(picks[i]),
                Value::Int(quantities[i]),
                Value::Int(unit_prices[i]),
                Value::Int(total),
            ]);
        }

        (customers, transactions)
    }
}

impl PipelineStage for GenerateStage {
    fn name(&self) -> &'static str {
        "generate"
    }

    fn run(&self, config: &EtlConfig, rng: &mut StageRng) -> EtlResult<StageReport> {
        let (customers, transactions) = Self::generate(config, rng);

        let customers_path = config.path(config::CUSTOMERS_NPY);
        let transactions_path = config.path(config::TRANSACTIONS_NPY);
        npy::write_i64_matrix(&customers_path, &to_matrix(&customers))?;
        npy::write_i64_matrix(&transactions_path, &to_matrix(&transactions))?;

        log::debug!(
            "generate: {} customers, {} transactions (seed stream '{}')",
            customers.len(),
            transactions.len(),
            rng.name
        );
        Ok(StageReport::new(
            transactions.len(),
            vec![customers_path, transactions_path],
        ))
    }
}

fn to_matrix(table: &Table) -> Vec<Vec<i64>> {
    table
        .rows()
        .iter()
        .map(|row| {
            row.iter()
                .map(|v| v.as_i64().expect("generated tables are integer-only"))
                .collect()
        })
        .collect()
}
